//! Pipeline orchestration. Stages run strictly in sequence; concurrency
//! lives inside the per-item stages, never across them. Cancellation is
//! observed between stages only, so every stage's output is all-or-nothing.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use leadscout_common::{
    DiscoveryRequest, DiscoveryResult, FunnelCounts, PipelineConfig, PipelineFailure,
    RejectionRecord, RunOutcome, StageName,
};

use crate::tracer::{LogTraceSink, TraceSink};
use crate::traits::{ContextRetrieval, TextGeneration, WebSearch};
use crate::{context, criteria, dedup, enrich, query_gen, score, search, validate};

pub struct DiscoveryPipeline {
    llm: Arc<dyn TextGeneration>,
    search: Arc<dyn WebSearch>,
    context: Arc<dyn ContextRetrieval>,
    tracer: Arc<dyn TraceSink>,
    config: PipelineConfig,
}

impl DiscoveryPipeline {
    pub fn new(
        llm: Arc<dyn TextGeneration>,
        search: Arc<dyn WebSearch>,
        context: Arc<dyn ContextRetrieval>,
    ) -> Self {
        Self {
            llm,
            search,
            context,
            tracer: Arc::new(LogTraceSink),
            config: PipelineConfig::default(),
        }
    }

    pub fn with_tracer(mut self, tracer: Arc<dyn TraceSink>) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub async fn run(&self, request: &DiscoveryRequest) -> Result<DiscoveryResult, PipelineFailure> {
        self.run_with_cancellation(request, CancellationToken::new())
            .await
    }

    /// Run the full funnel. Fatal errors surface as [`PipelineFailure`]
    /// with whatever counts were gathered; cancellation yields an `Ok`
    /// partial result marked [`RunOutcome::Cancelled`].
    pub async fn run_with_cancellation(
        &self,
        request: &DiscoveryRequest,
        cancel: CancellationToken,
    ) -> Result<DiscoveryResult, PipelineFailure> {
        let mut funnel = FunnelCounts::default();

        if let Err(e) = request.validate() {
            return Err(PipelineFailure::new(e, funnel));
        }

        info!(
            category = %request.target_category,
            criteria = request.criteria_text(),
            requested = request.requested_count,
            "Starting discovery run"
        );

        let profile = context::build_vendor_profile(
            self.context.as_ref(),
            self.tracer.as_ref(),
            self.config.context_chunks,
        )
        .await;

        if cancel.is_cancelled() {
            return Ok(partial(funnel, vec![]));
        }

        // Query generation. Fatal on failure: nothing to search without it.
        let queries = match query_gen::generate_queries(
            self.llm.as_ref(),
            self.tracer.as_ref(),
            request,
            &profile,
        )
        .await
        {
            Ok(queries) => queries,
            Err(e) => return Err(PipelineFailure::new(e, funnel)),
        };
        funnel.record(StageName::QueryGeneration, 1, queries.len());

        if cancel.is_cancelled() {
            return Ok(partial(funnel, vec![]));
        }

        // Search.
        let hits = match search::search_all(
            self.search.as_ref(),
            self.tracer.as_ref(),
            &queries,
            request.max_results_per_query,
            self.config.max_concurrency,
        )
        .await
        {
            Ok(hits) => hits,
            Err(e) => return Err(PipelineFailure::new(e, funnel)),
        };
        funnel.record(StageName::Search, queries.len(), hits.len());

        if cancel.is_cancelled() {
            return Ok(partial(funnel, vec![]));
        }

        // Enrichment.
        let (candidates, _) = enrich::enrich_all(
            self.llm.as_ref(),
            self.tracer.as_ref(),
            &hits,
            request,
            &self.config,
        )
        .await;
        funnel.record(StageName::Enrichment, hits.len(), candidates.len());

        if cancel.is_cancelled() {
            return Ok(partial(funnel, vec![]));
        }

        // Criteria filter before dedup: each source keeps its own verdict.
        let criteria_input = candidates.len();
        let (matching, criteria_rejected) = criteria::partition(candidates);
        funnel.record(StageName::CriteriaFilter, criteria_input, matching.len());

        if cancel.is_cancelled() {
            return Ok(partial(funnel, criteria_rejected));
        }

        // Deduplication.
        let dedup_input = matching.len();
        let (unique, _) = dedup::dedup(matching, self.config.name_similarity_threshold);
        funnel.record(StageName::Deduplication, dedup_input, unique.len());

        if cancel.is_cancelled() {
            return Ok(partial(funnel, criteria_rejected));
        }

        // Scoring.
        let score_input = unique.len();
        let (scored, _) = score::score_all(
            self.llm.as_ref(),
            self.tracer.as_ref(),
            unique,
            &profile,
            &self.config,
        )
        .await;
        funnel.record(StageName::Scoring, score_input, scored.len());

        if cancel.is_cancelled() {
            return Ok(partial(funnel, criteria_rejected));
        }

        // Validation and ranking.
        let validation_input = scored.len();
        let (accepted, validation_rejected) =
            validate::validate_and_rank(scored, request.min_score, request.requested_count);
        funnel.record(StageName::Validation, validation_input, accepted.len());

        info!("{funnel}");
        Ok(DiscoveryResult {
            accepted,
            criteria_rejected,
            validation_rejected,
            funnel,
            outcome: RunOutcome::Completed,
        })
    }
}

/// Result shell for a run cut short between stages.
fn partial(funnel: FunnelCounts, criteria_rejected: Vec<RejectionRecord>) -> DiscoveryResult {
    info!("Run cancelled; returning partial result");
    DiscoveryResult {
        accepted: vec![],
        criteria_rejected,
        validation_rejected: vec![],
        funnel,
        outcome: RunOutcome::Cancelled,
    }
}
