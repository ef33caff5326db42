//! Scoring stage — one structured LLM call per candidate produces a 0-100
//! fit score, a size estimate, and a short rationale. Scores are written
//! exactly once; a candidate arriving with a score keeps it.

use futures::stream::{self, StreamExt};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, warn};

use leadscout_common::{CandidateCompany, DiscoveryError, PipelineConfig, SizeClass};

use crate::prompts;
use crate::tracer::TraceSink;
use crate::traits::{extract_with_retry, TextGeneration};

/// Response schema for fit scoring.
#[derive(Debug, Deserialize, JsonSchema)]
struct ScoringResponse {
    /// Fit score, 0-100.
    fit_score: i64,
    /// "Small", "Medium", or "Large". Anything else is coerced to Medium.
    estimated_size: Option<String>,
    /// 2-3 sentence justification.
    rationale: String,
}

#[derive(Debug, Default)]
pub struct ScoreStats {
    pub scored: usize,
    pub already_scored: usize,
    pub failures: usize,
}

/// Score every unscored candidate concurrently, preserving input order.
/// A candidate whose scoring call fails after the retry is dropped and
/// counted; ranking happens later, in validation.
pub async fn score_all(
    llm: &dyn TextGeneration,
    tracer: &dyn TraceSink,
    candidates: Vec<CandidateCompany>,
    vendor_profile: &str,
    config: &PipelineConfig,
) -> (Vec<CandidateCompany>, ScoreStats) {
    let mut results: Vec<(usize, Result<(CandidateCompany, bool), DiscoveryError>)> =
        stream::iter(candidates.into_iter().enumerate().map(
            |(idx, candidate)| async move {
                let result = score_candidate(llm, tracer, candidate, vendor_profile).await;
                (idx, result)
            },
        ))
        .buffer_unordered(config.max_concurrency)
        .collect()
        .await;

    results.sort_by_key(|(idx, _)| *idx);

    let mut stats = ScoreStats::default();
    let mut scored = Vec::new();
    for (_, result) in results {
        match result {
            Ok((candidate, scored_now)) => {
                if scored_now {
                    stats.scored += 1;
                } else {
                    stats.already_scored += 1;
                }
                scored.push(candidate);
            }
            Err(e) => {
                stats.failures += 1;
                warn!(error = %e, "Scoring failed for candidate, dropping");
            }
        }
    }

    info!(
        scored = stats.scored,
        already_scored = stats.already_scored,
        failures = stats.failures,
        "Scoring complete"
    );
    (scored, stats)
}

async fn score_candidate(
    llm: &dyn TextGeneration,
    tracer: &dyn TraceSink,
    mut candidate: CandidateCompany,
    vendor_profile: &str,
) -> Result<(CandidateCompany, bool), DiscoveryError> {
    if candidate.fit_score.is_some() {
        // Already scored; never recompute.
        return Ok((candidate, false));
    }

    let user = prompts::scoring_user(vendor_profile, &candidate);
    let response: ScoringResponse =
        extract_with_retry(llm, tracer, "scoring", prompts::SCORING_SYSTEM, &user).await?;

    candidate.fit_score = Some(response.fit_score.clamp(0, 100) as u8);
    candidate.size_class = response
        .estimated_size
        .as_deref()
        .and_then(SizeClass::parse_loose)
        .or(Some(SizeClass::Medium));
    candidate.rationale = Some(response.rationale);
    Ok((candidate, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTextGeneration;
    use crate::tracer::CollectingTraceSink;
    use leadscout_common::{Provenance, TargetCategory};
    use serde_json::json;

    fn candidate(name: &str) -> CandidateCompany {
        CandidateCompany {
            company_name: name.to_string(),
            website_url: "https://example.com".to_string(),
            locations: vec!["Texas".to_string()],
            size_indicators: vec![],
            size_class: None,
            description: Some("Dealer group".to_string()),
            criteria_match: true,
            match_reason: String::new(),
            fit_score: None,
            rationale: None,
            category: TargetCategory::Customer,
            provenance: Provenance {
                source_url: "https://src.com".to_string(),
                source_title: "t".to_string(),
                query: "q".to_string(),
            },
        }
    }

    fn scoring_json(score: i64, size: &str) -> serde_json::Value {
        json!({
            "fit_score": score,
            "estimated_size": size,
            "rationale": "Multi-location dealer group in the target region.",
        })
    }

    #[tokio::test]
    async fn scores_and_sizes_candidates() {
        let llm = MockTextGeneration::new();
        llm.push(scoring_json(85, "Large"));
        let tracer = CollectingTraceSink::new();
        let config = PipelineConfig::default();

        let (scored, stats) =
            score_all(&llm, &tracer, vec![candidate("Lithia")], "profile", &config).await;

        assert_eq!(stats.scored, 1);
        assert_eq!(scored[0].fit_score, Some(85));
        assert_eq!(scored[0].size_class, Some(SizeClass::Large));
        assert!(scored[0].rationale.is_some());
        assert_eq!(tracer.count_for("scoring"), 1);
    }

    #[tokio::test]
    async fn out_of_range_scores_clamp() {
        let llm = MockTextGeneration::new();
        llm.push(scoring_json(140, "Medium"));
        llm.push(scoring_json(-5, "Small"));
        let tracer = CollectingTraceSink::new();
        let config = PipelineConfig::default().with_max_concurrency(1);

        let (scored, _) = score_all(
            &llm,
            &tracer,
            vec![candidate("High"), candidate("Low")],
            "profile",
            &config,
        )
        .await;

        assert_eq!(scored[0].fit_score, Some(100));
        assert_eq!(scored[1].fit_score, Some(0));
    }

    #[tokio::test]
    async fn unrecognised_size_defaults_to_medium() {
        let llm = MockTextGeneration::new();
        llm.push(scoring_json(60, "enterprise-ish"));
        let tracer = CollectingTraceSink::new();
        let config = PipelineConfig::default();

        let (scored, _) =
            score_all(&llm, &tracer, vec![candidate("X")], "profile", &config).await;
        assert_eq!(scored[0].size_class, Some(SizeClass::Medium));
    }

    #[tokio::test]
    async fn existing_scores_are_never_recomputed() {
        let llm = MockTextGeneration::new();
        let tracer = CollectingTraceSink::new();
        let config = PipelineConfig::default();

        let mut pre_scored = candidate("Done");
        pre_scored.fit_score = Some(77);

        let (scored, stats) =
            score_all(&llm, &tracer, vec![pre_scored], "profile", &config).await;

        assert_eq!(scored[0].fit_score, Some(77));
        assert_eq!(stats.already_scored, 1);
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn failed_candidate_is_dropped_not_fatal() {
        let llm = MockTextGeneration::new();
        // First candidate: malformed twice (initial + retry).
        llm.push(json!({"nope": 1}));
        llm.push(json!({"nope": 2}));
        llm.push(scoring_json(70, "Medium"));
        let tracer = CollectingTraceSink::new();
        let config = PipelineConfig::default().with_max_concurrency(1);

        let (scored, stats) = score_all(
            &llm,
            &tracer,
            vec![candidate("Bad"), candidate("Good")],
            "profile",
            &config,
        )
        .await;

        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].company_name, "Good");
        assert_eq!(stats.failures, 1);
    }
}
