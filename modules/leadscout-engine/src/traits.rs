// Capability traits the pipeline depends on.
//
// TextGeneration, WebSearch, and ContextRetrieval are the only ways any
// stage touches the outside world. Trait objects keep every stage testable
// with in-memory mocks: no network, no API keys, `cargo test` in seconds.

use anyhow::Result;
use async_trait::async_trait;

use leadscout_common::{DiscoveryError, SearchHit};
use llm_client::StructuredOutput;

use crate::tracer::{TraceSink, TraceTimer};

// ---------------------------------------------------------------------------
// TextGeneration
// ---------------------------------------------------------------------------

/// Raw output of a structured generation call.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub value: serde_json::Value,
    pub tokens: u32,
}

#[async_trait]
pub trait TextGeneration: Send + Sync {
    /// Produce JSON conforming to `schema` from a system + user prompt.
    async fn generate_json(
        &self,
        system: &str,
        user: &str,
        schema: &serde_json::Value,
    ) -> Result<GenerationOutput>;
}

#[async_trait]
impl TextGeneration for llm_client::Claude {
    async fn generate_json(
        &self,
        system: &str,
        user: &str,
        schema: &serde_json::Value,
    ) -> Result<GenerationOutput> {
        let extraction = self.extract_value(system, user, schema).await?;
        Ok(GenerationOutput {
            value: extraction.value,
            tokens: extraction.tokens,
        })
    }
}

#[async_trait]
impl TextGeneration for llm_client::OpenAi {
    async fn generate_json(
        &self,
        system: &str,
        user: &str,
        schema: &serde_json::Value,
    ) -> Result<GenerationOutput> {
        let extraction = self.extract_value(system, user, schema).await?;
        Ok(GenerationOutput {
            value: extraction.value,
            tokens: extraction.tokens,
        })
    }
}

// ---------------------------------------------------------------------------
// WebSearch
// ---------------------------------------------------------------------------

#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Search the web for `query`, returning at most `max_results` hits.
    /// Implementations fill [`SearchHit::query`] with the issuing query.
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>>;
}

#[async_trait]
impl WebSearch for tavily_client::TavilyClient {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>> {
        let results = self.search(query, max_results).await?;
        Ok(results
            .iter()
            .map(|r| SearchHit {
                title: r.title.clone(),
                url: r.url.clone(),
                content: r.best_content().to_string(),
                relevance_score: r.score,
                query: query.to_string(),
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// ContextRetrieval
// ---------------------------------------------------------------------------

/// Black-box context provider. In production this fronts a semantic index
/// over the vendor's documents; the pipeline only sees the synthesized
/// text blob.
#[async_trait]
pub trait ContextRetrieval: Send + Sync {
    async fn retrieve(&self, topic: &str, k: usize) -> Result<String>;
}

/// Fixed-text context provider, for deployments without a vector store
/// (and for tests).
pub struct StaticContext {
    text: String,
}

impl StaticContext {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl ContextRetrieval for StaticContext {
    async fn retrieve(&self, _topic: &str, _k: usize) -> Result<String> {
        Ok(self.text.clone())
    }
}

// ---------------------------------------------------------------------------
// Structured extraction helpers
// ---------------------------------------------------------------------------

/// One structured-generation attempt, traced. Transport failures map to
/// `Provider`, undeserializable output to `Parse`.
pub async fn extract_structured<T: StructuredOutput>(
    llm: &dyn TextGeneration,
    tracer: &dyn TraceSink,
    operation: &'static str,
    system: &str,
    user: &str,
) -> Result<T, DiscoveryError> {
    let schema = T::output_schema();
    let timer = TraceTimer::start(operation);

    let output = match llm.generate_json(system, user, &schema).await {
        Ok(output) => output,
        Err(e) => {
            tracer.record(timer.failure(e.to_string()));
            return Err(DiscoveryError::Provider(e.to_string()));
        }
    };

    match serde_json::from_value::<T>(output.value) {
        Ok(value) => {
            tracer.record(timer.success(output.tokens));
            Ok(value)
        }
        Err(e) => {
            tracer.record(timer.failure(e.to_string()));
            Err(DiscoveryError::Parse(format!(
                "{}: {e}",
                T::type_name()
            )))
        }
    }
}

/// Two attempts with the same prompt — the standard per-item policy:
/// retry once, then let the caller drop the item.
pub async fn extract_with_retry<T: StructuredOutput>(
    llm: &dyn TextGeneration,
    tracer: &dyn TraceSink,
    operation: &'static str,
    system: &str,
    user: &str,
) -> Result<T, DiscoveryError> {
    match extract_structured::<T>(llm, tracer, operation, system, user).await {
        Ok(value) => Ok(value),
        Err(first) => {
            tracing::debug!(operation, error = %first, "retrying structured extraction");
            extract_structured::<T>(llm, tracer, operation, system, user).await
        }
    }
}
