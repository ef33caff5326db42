//! Query generation — turns a discovery request plus vendor context into
//! 3-5 diversified search queries. Malformed output gets one retry with a
//! simplified prompt; a second failure aborts the run.

use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, warn};

use leadscout_common::{DiscoveryError, DiscoveryRequest};

use crate::prompts;
use crate::tracer::TraceSink;
use crate::traits::{extract_structured, TextGeneration};

const MIN_QUERIES: usize = 3;
const MAX_QUERIES: usize = 5;

/// Response schema for query generation.
#[derive(Debug, Deserialize, JsonSchema)]
struct QueryGenerationResponse {
    /// 3-5 distinct web search queries.
    queries: Vec<String>,
}

pub async fn generate_queries(
    llm: &dyn TextGeneration,
    tracer: &dyn TraceSink,
    request: &DiscoveryRequest,
    vendor_profile: &str,
) -> Result<Vec<String>, DiscoveryError> {
    let criteria = request.criteria_text();
    let user = prompts::query_generation_user(vendor_profile, request.target_category, criteria);

    let first = attempt(llm, tracer, prompts::QUERY_GENERATION_SYSTEM, &user).await;
    match first {
        Ok(queries) => {
            info!(count = queries.len(), "Generated search queries");
            log_criteria_coverage(&queries, request.free_text_criteria.as_deref());
            return Ok(queries);
        }
        Err(e) => {
            warn!(error = %e, "Query generation failed, retrying with simplified prompt");
        }
    }

    let simplified = prompts::query_generation_simplified(request.target_category, criteria);
    match attempt(llm, tracer, prompts::QUERY_GENERATION_SYSTEM, &simplified).await {
        Ok(queries) => {
            info!(count = queries.len(), "Generated search queries on retry");
            log_criteria_coverage(&queries, request.free_text_criteria.as_deref());
            Ok(queries)
        }
        Err(e) => Err(DiscoveryError::QueryGeneration(e.to_string())),
    }
}

/// The prompt demands criteria in every query; this is the backstop that
/// makes silent drift visible in the logs.
fn log_criteria_coverage(queries: &[String], criteria: Option<&str>) {
    let Some(criteria) = criteria else { return };
    let missing = queries_missing_criteria(queries, criteria);
    if !missing.is_empty() {
        warn!(
            missing = missing.len(),
            total = queries.len(),
            criteria,
            "Generated queries do not all mention the criteria terms"
        );
    }
}

/// Indexes of queries that mention none of the criteria's salient terms
/// (alphanumeric tokens of four or more characters, case-insensitive).
fn queries_missing_criteria(queries: &[String], criteria: &str) -> Vec<usize> {
    let terms: Vec<String> = criteria
        .split_whitespace()
        .map(|token| {
            token
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|t| t.len() >= 4)
        .collect();
    if terms.is_empty() {
        return Vec::new();
    }

    queries
        .iter()
        .enumerate()
        .filter(|(_, q)| {
            let q = q.to_lowercase();
            !terms.iter().any(|t| q.contains(t.as_str()))
        })
        .map(|(idx, _)| idx)
        .collect()
}

async fn attempt(
    llm: &dyn TextGeneration,
    tracer: &dyn TraceSink,
    system: &str,
    user: &str,
) -> Result<Vec<String>, DiscoveryError> {
    let response: QueryGenerationResponse =
        extract_structured(llm, tracer, "query_generation", system, user).await?;
    clean_queries(response.queries)
}

/// Trim, drop empties, deduplicate case-insensitively, cap at five.
/// Fewer than three usable queries counts as malformed output.
fn clean_queries(raw: Vec<String>) -> Result<Vec<String>, DiscoveryError> {
    let mut seen: Vec<String> = Vec::new();
    let mut queries: Vec<String> = Vec::new();

    for q in raw {
        let q = q.trim().to_string();
        if q.is_empty() {
            continue;
        }
        let key = q.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        queries.push(q);
        if queries.len() == MAX_QUERIES {
            break;
        }
    }

    if queries.len() < MIN_QUERIES {
        return Err(DiscoveryError::Parse(format!(
            "expected at least {MIN_QUERIES} queries, got {}",
            queries.len()
        )));
    }
    Ok(queries)
}
