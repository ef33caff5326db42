//! Search stage — fans queries out to the web-search capability, tolerates
//! individual query failures, and flattens results with in-stage exact-URL
//! dedup. Full fuzzy dedup happens later, after enrichment.

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use leadscout_common::{DiscoveryError, SearchHit};

use crate::tracer::{TraceSink, TraceTimer};
use crate::traits::WebSearch;

pub async fn search_all(
    search: &dyn WebSearch,
    tracer: &dyn TraceSink,
    queries: &[String],
    max_results_per_query: u32,
    max_concurrency: usize,
) -> Result<Vec<SearchHit>, DiscoveryError> {
    // Queries run concurrently but results are reassembled in query order
    // so downstream first-seen tie-breaks stay reproducible.
    let mut results: Vec<(usize, Result<Vec<SearchHit>, String>)> =
        stream::iter(queries.iter().enumerate().map(|(idx, query)| async move {
            let timer = TraceTimer::start("web_search");
            match search.search(query, max_results_per_query).await {
                Ok(hits) => {
                    tracer.record(timer.success(0));
                    (idx, Ok(hits))
                }
                Err(e) => {
                    tracer.record(timer.failure(e.to_string()));
                    (idx, Err(e.to_string()))
                }
            }
        }))
        .buffer_unordered(max_concurrency.max(1))
        .collect()
        .await;

    results.sort_by_key(|(idx, _)| *idx);

    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut hits: Vec<SearchHit> = Vec::new();
    let mut failed = 0usize;

    for (idx, result) in results {
        match result {
            Ok(query_hits) => {
                for hit in query_hits {
                    // Exact-URL dedup across queries; first occurrence wins.
                    if seen_urls.insert(hit.url.clone()) {
                        hits.push(hit);
                    }
                }
            }
            Err(e) => {
                failed += 1;
                warn!(query = %queries[idx], error = %e, "Search query failed, skipping");
            }
        }
    }

    if failed == queries.len() && !queries.is_empty() {
        return Err(DiscoveryError::SearchUnavailable);
    }

    info!(
        queries = queries.len(),
        failed,
        unique_hits = hits.len(),
        "Search complete"
    );
    Ok(hits)
}
