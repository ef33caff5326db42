//! Enrichment stage — one structured LLM call per search hit extracts the
//! company record AND the criteria verdict together. A second call for
//! criteria checking would double cost for no accuracy gain; the content is
//! already in context.

use std::sync::OnceLock;

use futures::stream::{self, StreamExt};
use regex::Regex;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{debug, info, warn};

use leadscout_common::normalize::{extract_domain, normalize_url_host};
use leadscout_common::{
    CandidateCompany, DiscoveryError, DiscoveryRequest, PipelineConfig, Provenance, SearchHit,
    LOCATION_NOT_SPECIFIED,
};

use crate::prompts;
use crate::tracer::TraceSink;
use crate::traits::{extract_with_retry, TextGeneration};

/// Response schema for company extraction.
#[derive(Debug, Deserialize, JsonSchema)]
struct EnrichmentResponse {
    /// Official company name, or null when the result is not a company.
    company_name: Option<String>,
    /// The company's own website, not a profile/aggregator page.
    website_url: Option<String>,
    /// Geographic names only.
    #[serde(default)]
    locations: Vec<String>,
    /// Free-text size clues.
    #[serde(default)]
    size_indicators: Vec<String>,
    business_description: Option<String>,
    /// Verdict on the request's free-text criteria.
    criteria_match: bool,
    match_reason: String,
}

#[derive(Debug, Default)]
pub struct EnrichStats {
    pub enriched: usize,
    pub not_companies: usize,
    pub parse_failures: usize,
}

/// Enrich every hit. Per-item failures are isolated: a hit that cannot be
/// parsed after one retry is dropped and counted, never fatal. Output
/// preserves input order regardless of call concurrency.
pub async fn enrich_all(
    llm: &dyn TextGeneration,
    tracer: &dyn TraceSink,
    hits: &[SearchHit],
    request: &DiscoveryRequest,
    config: &PipelineConfig,
) -> (Vec<CandidateCompany>, EnrichStats) {
    let mut results: Vec<(usize, Result<Option<CandidateCompany>, DiscoveryError>)> =
        stream::iter(hits.iter().enumerate().map(|(idx, hit)| async move {
            (idx, enrich_hit(llm, tracer, hit, request, config).await)
        }))
        .buffer_unordered(config.max_concurrency)
        .collect()
        .await;

    results.sort_by_key(|(idx, _)| *idx);

    let mut stats = EnrichStats::default();
    let mut candidates = Vec::new();

    for (idx, result) in results {
        match result {
            Ok(Some(candidate)) => {
                stats.enriched += 1;
                candidates.push(candidate);
            }
            Ok(None) => {
                // Not a company — dropped silently by contract.
                stats.not_companies += 1;
                debug!(url = %hits[idx].url, "Hit is not a company, skipping");
            }
            Err(e) => {
                stats.parse_failures += 1;
                warn!(url = %hits[idx].url, error = %e, "Enrichment failed for hit, skipping");
            }
        }
    }

    info!(
        enriched = stats.enriched,
        not_companies = stats.not_companies,
        parse_failures = stats.parse_failures,
        "Enrichment complete"
    );
    (candidates, stats)
}

/// Enrich a single hit. `Ok(None)` means "not a company"; `Err` means the
/// LLM output stayed malformed through the retry.
pub async fn enrich_hit(
    llm: &dyn TextGeneration,
    tracer: &dyn TraceSink,
    hit: &SearchHit,
    request: &DiscoveryRequest,
    config: &PipelineConfig,
) -> Result<Option<CandidateCompany>, DiscoveryError> {
    let user = prompts::enrichment_user(hit, request.criteria_text());
    let response: EnrichmentResponse = extract_with_retry(
        llm,
        tracer,
        "enrichment",
        prompts::ENRICHMENT_SYSTEM,
        &user,
    )
    .await?;

    let company_name = match response.company_name {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => return Ok(None),
    };

    let website_url = resolve_website(hit, response.website_url.as_deref(), config);
    let locations = resolve_locations(response.locations, &hit.content);

    // With no criteria to check, every candidate matches by construction.
    let (criteria_match, match_reason) = if request.free_text_criteria.is_none() {
        (true, "No specific criteria to validate".to_string())
    } else {
        (response.criteria_match, response.match_reason)
    };

    Ok(Some(CandidateCompany {
        company_name,
        website_url,
        locations,
        size_indicators: response.size_indicators,
        size_class: None,
        description: response
            .business_description
            .filter(|d| !d.trim().is_empty()),
        criteria_match,
        match_reason,
        fit_score: None,
        rationale: None,
        category: request.target_category,
        provenance: Provenance::from_hit(hit),
    }))
}

/// Pick the candidate's canonical website. When the hit itself lives on an
/// aggregator/profile site, a domain mentioned in the content wins;
/// otherwise the hit's own domain is authoritative.
fn resolve_website(hit: &SearchHit, extracted: Option<&str>, config: &PipelineConfig) -> String {
    let hit_host = normalize_url_host(&hit.url);
    let extracted_host = extracted
        .map(extract_domain)
        .map(|h| normalize_url_host(&h))
        .filter(|h| !h.is_empty());

    let host = if config.is_aggregator_host(&hit_host) {
        extracted_host.unwrap_or(hit_host)
    } else if hit_host.is_empty() {
        extracted_host.unwrap_or_default()
    } else {
        hit_host
    };

    if host.is_empty() {
        String::new()
    } else {
        format!("https://{host}")
    }
}

fn location_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(?:based in|located in|headquarters in)\s+([A-Za-z][A-Za-z .,'-]{1,60})")
            .expect("location pattern is valid")
    })
}

/// Primary path: the LLM's geographic names. Fallback: scan raw content for
/// "based in X" style phrases, yielding a single-element list. When both
/// come up empty the sentinel goes in, and validation will reject it later.
fn resolve_locations(primary: Vec<String>, content: &str) -> Vec<String> {
    let cleaned: Vec<String> = primary
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    if !cleaned.is_empty() {
        return cleaned;
    }

    if let Some(found) = fallback_location(content) {
        return vec![found];
    }

    vec![LOCATION_NOT_SPECIFIED.to_string()]
}

fn fallback_location(content: &str) -> Option<String> {
    let captures = location_pattern().captures(content)?;
    let raw = captures.get(1)?.as_str();

    // Keep only the geographic tokens: cut at the first sentence break and
    // cap at four words ("San Ramon, CA" style).
    let cut = raw
        .split(['.', ';', '\n', '('])
        .next()
        .unwrap_or(raw)
        .trim()
        .trim_end_matches([',', ' ']);
    let words: Vec<&str> = cut.split_whitespace().take(4).collect();
    if words.is_empty() {
        return None;
    }
    Some(words.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{hit, MockTextGeneration};
    use crate::tracer::CollectingTraceSink;
    use leadscout_common::TargetCategory;
    use serde_json::json;

    fn request_with_criteria(criteria: &str) -> DiscoveryRequest {
        DiscoveryRequest::new(TargetCategory::Customer).with_criteria(criteria)
    }

    fn enrichment_json(name: &str, matches: bool, reason: &str) -> serde_json::Value {
        json!({
            "company_name": name,
            "website_url": null,
            "locations": ["Oregon"],
            "size_indicators": [],
            "business_description": "Auto dealer group",
            "criteria_match": matches,
            "match_reason": reason,
        })
    }

    #[tokio::test]
    async fn criteria_verdict_set_in_same_call() {
        let llm = MockTextGeneration::new();
        llm.push(enrichment_json("Lithia Motors", true, "Operates in California"));
        llm.push(enrichment_json("Van Horn Automotive", false, "Wisconsin, not California"));
        let tracer = CollectingTraceSink::new();
        let request = request_with_criteria("California only");
        let config = PipelineConfig::default().with_max_concurrency(1);

        let hits = vec![
            hit("Lithia", "https://lithia.com", "California dealer group"),
            hit("Van Horn", "https://vanhorn.com", "Wisconsin family dealer"),
        ];
        let (candidates, stats) = enrich_all(&llm, &tracer, &hits, &request, &config).await;

        assert_eq!(stats.enriched, 2);
        assert!(candidates[0].criteria_match);
        assert!(!candidates[1].criteria_match);
        assert_eq!(candidates[1].match_reason, "Wisconsin, not California");
        // Exactly one call per hit — no second criteria-check call.
        assert_eq!(llm.calls(), 2);
    }

    #[tokio::test]
    async fn null_company_name_drops_hit_silently() {
        let llm = MockTextGeneration::new();
        llm.push(json!({
            "company_name": null,
            "website_url": null,
            "locations": [],
            "size_indicators": [],
            "business_description": null,
            "criteria_match": true,
            "match_reason": "n/a",
        }));
        let tracer = CollectingTraceSink::new();
        let request = request_with_criteria("");
        let config = PipelineConfig::default();

        let result = enrich_hit(
            &llm,
            &tracer,
            &hit("Top 10 dealer news", "https://news.com/roundup", "listicle"),
            &request,
            &config,
        )
        .await
        .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn empty_criteria_forces_match_true() {
        let llm = MockTextGeneration::new();
        llm.push(enrichment_json("Sonic Automotive", false, "model said no"));
        let tracer = CollectingTraceSink::new();
        let request = request_with_criteria("   ");
        let config = PipelineConfig::default();

        let candidate = enrich_hit(
            &llm,
            &tracer,
            &hit("Sonic", "https://sonic.com", "dealer"),
            &request,
            &config,
        )
        .await
        .unwrap()
        .unwrap();

        assert!(candidate.criteria_match);
        assert_eq!(candidate.match_reason, "No specific criteria to validate");
    }

    #[tokio::test]
    async fn parse_failure_after_retry_drops_only_that_hit() {
        let llm = MockTextGeneration::new();
        // First hit: two malformed responses (initial + retry).
        llm.push(json!({"garbage": true}));
        llm.push(json!({"garbage": true}));
        // Second hit: fine.
        llm.push(enrichment_json("Good Co", true, "ok"));
        let tracer = CollectingTraceSink::new();
        let request = request_with_criteria("");
        let config = PipelineConfig::default().with_max_concurrency(1);

        let hits = vec![
            hit("Bad", "https://bad.com", "x"),
            hit("Good", "https://good.com", "y"),
        ];
        let (candidates, stats) = enrich_all(&llm, &tracer, &hits, &request, &config).await;

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].company_name, "Good Co");
        assert_eq!(stats.parse_failures, 1);
        assert_eq!(llm.calls(), 3);
    }

    #[test]
    fn website_prefers_content_domain_for_aggregator_hits() {
        let config = PipelineConfig::default();
        let aggregator_hit = hit(
            "Lithia | LinkedIn",
            "https://www.linkedin.com/company/lithia",
            "Visit us at lithia.com",
        );
        assert_eq!(
            resolve_website(&aggregator_hit, Some("lithia.com"), &config),
            "https://lithia.com"
        );

        // Non-aggregator hit: its own domain is authoritative even when the
        // LLM extracted something else.
        let direct_hit = hit("Lithia", "https://www.lithia.com/about", "dealer");
        assert_eq!(
            resolve_website(&direct_hit, Some("otherdomain.com"), &config),
            "https://lithia.com"
        );
    }

    #[test]
    fn website_falls_back_to_aggregator_when_nothing_extracted() {
        let config = PipelineConfig::default();
        let aggregator_hit = hit(
            "Profile",
            "https://crunchbase.com/org/acme",
            "no domain mentioned",
        );
        assert_eq!(
            resolve_website(&aggregator_hit, None, &config),
            "https://crunchbase.com"
        );
    }

    #[test]
    fn fallback_location_extracts_geographic_tail() {
        assert_eq!(
            fallback_location("The company is based in San Ramon, CA. It sells software."),
            Some("San Ramon, CA".to_string())
        );
        assert_eq!(
            fallback_location("Their headquarters in Austin serve the region"),
            Some("Austin serve the region".to_string())
        );
        assert_eq!(fallback_location("no geography here"), None);
    }

    #[test]
    fn sentinel_applied_when_both_paths_empty() {
        let locations = resolve_locations(vec![], "nothing matches the patterns");
        assert_eq!(locations, vec![LOCATION_NOT_SPECIFIED.to_string()]);

        let locations = resolve_locations(vec!["  ".to_string()], "still nothing");
        assert_eq!(locations, vec![LOCATION_NOT_SPECIFIED.to_string()]);
    }

    #[test]
    fn primary_locations_win_over_fallback() {
        let locations = resolve_locations(
            vec!["Portland, OR".to_string()],
            "based in Denver, CO apparently",
        );
        assert_eq!(locations, vec!["Portland, OR".to_string()]);
    }
}
