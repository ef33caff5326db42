//! Deduplication — URL host first, fuzzy company name second. First
//! occurrence always wins, so output order is input order with duplicates
//! removed; running the stage twice changes nothing.

use std::collections::HashSet;

use tracing::{debug, info};

use leadscout_common::normalize::{names_similar, normalize_company_name, normalize_url_host};
use leadscout_common::CandidateCompany;

#[derive(Debug, Default)]
pub struct DedupStats {
    pub url_duplicates: usize,
    pub name_duplicates: usize,
}

pub fn dedup(
    candidates: Vec<CandidateCompany>,
    name_similarity_threshold: f64,
) -> (Vec<CandidateCompany>, DedupStats) {
    let mut seen_hosts: HashSet<String> = HashSet::new();
    let mut retained_names: Vec<String> = Vec::new();
    let mut retained: Vec<CandidateCompany> = Vec::new();
    let mut stats = DedupStats::default();

    for candidate in candidates {
        let host = normalize_url_host(&candidate.website_url);
        // Empty hosts (no resolvable website) never collide on URL; the
        // name check still applies.
        if !host.is_empty() && !seen_hosts.insert(host) {
            stats.url_duplicates += 1;
            debug!(company = %candidate.company_name, "Dropped URL duplicate");
            continue;
        }

        let name = normalize_company_name(&candidate.company_name);
        if retained_names
            .iter()
            .any(|kept| names_similar(kept, &name, name_similarity_threshold))
        {
            stats.name_duplicates += 1;
            debug!(company = %candidate.company_name, "Dropped name duplicate");
            continue;
        }

        retained_names.push(name);
        retained.push(candidate);
    }

    info!(
        retained = retained.len(),
        url_duplicates = stats.url_duplicates,
        name_duplicates = stats.name_duplicates,
        "Deduplication complete"
    );
    (retained, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadscout_common::{Provenance, TargetCategory};

    fn candidate(name: &str, url: &str) -> CandidateCompany {
        CandidateCompany {
            company_name: name.to_string(),
            website_url: url.to_string(),
            locations: vec!["Oregon".to_string()],
            size_indicators: vec![],
            size_class: None,
            description: None,
            criteria_match: true,
            match_reason: String::new(),
            fit_score: None,
            rationale: None,
            category: TargetCategory::Customer,
            provenance: Provenance {
                source_url: url.to_string(),
                source_title: "t".to_string(),
                query: "q".to_string(),
            },
        }
    }

    #[test]
    fn url_variants_collapse_to_first_occurrence() {
        let (retained, stats) = dedup(
            vec![
                candidate("Lithia Motors", "https://www.lithia.com/california"),
                candidate("Lithia Motors Inc", "https://lithia.com"),
                candidate("Van Horn", "https://vanhorn.com"),
            ],
            0.8,
        );

        assert_eq!(retained.len(), 2);
        assert_eq!(retained[0].company_name, "Lithia Motors");
        assert_eq!(retained[0].website_url, "https://www.lithia.com/california");
        assert_eq!(retained[1].company_name, "Van Horn");
        assert_eq!(stats.url_duplicates, 1);
        assert_eq!(stats.name_duplicates, 0);
    }

    #[test]
    fn fuzzy_names_collapse_across_different_urls() {
        let (retained, stats) = dedup(
            vec![
                candidate("Lithia Motors, Inc.", "https://lithia.com"),
                candidate("Lithia Motors", "https://lithiamotors.example.com"),
                candidate("Sonic Automotive", "https://sonicautomotive.com"),
            ],
            0.8,
        );

        assert_eq!(retained.len(), 2);
        assert_eq!(retained[0].company_name, "Lithia Motors, Inc.");
        assert_eq!(stats.name_duplicates, 1);
    }

    #[test]
    fn substring_rule_matches_short_against_long() {
        let (retained, _) = dedup(
            vec![
                candidate("Van Horn Automotive Group", "https://vanhorn.com"),
                candidate("Van Horn", "https://vanhornauto.example.com"),
            ],
            0.8,
        );
        assert_eq!(retained.len(), 1);
    }

    #[test]
    fn distinct_companies_survive() {
        let (retained, stats) = dedup(
            vec![
                candidate("Lithia Motors", "https://lithia.com"),
                candidate("Sonic Automotive", "https://sonicautomotive.com"),
                candidate("Penske Automotive", "https://penskeautomotive.com"),
            ],
            0.8,
        );
        assert_eq!(retained.len(), 3);
        assert_eq!(stats.url_duplicates + stats.name_duplicates, 0);
    }

    #[test]
    fn dedup_is_idempotent() {
        let input = vec![
            candidate("Lithia Motors", "https://lithia.com"),
            candidate("Lithia Motors Inc", "https://www.lithia.com"),
            candidate("Van Horn", "https://vanhorn.com"),
        ];
        let (first, _) = dedup(input, 0.8);
        let (second, stats) = dedup(first.clone(), 0.8);

        assert_eq!(first.len(), second.len());
        assert_eq!(stats.url_duplicates + stats.name_duplicates, 0);
    }

    #[test]
    fn empty_hosts_do_not_collide_on_url() {
        let (retained, stats) = dedup(
            vec![
                candidate("Alpha Dealers", ""),
                candidate("Beta Motors", ""),
            ],
            0.8,
        );
        assert_eq!(retained.len(), 2);
        assert_eq!(stats.url_duplicates, 0);
    }
}
