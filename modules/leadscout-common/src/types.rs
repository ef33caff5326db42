use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Placeholder written by enrichment when no location could be determined.
/// Validation always rejects candidates carrying it.
pub const LOCATION_NOT_SPECIFIED: &str = "Location not specified";

// --- Enums ---

/// What kind of company the run is hunting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TargetCategory {
    Customer,
    Partner,
}

impl std::fmt::Display for TargetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetCategory::Customer => write!(f, "Customer"),
            TargetCategory::Partner => write!(f, "Partner"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum SizeClass {
    Small,
    Medium,
    Large,
}

impl SizeClass {
    /// Lenient parse for LLM-produced size strings. Anything unrecognised
    /// is `None`; scoring coerces that to `Medium`.
    pub fn parse_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "small" => Some(SizeClass::Small),
            "medium" => Some(SizeClass::Medium),
            "large" => Some(SizeClass::Large),
            _ => None,
        }
    }
}

impl std::fmt::Display for SizeClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SizeClass::Small => write!(f, "Small"),
            SizeClass::Medium => write!(f, "Medium"),
            SizeClass::Large => write!(f, "Large"),
        }
    }
}

// --- Request ---

/// One discovery run's parameters. Built once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryRequest {
    pub target_category: TargetCategory,
    /// Free-text constraints the user supplied, e.g. "California only".
    /// `None` means every enriched candidate matches by construction.
    pub free_text_criteria: Option<String>,
    /// How many accepted companies to return (top-N after ranking).
    pub requested_count: usize,
    pub max_results_per_query: u32,
    /// Inclusive lower bound on fit_score.
    pub min_score: u8,
}

impl DiscoveryRequest {
    pub fn new(target_category: TargetCategory) -> Self {
        Self {
            target_category,
            free_text_criteria: None,
            requested_count: 10,
            max_results_per_query: 5,
            min_score: 40,
        }
    }

    pub fn with_criteria(mut self, criteria: impl Into<String>) -> Self {
        let criteria = criteria.into();
        self.free_text_criteria = if criteria.trim().is_empty() {
            None
        } else {
            Some(criteria)
        };
        self
    }

    pub fn with_requested_count(mut self, count: usize) -> Self {
        self.requested_count = count;
        self
    }

    pub fn with_max_results_per_query(mut self, max: u32) -> Self {
        self.max_results_per_query = max;
        self
    }

    pub fn with_min_score(mut self, min_score: u8) -> Self {
        self.min_score = min_score;
        self
    }

    /// Reject nonsense parameters before any provider call is made.
    pub fn validate(&self) -> Result<(), crate::error::DiscoveryError> {
        if self.requested_count == 0 {
            return Err(crate::error::DiscoveryError::Config(
                "requested_count must be positive".into(),
            ));
        }
        if self.max_results_per_query == 0 {
            return Err(crate::error::DiscoveryError::Config(
                "max_results_per_query must be positive".into(),
            ));
        }
        if self.min_score > 100 {
            return Err(crate::error::DiscoveryError::Config(
                "min_score must be in 0..=100".into(),
            ));
        }
        Ok(())
    }

    /// Criteria text as fed to prompts: the user's text or "None".
    pub fn criteria_text(&self) -> &str {
        self.free_text_criteria.as_deref().unwrap_or("None")
    }
}

// --- Search ---

/// A raw web-search result. Ephemeral; consumed by enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub content: String,
    pub relevance_score: f32,
    /// The query that produced this hit.
    pub query: String,
}

// --- Candidates ---

/// Where a candidate came from, kept for traceability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    pub source_url: String,
    pub source_title: String,
    pub query: String,
}

impl Provenance {
    pub fn from_hit(hit: &SearchHit) -> Self {
        Self {
            source_url: hit.url.clone(),
            source_title: hit.title.clone(),
            query: hit.query.clone(),
        }
    }
}

/// A company record flowing through the pipeline. Stages evolve it by
/// copy, never in place; `fit_score` is written exactly once, by scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateCompany {
    pub company_name: String,
    pub website_url: String,
    /// Geographic names only. Never empty past enrichment — the sentinel
    /// [`LOCATION_NOT_SPECIFIED`] stands in when nothing was found.
    pub locations: Vec<String>,
    pub size_indicators: Vec<String>,
    pub size_class: Option<SizeClass>,
    pub description: Option<String>,
    /// Verdict on the request's free-text criteria, set during enrichment.
    pub criteria_match: bool,
    pub match_reason: String,
    pub fit_score: Option<u8>,
    pub rationale: Option<String>,
    pub category: TargetCategory,
    pub provenance: Provenance,
}

// --- Rejections and results ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionStage {
    Criteria,
    Validation,
}

impl std::fmt::Display for RejectionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionStage::Criteria => write!(f, "criteria"),
            RejectionStage::Validation => write!(f, "validation"),
        }
    }
}

/// A candidate turned away, with the human-readable reason. Rejections are
/// data, not errors — they ride along into the final result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectionRecord {
    pub company_name: String,
    pub stage: RejectionStage,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    /// The cancellation signal fired between stages; counts and any
    /// candidates gathered so far are still attached.
    Cancelled,
}

/// Final output of a run. Constructed once, read-only afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryResult {
    /// Accepted candidates, fit_score descending, first-seen order on ties.
    pub accepted: Vec<CandidateCompany>,
    pub criteria_rejected: Vec<RejectionRecord>,
    pub validation_rejected: Vec<RejectionRecord>,
    pub funnel: FunnelCounts,
    pub outcome: RunOutcome,
}

// --- Funnel ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    QueryGeneration,
    Search,
    Enrichment,
    CriteriaFilter,
    Deduplication,
    Scoring,
    Validation,
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageName::QueryGeneration => write!(f, "query_generation"),
            StageName::Search => write!(f, "search"),
            StageName::Enrichment => write!(f, "enrichment"),
            StageName::CriteriaFilter => write!(f, "criteria_filter"),
            StageName::Deduplication => write!(f, "deduplication"),
            StageName::Scoring => write!(f, "scoring"),
            StageName::Validation => write!(f, "validation"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StageCount {
    pub stage: StageName,
    pub input: usize,
    pub output: usize,
}

/// Per-stage input/output sizes, in execution order. The transparency
/// backbone of every report, success or failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunnelCounts {
    stages: Vec<StageCount>,
}

impl FunnelCounts {
    pub fn record(&mut self, stage: StageName, input: usize, output: usize) {
        self.stages.push(StageCount {
            stage,
            input,
            output,
        });
    }

    pub fn get(&self, stage: StageName) -> Option<StageCount> {
        self.stages.iter().find(|s| s.stage == stage).copied()
    }

    pub fn stages(&self) -> &[StageCount] {
        &self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl std::fmt::Display for FunnelCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Discovery Funnel ===")?;
        for s in &self.stages {
            writeln!(f, "{:<18} {:>4} -> {:<4}", s.stage.to_string(), s.input, s.output)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_class_parses_loosely() {
        assert_eq!(SizeClass::parse_loose("Small"), Some(SizeClass::Small));
        assert_eq!(SizeClass::parse_loose(" MEDIUM "), Some(SizeClass::Medium));
        assert_eq!(SizeClass::parse_loose("large"), Some(SizeClass::Large));
        assert_eq!(SizeClass::parse_loose("enterprise"), None);
        assert_eq!(SizeClass::parse_loose(""), None);
    }

    #[test]
    fn blank_criteria_is_none() {
        let req = DiscoveryRequest::new(TargetCategory::Customer).with_criteria("   ");
        assert!(req.free_text_criteria.is_none());
        assert_eq!(req.criteria_text(), "None");

        let req = req.with_criteria("California only");
        assert_eq!(req.criteria_text(), "California only");
    }

    #[test]
    fn request_validation_catches_zero_counts() {
        let req = DiscoveryRequest::new(TargetCategory::Partner).with_requested_count(0);
        assert!(req.validate().is_err());

        let req = DiscoveryRequest::new(TargetCategory::Partner).with_max_results_per_query(0);
        assert!(req.validate().is_err());

        let req = DiscoveryRequest::new(TargetCategory::Partner);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn funnel_records_in_order() {
        let mut funnel = FunnelCounts::default();
        funnel.record(StageName::Search, 4, 12);
        funnel.record(StageName::Enrichment, 12, 9);

        assert_eq!(funnel.stages().len(), 2);
        let s = funnel.get(StageName::Enrichment).unwrap();
        assert_eq!((s.input, s.output), (12, 9));
        assert!(funnel.get(StageName::Scoring).is_none());
    }
}
