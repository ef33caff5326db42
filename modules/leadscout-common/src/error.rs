use thiserror::Error;

use crate::types::FunnelCounts;

/// Error taxonomy for a discovery run.
///
/// Only `QueryGeneration` and `SearchUnavailable` abort a run; `Provider`
/// and `Parse` are per-item conditions that the stages isolate (retry once,
/// then drop the item) and never escalate to the batch.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Query generation failed: {0}")]
    QueryGeneration(String),

    #[error("All search queries failed; search provider unavailable")]
    SearchUnavailable,

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Malformed structured output: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl DiscoveryError {
    /// Whether this error aborts the whole run (as opposed to a single item).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DiscoveryError::QueryGeneration(_)
                | DiscoveryError::SearchUnavailable
                | DiscoveryError::Config(_)
                | DiscoveryError::Cancelled
        )
    }
}

/// A failed run still carries the funnel counts gathered before the
/// failure — partial state is surfaced, never silently discarded.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct PipelineFailure {
    #[source]
    pub error: DiscoveryError,
    pub funnel: FunnelCounts,
}

impl PipelineFailure {
    pub fn new(error: DiscoveryError, funnel: FunnelCounts) -> Self {
        Self { error, funnel }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatality_split_matches_contract() {
        assert!(DiscoveryError::QueryGeneration("bad".into()).is_fatal());
        assert!(DiscoveryError::SearchUnavailable.is_fatal());
        assert!(DiscoveryError::Cancelled.is_fatal());
        assert!(!DiscoveryError::Provider("timeout".into()).is_fatal());
        assert!(!DiscoveryError::Parse("not json".into()).is_fatal());
    }

    #[test]
    fn failure_keeps_partial_funnel() {
        use crate::types::StageName;
        let mut funnel = FunnelCounts::default();
        funnel.record(StageName::QueryGeneration, 1, 4);

        let failure = PipelineFailure::new(DiscoveryError::SearchUnavailable, funnel);
        assert_eq!(failure.funnel.stages().len(), 1);
    }
}
