//! Criteria filter — splits enriched candidates on the verdict recorded
//! during enrichment. Pure bookkeeping: no provider calls, no judgement of
//! its own. Runs before dedup so rejection records keep per-source reasons.

use tracing::info;

use leadscout_common::{CandidateCompany, RejectionRecord, RejectionStage};

pub fn partition(
    candidates: Vec<CandidateCompany>,
) -> (Vec<CandidateCompany>, Vec<RejectionRecord>) {
    let mut matching = Vec::new();
    let mut rejected = Vec::new();

    for candidate in candidates {
        if candidate.criteria_match {
            matching.push(candidate);
        } else {
            rejected.push(RejectionRecord {
                company_name: candidate.company_name,
                stage: RejectionStage::Criteria,
                reason: candidate.match_reason,
            });
        }
    }

    info!(
        matching = matching.len(),
        rejected = rejected.len(),
        "Criteria filter complete"
    );
    (matching, rejected)
}
