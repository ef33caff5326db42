//! Validation and ranking — the last gate before results leave the
//! pipeline. Checks run in a fixed order and the first failure becomes the
//! rejection reason; survivors are ranked by fit score and cut to top-N.

use tracing::info;

use leadscout_common::{
    CandidateCompany, RejectionRecord, RejectionStage, SizeClass, LOCATION_NOT_SPECIFIED,
};

pub fn validate_and_rank(
    candidates: Vec<CandidateCompany>,
    min_score: u8,
    top_n: usize,
) -> (Vec<CandidateCompany>, Vec<RejectionRecord>) {
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    for mut candidate in candidates {
        match check(&candidate, min_score) {
            Ok(()) => {
                // Missing size is a data gap, not a defect.
                if candidate.size_class.is_none() {
                    candidate.size_class = Some(SizeClass::Medium);
                }
                accepted.push(candidate);
            }
            Err(reason) => rejected.push(RejectionRecord {
                company_name: candidate.company_name,
                stage: RejectionStage::Validation,
                reason,
            }),
        }
    }

    // Stable sort: equal scores keep first-seen order.
    accepted.sort_by(|a, b| b.fit_score.cmp(&a.fit_score));
    accepted.truncate(top_n);

    info!(
        accepted = accepted.len(),
        rejected = rejected.len(),
        "Validation complete"
    );
    (accepted, rejected)
}

/// Fixed-order checks; the first failed check names the rejection.
fn check(candidate: &CandidateCompany, min_score: u8) -> Result<(), String> {
    if candidate.company_name.trim().is_empty() {
        return Err("Missing company_name".to_string());
    }
    if candidate.website_url.trim().is_empty() {
        return Err("Missing website_url".to_string());
    }
    if candidate.locations.is_empty() {
        return Err("Missing locations".to_string());
    }

    let score = candidate
        .fit_score
        .ok_or_else(|| "Missing fit_score".to_string())?;
    if candidate
        .rationale
        .as_deref()
        .map_or(true, |r| r.trim().is_empty())
    {
        return Err("Missing rationale".to_string());
    }
    if score < min_score {
        return Err(format!("Fit score {score} below threshold {min_score}"));
    }

    if !is_plausible_url(&candidate.website_url) {
        return Err(format!("Implausible website URL: {}", candidate.website_url));
    }

    if candidate
        .locations
        .iter()
        .any(|l| l == LOCATION_NOT_SPECIFIED)
    {
        return Err("Location not specified (placeholder)".to_string());
    }

    Ok(())
}

fn is_plausible_url(url: &str) -> bool {
    let rest = if let Some(rest) = url.strip_prefix("https://") {
        rest
    } else if let Some(rest) = url.strip_prefix("http://") {
        rest
    } else {
        return false;
    };
    let host = rest.split('/').next().unwrap_or_default();
    host.contains('.')
}
