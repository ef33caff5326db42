//! Prompt library for the discovery pipeline. All prompt text lives here
//! so instructions can be reviewed and tuned in one place.

use leadscout_common::{CandidateCompany, SearchHit, TargetCategory};
use llm_client::util::truncate_to_char_boundary;

/// Cap on raw page content fed into a single enrichment prompt.
const MAX_CONTENT_BYTES: usize = 6_000;

// ---------------------------------------------------------------------------
// Query generation
// ---------------------------------------------------------------------------

pub const QUERY_GENERATION_SYSTEM: &str = "\
You generate web search queries for B2B company discovery. Given a vendor \
profile and a target type, produce 3-5 specific, diversified queries that \
will surface real companies.\n\n\
For CUSTOMERS: find companies that would buy the product (dealerships, \
dealer groups, OEMs).\n\
For PARTNERS: find companies that would integrate or co-sell (payment \
processors, CRM vendors, analytics providers, lenders).\n\n\
If additional criteria are provided (anything other than \"None\"), \
integrate them into EVERY query, not just one.\n\
Examples:\n\
- Criteria \"Focus on California\": \"California automotive dealership groups\", \
\"California car dealer software buyers\"\n\
- Criteria \"Enterprise companies only\": \"enterprise dealership groups\", \
\"large automotive retail chains\"\n\n\
Return one query per entry, no numbering, no explanations.";

pub fn query_generation_user(profile: &str, category: TargetCategory, criteria: &str) -> String {
    format!(
        "Vendor profile:\n{profile}\n\n\
         Target type: {category}\n\
         Additional criteria: {criteria}\n\n\
         Generate 3-5 web search queries to find potential {category}s."
    )
}

/// Fallback prompt for the single retry after malformed output. Shorter
/// instructions, no profile text — just the ask.
pub fn query_generation_simplified(category: TargetCategory, criteria: &str) -> String {
    format!(
        "Generate exactly 4 web search queries to find potential {category} \
         companies for an automotive dealership software vendor. \
         Additional criteria to include in every query: {criteria}."
    )
}

// ---------------------------------------------------------------------------
// Enrichment
// ---------------------------------------------------------------------------

pub const ENRICHMENT_SYSTEM: &str = "\
You extract structured company information from a single web search result, \
and in the same pass judge whether the company matches the user's criteria.\n\n\
Rules:\n\
- company_name: the official company name, or null if the result is not \
about a real company (news roundups, directories, generic articles).\n\
- website_url: the company's OWN website. NOT linkedin.com, crunchbase.com, \
or other profile sites. Look for mentions like \"visit us at\", \
\"website:\", or bare domain names in the content. Null if none found.\n\
- locations: ONLY geographic names (cities, states, countries), drawn from \
phrases like \"based in\", \"located in\", \"headquarters in\".\n\
  Correct: [\"San Ramon, CA\", \"Pleasanton, CA\"] or [\"California\", \"Texas\"]\n\
  Incorrect: [\"Based in San Francisco with offices\"] — never include \
descriptive text.\n\
- size_indicators: clues about company size (employee counts, revenue, \
\"enterprise\", \"startup\", \"Fortune 500\").\n\
- business_description: one sentence on what they do.\n\
- criteria_match: does this company satisfy the additional criteria? If the \
criteria is \"None\", always true.\n\
- match_reason: one sentence on why it matches or does not.\n\n\
Examples:\n\
- Criteria \"California only\", company in Florida -> criteria_match: false, \
match_reason: \"Headquartered in Florida, not California\"\n\
- Criteria \"luxury brands\", company sells BMW/Mercedes -> criteria_match: \
true, match_reason: \"Specializes in luxury automotive brands\"\n\
- Criteria \"None\" -> criteria_match: true, match_reason: \"No specific \
criteria to validate\"";

pub fn enrichment_user(hit: &SearchHit, criteria: &str) -> String {
    format!(
        "Title: {}\nURL: {}\nContent: {}\n\nAdditional criteria: {criteria}",
        hit.title,
        hit.url,
        truncate_to_char_boundary(&hit.content, MAX_CONTENT_BYTES),
    )
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

pub const SCORING_SYSTEM: &str = "\
You evaluate how well a company fits as a prospect for the vendor described \
in the context. Score 0-100 against the evaluation criteria, estimate the \
company's size, and explain the score in 2-3 sentences. Be realistic — not \
every company is a perfect fit.";

const SCORING_CRITERIA_CUSTOMER: &str = "\
- Automotive dealership or dealer group (HIGH priority)
- Multiple locations (5-200 rooftops ideal)
- North America based
- Mentions of legacy systems, modernization, digital transformation
- Size: Medium to Large preferred";

const SCORING_CRITERIA_PARTNER: &str = "\
- Complementary technology (payments, CRM, analytics, lending)
- Automotive industry experience
- API/integration capabilities
- Not a direct competitor (not a DMS provider)
- Established presence in market";

/// Category-specific rubric text. Supplied to the prompt, never encoded
/// as scoring logic.
pub fn scoring_rubric(category: TargetCategory) -> &'static str {
    match category {
        TargetCategory::Customer => SCORING_CRITERIA_CUSTOMER,
        TargetCategory::Partner => SCORING_CRITERIA_PARTNER,
    }
}

pub fn scoring_user(profile: &str, candidate: &CandidateCompany) -> String {
    format!(
        "VENDOR CONTEXT:\n{profile}\n\n\
         COMPANY TO EVALUATE:\n\
         Name: {}\n\
         Website: {}\n\
         Locations: {}\n\
         Size indicators: {}\n\
         Description: {}\n\n\
         EVALUATION CRITERIA ({}):\n{}",
        candidate.company_name,
        candidate.website_url,
        candidate.locations.join(", "),
        candidate.size_indicators.join(", "),
        candidate.description.as_deref().unwrap_or("N/A"),
        candidate.category,
        scoring_rubric(candidate.category),
    )
}
