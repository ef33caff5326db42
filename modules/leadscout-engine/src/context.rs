//! Vendor-profile assembly over the context-retrieval capability.

use tracing::warn;

use crate::tracer::{TraceSink, TraceTimer};
use crate::traits::ContextRetrieval;

/// Topics used to assemble a rounded vendor profile from the context
/// provider.
const PROFILE_TOPICS: &[&str] = &[
    "company overview and product",
    "target customers and market",
    "key features and capabilities",
];

/// Build the vendor-profile context blob used by query generation and
/// scoring. Retrieval failures degrade to whatever topics succeeded —
/// an empty profile is unfortunate but not fatal; the prompts still work.
pub async fn build_vendor_profile(
    context: &dyn ContextRetrieval,
    tracer: &dyn TraceSink,
    chunks_per_topic: usize,
) -> String {
    let mut sections: Vec<String> = Vec::new();

    for topic in PROFILE_TOPICS {
        let timer = TraceTimer::start("context_retrieval");
        match context.retrieve(topic, chunks_per_topic).await {
            Ok(text) => {
                tracer.record(timer.success(0));
                let text = text.trim().to_string();
                if !text.is_empty() && !sections.contains(&text) {
                    sections.push(text);
                }
            }
            Err(e) => {
                tracer.record(timer.failure(e.to_string()));
                warn!(topic, error = %e, "Context retrieval failed, continuing without topic");
            }
        }
    }

    sections.join("\n\n")
}
