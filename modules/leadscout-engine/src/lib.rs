pub mod context;
pub mod criteria;
pub mod dedup;
pub mod enrich;
pub mod pipeline;
pub mod prompts;
pub mod query_gen;
pub mod score;
pub mod search;
pub mod tracer;
pub mod traits;
pub mod validate;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use pipeline::DiscoveryPipeline;
