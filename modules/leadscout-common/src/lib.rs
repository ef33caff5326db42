pub mod config;
pub mod error;
pub mod normalize;
pub mod types;

pub use config::{Config, LlmProvider, PipelineConfig};
pub use error::{DiscoveryError, PipelineFailure};
pub use types::*;
