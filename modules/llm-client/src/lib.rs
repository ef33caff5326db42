pub mod claude;
pub mod openai;
pub mod schema;
pub mod util;

pub use claude::Claude;
pub use openai::OpenAi;
pub use schema::StructuredOutput;

/// A structured extraction plus the token count the provider reported for
/// the call. Token counts are informational (trace sinks); 0 when the
/// provider omits usage data.
#[derive(Debug, Clone)]
pub struct Extraction<T> {
    pub value: T,
    pub tokens: u32,
}

impl<T> Extraction<T> {
    pub fn new(value: T, tokens: u32) -> Self {
        Self { value, tokens }
    }
}
