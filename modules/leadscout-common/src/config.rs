use std::env;
use std::time::Duration;

/// Which LLM provider backs text generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    Anthropic,
}

impl LlmProvider {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Some(LlmProvider::OpenAi),
            "anthropic" => Some(LlmProvider::Anthropic),
            _ => None,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "gpt-4o-mini",
            LlmProvider::Anthropic => "claude-3-5-haiku-20241022",
        }
    }
}

/// Process-level configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub anthropic_api_key: String,
    pub tavily_api_key: String,
    pub llm_provider: LlmProvider,
    pub llm_model: String,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        let llm_provider = env::var("LLM_PROVIDER")
            .ok()
            .map(|v| {
                LlmProvider::parse(&v)
                    .unwrap_or_else(|| panic!("LLM_PROVIDER must be 'openai' or 'anthropic', got {v}"))
            })
            .unwrap_or(LlmProvider::OpenAi);

        let llm_model =
            env::var("LLM_MODEL").unwrap_or_else(|_| llm_provider.default_model().to_string());

        // Only the selected provider's key is required.
        let (openai_api_key, anthropic_api_key) = match llm_provider {
            LlmProvider::OpenAi => (
                required_env("OPENAI_API_KEY"),
                env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
            ),
            LlmProvider::Anthropic => (
                env::var("OPENAI_API_KEY").unwrap_or_default(),
                required_env("ANTHROPIC_API_KEY"),
            ),
        };

        Self {
            openai_api_key,
            anthropic_api_key,
            tavily_api_key: required_env("TAVILY_API_KEY"),
            llm_provider,
            llm_model,
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

/// Tunables for one pipeline, fixed at construction. Stages never read
/// ambient process state; everything flows through this struct.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Bound on concurrent per-item provider calls within a stage.
    pub max_concurrency: usize,
    /// Fuzzy-name dedup cutoff. Empirical; exposed rather than hardcoded.
    pub name_similarity_threshold: f64,
    /// Hosts treated as profile/aggregator sites during website resolution.
    pub aggregator_domains: Vec<String>,
    /// Per-call ceiling for every external request. A timeout is handled
    /// like any other provider error for that item.
    pub call_timeout: Duration,
    /// How many context passages to request when building vendor profiles.
    pub context_chunks: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 5,
            name_similarity_threshold: 0.8,
            aggregator_domains: vec![
                "linkedin.com".to_string(),
                "crunchbase.com".to_string(),
                "bloomberg.com".to_string(),
                "facebook.com".to_string(),
                "glassdoor.com".to_string(),
                "indeed.com".to_string(),
                "zoominfo.com".to_string(),
            ],
            call_timeout: Duration::from_secs(30),
            context_chunks: 5,
        }
    }
}

impl PipelineConfig {
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    pub fn with_name_similarity_threshold(mut self, threshold: f64) -> Self {
        self.name_similarity_threshold = threshold;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// True when `host` (already normalized) belongs to an aggregator.
    pub fn is_aggregator_host(&self, host: &str) -> bool {
        self.aggregator_domains
            .iter()
            .any(|agg| host == agg || host.ends_with(&format!(".{agg}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregator_matches_host_and_subdomains() {
        let config = PipelineConfig::default();
        assert!(config.is_aggregator_host("linkedin.com"));
        assert!(config.is_aggregator_host("de.linkedin.com"));
        assert!(!config.is_aggregator_host("lithia.com"));
        assert!(!config.is_aggregator_host("notlinkedin.com"));
    }

    #[test]
    fn concurrency_floor_is_one() {
        let config = PipelineConfig::default().with_max_concurrency(0);
        assert_eq!(config.max_concurrency, 1);
    }

    #[test]
    fn provider_parse() {
        assert_eq!(LlmProvider::parse("OpenAI"), Some(LlmProvider::OpenAi));
        assert_eq!(LlmProvider::parse("anthropic"), Some(LlmProvider::Anthropic));
        assert_eq!(LlmProvider::parse("demo"), None);
    }
}
