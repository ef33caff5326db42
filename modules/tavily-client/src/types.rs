use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct SearchRequest<'a> {
    pub api_key: &'a str,
    pub query: &'a str,
    pub max_results: u32,
    pub search_depth: &'static str,
    pub include_raw_content: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub results: Vec<TavilyResult>,
}

/// One search hit as Tavily returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct TavilyResult {
    #[serde(default)]
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: f32,
    pub raw_content: Option<String>,
}

impl TavilyResult {
    /// Raw page content when Tavily fetched it, otherwise the snippet.
    pub fn best_content(&self) -> &str {
        match self.raw_content.as_deref() {
            Some(raw) if !raw.is_empty() => raw,
            _ => &self.content,
        }
    }
}
