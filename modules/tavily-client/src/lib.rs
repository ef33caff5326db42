pub mod error;
pub mod types;

pub use error::{Result, TavilyError};
pub use types::TavilyResult;

use std::time::Duration;

use types::{SearchRequest, SearchResponse};

const BASE_URL: &str = "https://api.tavily.com";

pub struct TavilyClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl TavilyClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run an advanced-depth search and return the raw hits.
    pub async fn search(&self, query: &str, max_results: u32) -> Result<Vec<TavilyResult>> {
        let request = SearchRequest {
            api_key: &self.api_key,
            query,
            max_results,
            search_depth: "advanced",
            include_raw_content: true,
        };

        tracing::debug!(query, max_results, "Tavily search");

        let resp = self
            .client
            .post(format!("{}/search", self.base_url))
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TavilyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: SearchResponse = resp.json().await?;
        Ok(parsed.results)
    }
}
