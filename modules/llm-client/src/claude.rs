//! Anthropic messages-API client. Structured extraction is implemented as
//! a forced tool call: the response schema becomes the tool's input schema,
//! so the model cannot reply with anything but the expected shape.

use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Extraction;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Clone)]
pub struct Claude {
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolDefinition<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ToolDefinition<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a serde_json::Value,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    ToolUse {
        input: serde_json::Value,
    },
    // Text and thinking blocks are irrelevant to forced tool calls.
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Default)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

impl Claude {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: ANTHROPIC_API_URL.to_string(),
            timeout: Duration::from_secs(30),
            http: reqwest::Client::new(),
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

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn send(&self, request: &MessagesRequest<'_>) -> Result<MessagesResponse> {
        let url = format!("{}/messages", self.base_url);
        debug!(model = %request.model, "Claude messages request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Anthropic API error ({status}): {body}"));
        }

        Ok(response.json().await?)
    }

    /// Extract a JSON value matching `schema` from the model, forced via
    /// tool choice. Returns the raw value plus total token usage.
    pub async fn extract_value(
        &self,
        system: &str,
        user: &str,
        schema: &serde_json::Value,
    ) -> Result<Extraction<serde_json::Value>> {
        let tool_name = "structured_response";
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: 0.1,
            system,
            messages: vec![WireMessage {
                role: "user",
                content: user,
            }],
            tools: vec![ToolDefinition {
                name: tool_name,
                description: "Record the structured data extracted from the input.",
                input_schema: schema,
            }],
            tool_choice: Some(serde_json::json!({ "type": "tool", "name": tool_name })),
        };

        let response = self.send(&request).await?;
        let tokens = response.usage.input_tokens + response.usage.output_tokens;

        for block in response.content {
            if let ContentBlock::ToolUse { input } = block {
                return Ok(Extraction::new(input, tokens));
            }
        }

        Err(anyhow!("No structured output in Anthropic response"))
    }
}
