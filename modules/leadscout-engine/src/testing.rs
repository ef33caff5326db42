//! In-memory doubles for the capability traits. Compiled for unit tests
//! and, behind the `test-support` feature, for integration tests.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use leadscout_common::SearchHit;

use crate::traits::{ContextRetrieval, GenerationOutput, TextGeneration, WebSearch};

/// Scripted [`TextGeneration`]: responses are consumed front-to-back, one
/// per call, regardless of prompt. Running out of script is an error so a
/// test that makes more calls than expected fails loudly.
#[derive(Default)]
pub struct MockTextGeneration {
    script: Mutex<VecDeque<Result<serde_json::Value, String>>>,
    user_prompts: Mutex<Vec<String>>,
    calls: Mutex<usize>,
}

impl MockTextGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful structured response.
    pub fn push(&self, value: serde_json::Value) {
        self.script.lock().unwrap().push_back(Ok(value));
    }

    /// Queue a transport-level failure.
    pub fn push_error(&self, message: &str) {
        self.script.lock().unwrap().push_back(Err(message.to_string()));
    }

    /// Total calls made so far.
    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    /// User prompts in call order.
    pub fn user_prompts(&self) -> Vec<String> {
        self.user_prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGeneration for MockTextGeneration {
    async fn generate_json(
        &self,
        _system: &str,
        user: &str,
        _schema: &serde_json::Value,
    ) -> Result<GenerationOutput> {
        *self.calls.lock().unwrap() += 1;
        self.user_prompts.lock().unwrap().push(user.to_string());

        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("mock text generation exhausted"))?;
        match next {
            Ok(value) => Ok(GenerationOutput { value, tokens: 42 }),
            Err(message) => Err(anyhow!(message)),
        }
    }
}

/// Scripted [`WebSearch`] keyed by exact query string. Unknown queries are
/// an error, same rationale as the exhausted text-generation script.
#[derive(Default)]
pub struct MockWebSearch {
    responses: Mutex<HashMap<String, Result<Vec<SearchHit>, String>>>,
}

impl MockWebSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, query: &str, hits: Vec<SearchHit>) {
        self.responses
            .lock()
            .unwrap()
            .insert(query.to_string(), Ok(hits));
    }

    pub fn fail(&self, query: &str, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(query.to_string(), Err(message.to_string()));
    }
}

#[async_trait]
impl WebSearch for MockWebSearch {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>> {
        let scripted = self
            .responses
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .ok_or_else(|| anyhow!("no scripted response for query {query:?}"))?;
        match scripted {
            Ok(mut hits) => {
                hits.truncate(max_results as usize);
                for hit in &mut hits {
                    hit.query = query.to_string();
                }
                Ok(hits)
            }
            Err(message) => Err(anyhow!(message)),
        }
    }
}

/// [`ContextRetrieval`] that returns the same blob for every topic, or
/// fails every call.
pub struct MockContextRetrieval {
    result: Result<String, String>,
}

impl MockContextRetrieval {
    pub fn new(text: &str) -> Self {
        Self {
            result: Ok(text.to_string()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
        }
    }
}

#[async_trait]
impl ContextRetrieval for MockContextRetrieval {
    async fn retrieve(&self, _topic: &str, _k: usize) -> Result<String> {
        match &self.result {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(anyhow!(message.clone())),
        }
    }
}

/// Search-hit fixture with sensible defaults.
pub fn hit(title: &str, url: &str, content: &str) -> SearchHit {
    SearchHit {
        title: title.to_string(),
        url: url.to_string(),
        content: content.to_string(),
        relevance_score: 0.9,
        query: "test query".to_string(),
    }
}
