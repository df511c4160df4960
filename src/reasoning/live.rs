//! HTTP-backed `ReasoningProvider`. This is only the transport edge — an
//! opaque reasoning backend reached over HTTP — it posts the two prompts
//! to a configured endpoint and expects back a JSON body shaped like
//! `{"analysis": ..., "confidence": ..., "key_findings": [...], "recommendations": [...]}`.
//! Parsing/timeout failures degrade to `ReasoningError`, never panic.

use super::ReasoningProvider;
use crate::config::ReasoningConfig;
use crate::error::ReasoningError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub struct LiveReasoningProvider {
    client: Client,
    endpoint: String,
    config: ReasoningConfig,
}

impl LiveReasoningProvider {
    pub fn new(endpoint: impl Into<String>, config: ReasoningConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            endpoint: endpoint.into(),
            config,
        }
    }
}

#[async_trait]
impl ReasoningProvider for LiveReasoningProvider {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<Value, ReasoningError> {
        let body = json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "system_prompt": system_prompt,
            "user_prompt": user_prompt,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReasoningError::Timeout(self.config.timeout_ms)
                } else {
                    ReasoningError::CallFailed(e.to_string())
                }
            })?;

        response
            .json::<Value>()
            .await
            .map_err(|e| ReasoningError::ParseFailure(e.to_string()))
    }
}
