//! Deterministic mock backing for `ReasoningProvider`.
//!
//! First-class runtime mode, not a test hook: used directly whenever
//! `ReasoningConfig.mode == Mock`.

use super::ReasoningProvider;
use crate::error::ReasoningError;
use async_trait::async_trait;
use serde_json::{json, Value};

pub struct MockReasoningProvider;

#[async_trait]
impl ReasoningProvider for MockReasoningProvider {
    async fn generate(&self, system_prompt: &str, _user_prompt: &str) -> Result<Value, ReasoningError> {
        Ok(json!({
            "analysis": format!("Deterministic mock analysis for role: {system_prompt}"),
            "confidence": 0.85,
            "key_findings": ["mock-finding-1", "mock-finding-2"],
            "recommendations": ["Continue monitoring"],
        }))
    }
}
