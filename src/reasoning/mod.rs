//! ReasoningProvider — an opaque reasoning backend. This module owns only
//! the trait boundary and a deterministic mock; the live HTTP-backed
//! implementation behind `live-reasoning` is a thin transport shim, not an
//! LLM client (the LLM client itself is out of scope).

pub mod mock;
#[cfg(feature = "live-reasoning")]
pub mod live;

use crate::error::ReasoningError;
use async_trait::async_trait;
use serde_json::Value;

pub use mock::MockReasoningProvider;
#[cfg(feature = "live-reasoning")]
pub use live::LiveReasoningProvider;

/// `Generate(system_prompt, user_prompt) -> JSON-shaped response`.
#[async_trait]
pub trait ReasoningProvider: Send + Sync {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<Value, ReasoningError>;
}
