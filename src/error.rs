//! Error taxonomy for the coordinator and its collaborators.
//!
//! Analyst failures are deliberately not represented here — they recover
//! locally into a sentinel finding and never reach the caller as an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("invalid signal: {0}")]
    InvalidSignal(String),

    #[error("context unavailable: all knowledge-store lookups failed")]
    ContextUnavailable,

    #[error("persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("request timeout after {0}ms")]
    Timeout(u64),

    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("publish failed after save: {0}")]
    PublishFailed(String),
}

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("lookup failed: {0}")]
    LookupFailed(String),
}

#[derive(Debug, Error)]
pub enum ReasoningError {
    #[error("provider call failed: {0}")]
    CallFailed(String),

    #[error("response parse failure: {0}")]
    ParseFailure(String),

    #[error("timeout after {0}ms")]
    Timeout(u64),
}
