//! Threat Signal Coordinator
//!
//! Fans a `ThreatSignal` out to five specialist analysts, scores it for
//! false-positive likelihood, plans a response, and reconstructs an
//! investigation timeline — all behind one `Coordinator::analyze` call and
//! published to every replica via `SharedStore`.

pub mod analysts;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod fp_analyzer;
pub mod knowledge;
pub mod mitre;
pub mod models;
pub mod reasoning;
pub mod response_engine;
pub mod store;
pub mod timeline_builder;

#[cfg(feature = "server")]
pub mod web;

pub use config::CoordinatorSettings;
pub use coordinator::Coordinator;
pub use error::{CoordinatorError, KnowledgeError, ReasoningError, StoreError};
pub use knowledge::{InMemoryKnowledgeStore, KnowledgeStore};
pub use models::{EnhancedAnalysisRecord, ThreatSignal, ThreatType};
pub use store::{InProcessStore, SharedStore};

#[cfg(feature = "redis-store")]
pub use store::RedisStore;
