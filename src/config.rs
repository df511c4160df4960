//! Threat Signal Coordinator - Configuration Management
//!
//! Process-level configuration. Everything is plain serde-(de)serializable
//! so it can be loaded from a TOML file or overridden piecemeal in tests.

use serde::{Deserialize, Serialize};

/// Top-level configuration for one coordinator process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorSettings {
    pub reasoning: ReasoningConfig,
    pub coordinator: CoordinatorTimeouts,
    pub store: StoreConfig,
}

impl CoordinatorSettings {
    /// Defaults appropriate for `mode = mock` (fast, deterministic, used in
    /// load testing as well as ordinary unit tests).
    pub fn mock_defaults() -> Self {
        Self {
            reasoning: ReasoningConfig {
                mode: ReasoningMode::Mock,
                ..ReasoningConfig::default()
            },
            coordinator: CoordinatorTimeouts {
                analyst_timeout_ms: 1_000,
                total_timeout_ms: 5_000,
            },
            store: StoreConfig::default(),
        }
    }

    /// Defaults appropriate for `mode = live`.
    pub fn live_defaults() -> Self {
        Self {
            reasoning: ReasoningConfig {
                mode: ReasoningMode::Live,
                ..ReasoningConfig::default()
            },
            coordinator: CoordinatorTimeouts {
                analyst_timeout_ms: 10_000,
                total_timeout_ms: 30_000,
            },
            store: StoreConfig::default(),
        }
    }
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self::mock_defaults()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningMode {
    Live,
    Mock,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningConfig {
    pub mode: ReasoningMode,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_ms: u64,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            mode: ReasoningMode::Mock,
            model: "reasoning-provider-default".to_string(),
            temperature: 0.2,
            max_tokens: 1024,
            timeout_ms: 8_000,
        }
    }
}

/// Per-analyst and total request deadlines.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CoordinatorTimeouts {
    pub analyst_timeout_ms: u64,
    pub total_timeout_ms: u64,
}

impl Default for CoordinatorTimeouts {
    fn default() -> Self {
        Self {
            analyst_timeout_ms: 1_000,
            total_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBacking {
    InProcess,
    Redis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backing: StoreBacking,
    /// Used only when `backing == Redis`.
    pub broker_url: Option<String>,
    pub recent_limit: usize,
    pub subscriber_buffer: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backing: StoreBacking::InProcess,
            broker_url: None,
            recent_limit: 200,
            subscriber_buffer: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_defaults_match_spec() {
        let cfg = CoordinatorSettings::mock_defaults();
        assert_eq!(cfg.coordinator.analyst_timeout_ms, 1_000);
        assert_eq!(cfg.coordinator.total_timeout_ms, 5_000);
        assert_eq!(cfg.reasoning.mode, ReasoningMode::Mock);
    }

    #[test]
    fn live_defaults_match_spec() {
        let cfg = CoordinatorSettings::live_defaults();
        assert_eq!(cfg.coordinator.analyst_timeout_ms, 10_000);
        assert_eq!(cfg.coordinator.total_timeout_ms, 30_000);
        assert_eq!(cfg.reasoning.mode, ReasoningMode::Live);
    }
}
