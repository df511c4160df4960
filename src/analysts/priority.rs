//! Priority analyst — receives no KnowledgeStore context. Its `analysis`
//! text drives the Coordinator's severity decision via a lowercased
//! substring match, so its system role asks explicitly for a priority word.

use super::{base_prompt, run, Analyst, ReasoningMode};
use crate::models::{AgentFinding, ThreatSignal};

pub struct PriorityAnalyst {
    mode: ReasoningMode,
}

impl PriorityAnalyst {
    pub fn new(mode: ReasoningMode) -> Self {
        Self { mode }
    }

    pub async fn analyze(&self, signal: &ThreatSignal) -> AgentFinding {
        let prompt = base_prompt(signal, "assign an overall priority: critical, high, medium, or low");
        run(
            self.name(),
            &self.mode,
            "You are a triage analyst. State the signal's overall priority explicitly as one of: critical, high, medium, low.",
            &prompt,
        )
        .await
    }
}

impl Analyst for PriorityAnalyst {
    fn name(&self) -> &'static str {
        "priority"
    }
}
