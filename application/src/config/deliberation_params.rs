//! Deliberation parameters: research loop and stage retry control.

use serde::{Deserialize, Serialize};

/// Controls the Research cycle and upstream retries in every stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliberationParams {
    /// Maximum retrieval cycles before Research gives up and proceeds.
    pub research_max_cycles: u32,
    /// Evidence confidence at which Research stops early.
    pub research_confidence_threshold: f64,
    /// Results requested per retrieval call.
    pub research_top_k: usize,
    /// Retries allowed for a failing model or retrieval call within a stage.
    pub stage_retry_budget: u32,
}

impl Default for DeliberationParams {
    fn default() -> Self {
        Self {
            research_max_cycles: 10,
            research_confidence_threshold: 0.75,
            research_top_k: 5,
            stage_retry_budget: 2,
        }
    }
}

impl DeliberationParams {
    pub fn with_research_max_cycles(mut self, cycles: u32) -> Self {
        self.research_max_cycles = cycles.max(1);
        self
    }

    pub fn with_research_confidence_threshold(mut self, threshold: f64) -> Self {
        self.research_confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_research_top_k(mut self, top_k: usize) -> Self {
        self.research_top_k = top_k.max(1);
        self
    }

    pub fn with_stage_retry_budget(mut self, budget: u32) -> Self {
        self.stage_retry_budget = budget;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = DeliberationParams::default();
        assert_eq!(params.research_max_cycles, 10);
        assert_eq!(params.research_confidence_threshold, 0.75);
        assert_eq!(params.research_top_k, 5);
        assert_eq!(params.stage_retry_budget, 2);
    }

    #[test]
    fn test_builder_clamps() {
        let params = DeliberationParams::default()
            .with_research_max_cycles(0)
            .with_research_confidence_threshold(1.5)
            .with_research_top_k(0);
        assert_eq!(params.research_max_cycles, 1);
        assert_eq!(params.research_confidence_threshold, 1.0);
        assert_eq!(params.research_top_k, 1);
    }
}
