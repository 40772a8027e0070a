//! Deliberation configuration from TOML (`[deliberation]` section)

use super::ConfigValidationError;
use counsel_application::DeliberationParams;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDeliberationConfig {
    /// Upper bound on Research cycles
    pub research_max_cycles: u32,
    /// Evidence confidence at which Research stops early
    pub research_confidence_threshold: f64,
    /// Hits requested per retrieval query
    pub research_top_k: usize,
    /// Retries of a stage's model call
    pub stage_retry_budget: u32,
}

impl Default for FileDeliberationConfig {
    fn default() -> Self {
        let params = DeliberationParams::default();
        Self {
            research_max_cycles: params.research_max_cycles,
            research_confidence_threshold: params.research_confidence_threshold,
            research_top_k: params.research_top_k,
            stage_retry_budget: params.stage_retry_budget,
        }
    }
}

impl FileDeliberationConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.research_max_cycles == 0 {
            return Err(ConfigValidationError::ZeroResearchCycles);
        }
        if self.research_top_k == 0 {
            return Err(ConfigValidationError::ZeroTopK);
        }
        let threshold = self.research_confidence_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigValidationError::InvalidThreshold(threshold));
        }
        Ok(())
    }

    pub fn to_params(&self) -> DeliberationParams {
        DeliberationParams::default()
            .with_research_max_cycles(self.research_max_cycles)
            .with_research_confidence_threshold(self.research_confidence_threshold)
            .with_research_top_k(self.research_top_k)
            .with_stage_retry_budget(self.stage_retry_budget)
    }
}
