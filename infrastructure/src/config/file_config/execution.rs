//! Execution configuration from TOML (`[execution]` section)

use super::ConfigValidationError;
use counsel_application::ExecutionParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Execution configuration from TOML.
///
/// # Example
///
/// ```toml
/// [execution]
/// retry_budget = 2
/// step_timeout_secs = 30
/// model_timeout_secs = 60
/// retrieval_timeout_secs = 15
/// parallel_independent_steps = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExecutionConfig {
    /// Retries after the first attempt of a step
    pub retry_budget: u32,
    pub step_timeout_secs: u64,
    pub model_timeout_secs: u64,
    pub retrieval_timeout_secs: u64,
    /// Run consecutive independent reads concurrently
    pub parallel_independent_steps: bool,
}

impl Default for FileExecutionConfig {
    fn default() -> Self {
        let params = ExecutionParams::default();
        Self {
            retry_budget: params.retry_budget,
            step_timeout_secs: params.step_timeout.as_secs(),
            model_timeout_secs: params.model_timeout.as_secs(),
            retrieval_timeout_secs: params.retrieval_timeout.as_secs(),
            parallel_independent_steps: params.parallel_independent_steps,
        }
    }
}

impl FileExecutionConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        for (field, value) in [
            ("execution.step_timeout_secs", self.step_timeout_secs),
            ("execution.model_timeout_secs", self.model_timeout_secs),
            ("execution.retrieval_timeout_secs", self.retrieval_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigValidationError::ZeroTimeout { field });
            }
        }
        Ok(())
    }

    pub fn to_params(&self) -> ExecutionParams {
        ExecutionParams::default()
            .with_retry_budget(self.retry_budget)
            .with_step_timeout(Duration::from_secs(self.step_timeout_secs))
            .with_model_timeout(Duration::from_secs(self.model_timeout_secs))
            .with_retrieval_timeout(Duration::from_secs(self.retrieval_timeout_secs))
            .with_parallel_independent_steps(self.parallel_independent_steps)
    }
}
