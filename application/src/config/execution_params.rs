//! Execution parameters: step loop control.
//!
//! [`ExecutionParams`] groups the static parameters that control plan
//! execution in [`PlanRunner`](crate::use_cases::execute_plan::PlanRunner)
//! and the request loop in
//! [`RunRequestUseCase`](crate::use_cases::run_request::RunRequestUseCase).
//! These are application-layer concerns, not domain policy.

use counsel_domain::RetryPolicy;
use counsel_domain::tool::retry::DEFAULT_RETRY_BUDGET;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Execution loop control parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionParams {
    /// Retries allowed per step after the first attempt.
    pub retry_budget: u32,
    /// Upper bound for a single tool call.
    pub step_timeout: Duration,
    /// Upper bound for a single model call.
    pub model_timeout: Duration,
    /// Upper bound for a single retrieval call.
    pub retrieval_timeout: Duration,
    /// Run consecutive independent read steps concurrently.
    pub parallel_independent_steps: bool,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            retry_budget: DEFAULT_RETRY_BUDGET,
            step_timeout: Duration::from_secs(30),
            model_timeout: Duration::from_secs(60),
            retrieval_timeout: Duration::from_secs(15),
            parallel_independent_steps: false,
        }
    }
}

impl ExecutionParams {
    // ==================== Builder Methods ====================

    pub fn with_retry_budget(mut self, budget: u32) -> Self {
        self.retry_budget = budget;
        self
    }

    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = timeout;
        self
    }

    pub fn with_retrieval_timeout(mut self, timeout: Duration) -> Self {
        self.retrieval_timeout = timeout;
        self
    }

    pub fn with_parallel_independent_steps(mut self, enabled: bool) -> Self {
        self.parallel_independent_steps = enabled;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_budget)
    }
}
