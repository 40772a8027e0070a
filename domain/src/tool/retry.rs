//! Per-step retry policy.
//!
//! The caller, not the tool, decides whether a retry is safe. Total
//! invocations of one step never exceed `1 + budget`.

use super::entities::SideEffectClass;
use super::value_objects::{ErrorKind, ToolError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_RETRY_BUDGET: u32 = 2;

/// Why a failed attempt is not retried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The error kind is never retried (validation, permission)
    NotRetryable,
    /// Retrying a write on a non-transient failure could apply it twice
    UnsafeWrite,
    /// NotFound on a step with no dependency, or already retried once
    NotFoundFinal,
    BudgetExhausted,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::NotRetryable => "not retryable",
            StopReason::UnsafeWrite => "write not safe to retry",
            StopReason::NotFoundFinal => "not found",
            StopReason::BudgetExhausted => "retry budget exhausted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    Stop(StopReason),
}

impl RetryDecision {
    pub fn should_retry(&self) -> bool {
        matches!(self, RetryDecision::Retry)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    pub budget: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            budget: DEFAULT_RETRY_BUDGET,
        }
    }
}

impl RetryPolicy {
    pub fn new(budget: u32) -> Self {
        Self { budget }
    }

    pub fn max_attempts(&self) -> u32 {
        self.budget + 1
    }

    /// Decide whether to retry after `attempts` invocations have failed,
    /// the last one with `error`.
    pub fn decide(
        &self,
        error: &ToolError,
        side_effect: SideEffectClass,
        attempts: u32,
        has_dependencies: bool,
    ) -> RetryDecision {
        let decision = match error.kind() {
            ErrorKind::Validation | ErrorKind::Permission => {
                RetryDecision::Stop(StopReason::NotRetryable)
            }
            ErrorKind::NotFound if has_dependencies && attempts == 1 => RetryDecision::Retry,
            ErrorKind::NotFound => RetryDecision::Stop(StopReason::NotFoundFinal),
            ErrorKind::Timeout => RetryDecision::Retry,
            ErrorKind::Upstream if error.is_transient() => RetryDecision::Retry,
            ErrorKind::Upstream if side_effect.is_write() => {
                RetryDecision::Stop(StopReason::UnsafeWrite)
            }
            ErrorKind::Upstream => RetryDecision::Retry,
        };

        if decision.should_retry() && attempts >= self.max_attempts() {
            return RetryDecision::Stop(StopReason::BudgetExhausted);
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SideEffectClass::{Read, Write};

    #[test]
    fn test_validation_and_permission_never_retried() {
        let policy = RetryPolicy::default();
        for error in [ToolError::validation("x"), ToolError::permission("x")] {
            for side_effect in [Read, Write] {
                assert_eq!(
                    policy.decide(&error, side_effect, 1, true),
                    RetryDecision::Stop(StopReason::NotRetryable)
                );
            }
        }
    }

    #[test]
    fn test_transient_write_retried_until_budget() {
        let policy = RetryPolicy::default();
        let error = ToolError::transient("503");
        assert!(policy.decide(&error, Write, 1, false).should_retry());
        assert!(policy.decide(&error, Write, 2, false).should_retry());
        assert_eq!(
            policy.decide(&error, Write, 3, false),
            RetryDecision::Stop(StopReason::BudgetExhausted)
        );
    }

    #[test]
    fn test_permanent_upstream_only_retried_for_reads() {
        let policy = RetryPolicy::default();
        let error = ToolError::upstream("bad response");
        assert!(policy.decide(&error, Read, 1, false).should_retry());
        assert_eq!(
            policy.decide(&error, Write, 1, false),
            RetryDecision::Stop(StopReason::UnsafeWrite)
        );
    }

    #[test]
    fn test_timeout_is_transient() {
        let policy = RetryPolicy::default();
        assert!(
            policy
                .decide(&ToolError::timeout("q", 5), Write, 1, false)
                .should_retry()
        );
    }

    #[test]
    fn test_not_found_retried_once_with_dependencies() {
        let policy = RetryPolicy::default();
        let error = ToolError::not_found("client");
        assert!(policy.decide(&error, Read, 1, true).should_retry());
        assert!(!policy.decide(&error, Read, 2, true).should_retry());
        assert!(!policy.decide(&error, Read, 1, false).should_retry());
    }

    #[test]
    fn test_zero_budget_never_retries() {
        let policy = RetryPolicy::new(0);
        assert_eq!(policy.max_attempts(), 1);
        assert!(
            !policy
                .decide(&ToolError::transient("x"), Read, 1, false)
                .should_retry()
        );
    }
}
