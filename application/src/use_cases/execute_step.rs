//! Step Executor
//!
//! Invokes one named tool with resolved parameters and applies the per-step
//! retry policy. Every invocation is bounded by the step timeout; a timeout
//! is an upstream failure eligible for retry like any other.
//!
//! The executor never mutates the plan. It returns a [`StepExecution`]
//! which the [`PlanRunner`](super::execute_plan::PlanRunner) applies.

use crate::config::ExecutionParams;
use crate::ports::audit_logger::{AuditEvent, AuditLogger, NoAuditLogger};
use crate::ports::event_sink::EventSink;
use crate::ports::tool_executor::ToolExecutorPort;
use crate::use_cases::shared::{Bounded, bounded, is_cancelled};
use counsel_domain::{
    DependencyResolver, OrchestrationEvent, Plan, ResolutionError, RetryDecision, RetryPolicy,
    SideEffectClass, StepId, StopReason, TenantId, ToolCall, ToolError,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How a step's execution ended
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Completed(Value),
    Failed { error: ToolError, stop: StopReason },
    /// A parameter referenced a step whose result is unavailable: a planning bug.
    Unresolvable(ResolutionError),
    Cancelled,
}

/// Result of running one step to a terminal outcome
#[derive(Debug, Clone, PartialEq)]
pub struct StepExecution {
    pub step: StepId,
    /// Tool invocations made (0 when the step never reached the tool)
    pub attempts: u32,
    pub outcome: StepOutcome,
}

pub struct StepExecutor<T: ToolExecutorPort + ?Sized> {
    tools: Arc<T>,
    policy: RetryPolicy,
    step_timeout: Duration,
    audit: Arc<dyn AuditLogger>,
}

impl<T: ToolExecutorPort + ?Sized> StepExecutor<T> {
    pub fn new(tools: Arc<T>, params: &ExecutionParams) -> Self {
        Self {
            tools,
            policy: params.retry_policy(),
            step_timeout: params.step_timeout,
            audit: Arc::new(NoAuditLogger),
        }
    }

    pub fn with_audit_logger(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.audit = audit;
        self
    }

    pub fn side_effect_of(&self, tool: &str) -> Option<SideEffectClass> {
        self.tools.get_tool(tool).map(|t| t.side_effect)
    }

    /// Run step `id` of `plan` until it completes or the retry policy stops it.
    ///
    /// Parameters are re-resolved from the plan before every attempt.
    pub async fn execute(
        &self,
        tenant: &TenantId,
        plan: &Plan,
        id: StepId,
        events: &dyn EventSink,
        token: &Option<CancellationToken>,
    ) -> StepExecution {
        let done = |attempts, outcome| StepExecution {
            step: id,
            attempts,
            outcome,
        };

        let Some(step) = plan.step(id) else {
            return done(
                0,
                StepOutcome::Failed {
                    error: ToolError::not_found(format!("step {}", id)),
                    stop: StopReason::NotFoundFinal,
                },
            );
        };

        let Some(side_effect) = self.side_effect_of(&step.tool_name) else {
            warn!(step = %id, tool = %step.tool_name, "Unknown tool in plan");
            return done(
                0,
                StepOutcome::Failed {
                    error: ToolError::not_found(format!("tool '{}'", step.tool_name)),
                    stop: StopReason::NotFoundFinal,
                },
            );
        };
        let has_dependencies = step.has_dependencies();

        let mut attempts = 0;
        loop {
            if is_cancelled(token) {
                return done(attempts, StepOutcome::Cancelled);
            }

            let arguments = match DependencyResolver::resolve_step(step, &plan.steps) {
                Ok(arguments) => arguments,
                Err(e) => {
                    warn!(step = %id, error = %e, "Step parameters could not be resolved");
                    return done(attempts, StepOutcome::Unresolvable(e));
                }
            };

            attempts += 1;
            info!(
                tenant = %tenant,
                step = %id,
                tool = %step.tool_name,
                attempt = attempts,
                "Executing step"
            );
            events.emit(OrchestrationEvent::StepStart {
                step_id: id.ordinal(),
                tool: step.tool_name.clone(),
                attempt: attempts,
            });
            self.audit.log(AuditEvent::new(
                "step_started",
                json!({
                    "tenant": tenant,
                    "step": id.ordinal(),
                    "tool": step.tool_name,
                    "attempt": attempts,
                }),
            ));

            let call = ToolCall::new(&step.tool_name).with_arguments(arguments);
            let result = match bounded(self.tools.execute(tenant, &call), self.step_timeout, token)
                .await
            {
                Bounded::Done(result) => result,
                Bounded::TimedOut => Err(ToolError::timeout(
                    &step.tool_name,
                    self.step_timeout.as_millis() as u64,
                )),
                Bounded::Cancelled => return done(attempts, StepOutcome::Cancelled),
            };

            let error = match result {
                Ok(value) => {
                    debug!(step = %id, attempt = attempts, "Step completed");
                    self.audit.log(AuditEvent::new(
                        "step_completed",
                        json!({
                            "tenant": tenant,
                            "step": id.ordinal(),
                            "tool": step.tool_name,
                            "attempts": attempts,
                        }),
                    ));
                    return done(attempts, StepOutcome::Completed(value));
                }
                Err(error) => error,
            };

            if error.is_security_event() {
                self.audit.log(AuditEvent::new(
                    "security_event",
                    json!({
                        "tenant": tenant,
                        "step": id.ordinal(),
                        "tool": step.tool_name,
                        "error": error.to_string(),
                    }),
                ));
            }

            match self
                .policy
                .decide(&error, side_effect, attempts, has_dependencies)
            {
                RetryDecision::Retry => {
                    warn!(
                        step = %id,
                        tool = %step.tool_name,
                        attempt = attempts,
                        error = %error,
                        "Step failed, retrying"
                    );
                }
                RetryDecision::Stop(stop) => {
                    warn!(
                        step = %id,
                        tool = %step.tool_name,
                        attempts,
                        error = %error,
                        reason = stop.as_str(),
                        "Step failed"
                    );
                    self.audit.log(AuditEvent::new(
                        "step_failed",
                        json!({
                            "tenant": tenant,
                            "step": id.ordinal(),
                            "tool": step.tool_name,
                            "attempts": attempts,
                            "error": error,
                            "reason": stop.as_str(),
                        }),
                    ));
                    return done(attempts, StepOutcome::Failed { error, stop });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{
        RecordingAuditLogger, RecordingEventSink, RecordingToolExecutor,
    };
    use counsel_domain::{ParamValue, Step, ToolParameter};

    fn tools() -> Vec<counsel_domain::ToolDescriptor> {
        vec![
            counsel_domain::ToolDescriptor::new(
                "insert_clients",
                "Create a client",
                SideEffectClass::Write,
            )
            .with_parameter(ToolParameter::new("name", "Client name", true)),
            counsel_domain::ToolDescriptor::new("query_cases", "Find cases", SideEffectClass::Read),
        ]
    }

    fn single(tool: &str) -> Plan {
        Plan::single("test", Step::new(tool).with_literal("name", "X"))
    }

    fn executor(mock: RecordingToolExecutor) -> (Arc<RecordingToolExecutor>, StepExecutor<RecordingToolExecutor>) {
        let mock = Arc::new(mock);
        let executor = StepExecutor::new(mock.clone(), &ExecutionParams::default());
        (mock, executor)
    }

    #[tokio::test]
    async fn test_transient_write_failure_then_success() {
        let (mock, executor) = executor(RecordingToolExecutor::new(tools()).script(
            "insert_clients",
            vec![Err(ToolError::transient("db busy")), Ok(json!({"id": "c-1"}))],
        ));
        let events = RecordingEventSink::new();
        let plan = single("insert_clients");

        let execution = executor
            .execute(&TenantId::new("t1"), &plan, StepId::new(0), &events, &None)
            .await;

        assert_eq!(execution.attempts, 2);
        assert_eq!(execution.outcome, StepOutcome::Completed(json!({"id": "c-1"})));
        assert_eq!(mock.calls().len(), 2);
        assert_eq!(events.count("STEP_START"), 2);
    }

    #[tokio::test]
    async fn test_validation_error_not_retried() {
        let (mock, executor) = executor(
            RecordingToolExecutor::new(tools())
                .script("insert_clients", vec![Err(ToolError::validation("name is required"))]),
        );
        let plan = single("insert_clients");

        let execution = executor
            .execute(&TenantId::new("t1"), &plan, StepId::new(0), &RecordingEventSink::new(), &None)
            .await;

        assert_eq!(execution.attempts, 1);
        assert!(matches!(
            execution.outcome,
            StepOutcome::Failed { stop: StopReason::NotRetryable, .. }
        ));
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_non_transient_write_failure_not_retried() {
        let (_, executor) = executor(
            RecordingToolExecutor::new(tools())
                .script("insert_clients", vec![Err(ToolError::upstream("constraint violated"))]),
        );
        let execution = executor
            .execute(
                &TenantId::new("t1"),
                &single("insert_clients"),
                StepId::new(0),
                &RecordingEventSink::new(),
                &None,
            )
            .await;
        assert_eq!(execution.attempts, 1);
        assert!(matches!(
            execution.outcome,
            StepOutcome::Failed { stop: StopReason::UnsafeWrite, .. }
        ));
    }

    #[tokio::test]
    async fn test_read_retried_up_to_budget() {
        let failures = (0..5).map(|_| Err(ToolError::upstream("index error"))).collect();
        let (mock, executor) =
            executor(RecordingToolExecutor::new(tools()).script("query_cases", failures));

        let execution = executor
            .execute(
                &TenantId::new("t1"),
                &single("query_cases"),
                StepId::new(0),
                &RecordingEventSink::new(),
                &None,
            )
            .await;

        assert_eq!(execution.attempts, 3);
        assert_eq!(mock.calls().len(), 3);
        assert!(matches!(
            execution.outcome,
            StepOutcome::Failed { stop: StopReason::BudgetExhausted, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_retried_then_reported() {
        let (mock, executor) = executor(
            RecordingToolExecutor::new(tools())
                .with_delay("query_cases", Duration::from_secs(120)),
        );

        let execution = executor
            .execute(
                &TenantId::new("t1"),
                &single("query_cases"),
                StepId::new(0),
                &RecordingEventSink::new(),
                &None,
            )
            .await;

        assert_eq!(execution.attempts, 3);
        assert_eq!(mock.calls().len(), 3);
        match execution.outcome {
            StepOutcome::Failed { error, .. } => assert_eq!(error.code(), "TIMEOUT"),
            other => panic!("expected timeout failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_rejected_before_execution() {
        let (mock, executor) = executor(RecordingToolExecutor::new(tools()));
        let execution = executor
            .execute(
                &TenantId::new("t1"),
                &single("launch_rockets"),
                StepId::new(0),
                &RecordingEventSink::new(),
                &None,
            )
            .await;

        assert_eq!(execution.attempts, 0);
        assert!(mock.calls().is_empty());
        match execution.outcome {
            StepOutcome::Failed { error, .. } => assert_eq!(error.code(), "NOT_FOUND"),
            other => panic!("expected not found, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_permission_error_audited_as_security_event() {
        let audit = Arc::new(RecordingAuditLogger::new());
        let mock = Arc::new(
            RecordingToolExecutor::new(tools())
                .script("query_cases", vec![Err(ToolError::permission("tenant_id is implicit"))]),
        );
        let executor = StepExecutor::new(mock.clone(), &ExecutionParams::default())
            .with_audit_logger(audit.clone());

        let execution = executor
            .execute(
                &TenantId::new("t1"),
                &single("query_cases"),
                StepId::new(0),
                &RecordingEventSink::new(),
                &None,
            )
            .await;

        assert_eq!(execution.attempts, 1);
        assert_eq!(
            audit.event_types(),
            vec!["step_started", "security_event", "step_failed"]
        );
    }

    #[tokio::test]
    async fn test_not_found_on_dependent_step_retried_once() {
        let (mock, executor) = executor(
            RecordingToolExecutor::new(tools())
                .script("query_cases", vec![
                    Err(ToolError::not_found("client c-1")),
                    Err(ToolError::not_found("client c-1")),
                ]),
        );
        let mut plan = Plan::new(
            "find",
            vec![
                Step::new("insert_clients").with_literal("name", "X"),
                Step::new("query_cases").with_param("client_id", ParamValue::step_result(StepId::new(0))),
            ],
        )
        .unwrap();
        plan.steps[0].mark_completed(json!({"id": "c-1"}), "ok").unwrap();

        let execution = executor
            .execute(&TenantId::new("t1"), &plan, StepId::new(1), &RecordingEventSink::new(), &None)
            .await;

        assert_eq!(execution.attempts, 2);
        assert_eq!(mock.calls_to("query_cases")[0].get_str("client_id"), Some("c-1"));
        assert!(matches!(
            execution.outcome,
            StepOutcome::Failed { stop: StopReason::NotFoundFinal, .. }
        ));
    }

    #[tokio::test]
    async fn test_cancelled_before_first_attempt() {
        let (mock, executor) = executor(RecordingToolExecutor::new(tools()));
        let token = CancellationToken::new();
        token.cancel();

        let execution = executor
            .execute(
                &TenantId::new("t1"),
                &single("query_cases"),
                StepId::new(0),
                &RecordingEventSink::new(),
                &Some(token),
            )
            .await;

        assert_eq!(execution.outcome, StepOutcome::Cancelled);
        assert_eq!(execution.attempts, 0);
        assert!(mock.calls().is_empty());
    }
}
