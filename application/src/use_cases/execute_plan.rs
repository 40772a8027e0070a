//! Plan Runner: the EXECUTE phase.
//!
//! Steps run strictly in declared order. A failed step fails its
//! (transitive) dependents; independent siblings still run. A step whose
//! parameters cannot be resolved is a planning bug and aborts the plan.
//!
//! With `parallel_independent_steps` enabled, runs of consecutive read
//! steps that only depend on already-finished steps are executed
//! concurrently with `join_all`. Writes always run alone.

use crate::config::ExecutionParams;
use crate::ports::audit_logger::AuditLogger;
use crate::ports::event_sink::EventSink;
use crate::ports::tool_executor::ToolExecutorPort;
use crate::use_cases::execute_step::{StepExecution, StepExecutor, StepOutcome};
use crate::use_cases::shared::is_cancelled;
use counsel_domain::{
    OrchestrationEvent, Plan, PlanStatus, ResolutionError, SideEffectClass, StepId, TenantId,
};
use futures::future::join_all;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// How a plan run ended
#[derive(Debug, Clone, PartialEq)]
pub enum PlanRunOutcome {
    Completed,
    /// Some steps failed; the rest ran to completion where possible.
    Failed { failed: Vec<StepId> },
    /// Unresolvable parameters stopped the plan.
    Aborted(ResolutionError),
    Cancelled,
}

impl PlanRunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PlanRunOutcome::Completed)
    }
}

pub struct PlanRunner<T: ToolExecutorPort + ?Sized> {
    executor: StepExecutor<T>,
    parallel_reads: bool,
}

impl<T: ToolExecutorPort + ?Sized> PlanRunner<T> {
    pub fn new(tools: Arc<T>, params: &ExecutionParams) -> Self {
        Self {
            executor: StepExecutor::new(tools, params),
            parallel_reads: params.parallel_independent_steps,
        }
    }

    pub fn with_audit_logger(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.executor = self.executor.with_audit_logger(audit);
        self
    }

    /// Run `plan` to completion or failure, mutating step statuses in place.
    pub async fn run(
        &self,
        tenant: &TenantId,
        plan: &mut Plan,
        events: &dyn EventSink,
        token: &Option<CancellationToken>,
    ) -> PlanRunOutcome {
        plan.start();
        info!(plan = %plan.id, steps = plan.steps.len(), "Executing plan");

        let mut index = 0;
        while index < plan.steps.len() {
            // already failed because an earlier dependency failed
            if plan.steps[index].status.is_terminal() {
                index += 1;
                continue;
            }
            if is_cancelled(token) {
                return self.stop(plan, PlanRunOutcome::Cancelled, events);
            }

            let batch = self.next_batch(plan, index);
            plan.current_step_index = index;
            for id in &batch {
                if let Some(step) = plan.step_mut(*id) {
                    step.mark_in_progress();
                }
            }

            let executions = if batch.len() == 1 {
                vec![
                    self.executor
                        .execute(tenant, plan, batch[0], events, token)
                        .await,
                ]
            } else {
                let shared: &Plan = plan;
                join_all(
                    batch
                        .iter()
                        .map(|id| self.executor.execute(tenant, shared, *id, events, token)),
                )
                .await
            };

            let mut halt = None;
            for execution in executions {
                if let Some(outcome) = Self::apply(plan, execution, events) {
                    halt.get_or_insert(outcome);
                }
            }
            if let Some(outcome) = halt {
                return self.stop(plan, outcome, events);
            }

            index = batch.last().map(|id| id.index() + 1).unwrap_or(index + 1);
        }

        match plan.finish() {
            PlanStatus::Completed => {
                info!(plan = %plan.id, "Plan completed");
                events.emit(OrchestrationEvent::PlanCompleted {
                    plan_id: plan.id.clone(),
                });
                PlanRunOutcome::Completed
            }
            _ => {
                let failed: Vec<StepId> = plan.failed_steps().map(|s| s.id).collect();
                warn!(plan = %plan.id, failed = failed.len(), "Plan failed");
                events.emit(OrchestrationEvent::PlanFailed {
                    plan_id: plan.id.clone(),
                    failed_steps: failed.iter().map(|id| id.ordinal()).collect(),
                });
                PlanRunOutcome::Failed { failed }
            }
        }
    }

    /// Steps to run next, starting at `start`.
    fn next_batch(&self, plan: &Plan, start: usize) -> Vec<StepId> {
        let first = StepId::new(start);
        if !self.parallel_reads {
            return vec![first];
        }

        let batch: Vec<StepId> = plan
            .steps
            .iter()
            .skip(start)
            .take_while(|step| {
                !step.status.is_terminal()
                    && self.executor.side_effect_of(&step.tool_name) == Some(SideEffectClass::Read)
                    && step.dependencies().iter().all(|d| d.index() < start)
            })
            .map(|step| step.id)
            .collect();

        if batch.is_empty() { vec![first] } else { batch }
    }

    /// Record an execution on the plan. Returns an outcome when the plan must stop.
    fn apply(
        plan: &mut Plan,
        execution: StepExecution,
        events: &dyn EventSink,
    ) -> Option<PlanRunOutcome> {
        let id = execution.step;
        let step = plan.step_mut(id)?;
        step.attempt_count = execution.attempts;

        match execution.outcome {
            StepOutcome::Completed(value) => {
                let message = format!("{} completed", step.tool_name);
                if let Err(e) = step.mark_completed(value.clone(), message.clone()) {
                    warn!(step = %id, error = %e, "Ignoring second result for step");
                    return None;
                }
                events.emit(OrchestrationEvent::StepComplete {
                    step_id: id.ordinal(),
                    result: value,
                    message,
                    attempts: execution.attempts,
                });
                None
            }
            StepOutcome::Failed { error, stop } => {
                let message = format!("{} ({})", error, stop.as_str());
                step.mark_failed(message.clone());
                events.emit(OrchestrationEvent::StepFailed {
                    step_id: id.ordinal(),
                    error: message,
                    attempts: execution.attempts,
                });
                for blocked in plan.fail_dependents(id) {
                    events.emit(OrchestrationEvent::StepFailed {
                        step_id: blocked.ordinal(),
                        error: format!("blocked: depends on failed step {}", id),
                        attempts: 0,
                    });
                }
                None
            }
            StepOutcome::Unresolvable(error) => {
                step.mark_failed(error.to_string());
                events.emit(OrchestrationEvent::StepFailed {
                    step_id: id.ordinal(),
                    error: error.to_string(),
                    attempts: execution.attempts,
                });
                Some(PlanRunOutcome::Aborted(error))
            }
            StepOutcome::Cancelled => {
                step.mark_failed("cancelled");
                Some(PlanRunOutcome::Cancelled)
            }
        }
    }

    /// Abort everything not yet finished and close the plan as failed.
    fn stop(&self, plan: &mut Plan, outcome: PlanRunOutcome, events: &dyn EventSink) -> PlanRunOutcome {
        let reason = match &outcome {
            PlanRunOutcome::Cancelled => "cancelled",
            _ => "planning error",
        };
        plan.abort_remaining(reason);
        plan.finish();
        warn!(plan = %plan.id, reason, "Plan stopped");
        events.emit(OrchestrationEvent::PlanFailed {
            plan_id: plan.id.clone(),
            failed_steps: plan.failed_steps().map(|s| s.id.ordinal()).collect(),
        });
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{RecordingEventSink, RecordingToolExecutor};
    use counsel_domain::{
        FieldPath, ParamValue, Step, StepStatus, ToolDescriptor, ToolError, parse_plan,
    };
    use serde_json::json;
    use std::time::Duration;

    fn catalog() -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor::new("insert_clients", "Create a client", SideEffectClass::Write),
            ToolDescriptor::new("insert_cases", "Open a case", SideEffectClass::Write),
            ToolDescriptor::new("query_clients", "Find clients", SideEffectClass::Read),
            ToolDescriptor::new("query_cases", "Find cases", SideEffectClass::Read),
        ]
    }

    fn runner(mock: RecordingToolExecutor, params: ExecutionParams) -> (Arc<RecordingToolExecutor>, PlanRunner<RecordingToolExecutor>) {
        let mock = Arc::new(mock);
        (mock.clone(), PlanRunner::new(mock, &params))
    }

    #[tokio::test]
    async fn test_create_client_then_open_case() {
        let (mock, runner) = runner(
            RecordingToolExecutor::new(catalog())
                .script("insert_clients", vec![Ok(json!({"id": "c-42", "name": "X"}))])
                .script("insert_cases", vec![Ok(json!({"id": "k-1", "number": "123"}))]),
            ExecutionParams::default(),
        );
        let mut plan = parse_plan(
            r#"```plan
{"goal": "create client X then open case 123",
 "steps": [
   {"tool": "insert_clients", "parameters": {"name": "X"}},
   {"tool": "insert_cases", "parameters": {"client_id": {"$step": 1}, "number": "123"}}
 ]}
```"#,
        )
        .unwrap();
        let events = RecordingEventSink::new();

        let outcome = runner.run(&TenantId::new("t1"), &mut plan, &events, &None).await;

        assert_eq!(outcome, PlanRunOutcome::Completed);
        assert_eq!(plan.status, PlanStatus::Completed);
        let case_call = &mock.calls_to("insert_cases")[0];
        assert_eq!(case_call.get_str("client_id"), Some("c-42"));
        assert_eq!(case_call.get_str("number"), Some("123"));
        assert_eq!(
            events.names(),
            vec!["STEP_START", "STEP_COMPLETE", "STEP_START", "STEP_COMPLETE", "PLAN_COMPLETED"]
        );
    }

    #[tokio::test]
    async fn test_failure_blocks_dependents_but_not_siblings() {
        let (mock, runner) = runner(
            RecordingToolExecutor::new(catalog())
                .script("insert_clients", vec![Err(ToolError::validation("name is required"))]),
            ExecutionParams::default(),
        );
        let mut plan = Plan::new(
            "mixed",
            vec![
                Step::new("insert_clients"),
                Step::new("insert_cases").with_param("client_id", ParamValue::step_result(StepId::new(0))),
                Step::new("query_cases").with_literal("status", "open"),
                Step::new("query_clients")
                    .with_param("id", ParamValue::step_result(StepId::new(1))),
            ],
        )
        .unwrap();
        let events = RecordingEventSink::new();

        let outcome = runner.run(&TenantId::new("t1"), &mut plan, &events, &None).await;

        assert_eq!(
            outcome,
            PlanRunOutcome::Failed {
                failed: vec![StepId::new(0), StepId::new(1), StepId::new(3)]
            }
        );
        assert_eq!(plan.status, PlanStatus::Failed);
        assert_eq!(plan.steps[2].status, StepStatus::Completed);
        assert!(mock.calls_to("insert_cases").is_empty());
        assert!(mock.calls_to("query_clients").is_empty());
        assert_eq!(mock.calls_to("query_cases").len(), 1);
        assert_eq!(events.count("STEP_FAILED"), 3);
        assert_eq!(events.count("PLAN_FAILED"), 1);
    }

    #[tokio::test]
    async fn test_invocations_never_exceed_budget() {
        for budget in 0..4 {
            let failures = (0..10).map(|_| Err(ToolError::transient("down"))).collect();
            let (mock, runner) = runner(
                RecordingToolExecutor::new(catalog()).script("query_cases", failures),
                ExecutionParams::default().with_retry_budget(budget),
            );
            let mut plan = Plan::single("q", Step::new("query_cases"));
            runner
                .run(&TenantId::new("t1"), &mut plan, &RecordingEventSink::new(), &None)
                .await;
            assert_eq!(mock.calls().len() as u32, budget + 1);
            assert_eq!(plan.steps[0].attempt_count, budget + 1);
            assert_eq!(plan.steps[0].status, StepStatus::Failed);
        }
    }

    #[tokio::test]
    async fn test_unresolvable_reference_aborts_plan() {
        let (mock, runner) = runner(
            RecordingToolExecutor::new(catalog())
                .script("insert_clients", vec![Ok(json!({"name": "X"}))]),
            ExecutionParams::default(),
        );
        let mut plan = Plan::new(
            "bad field",
            vec![
                Step::new("insert_clients"),
                Step::new("insert_cases").with_param(
                    "client_id",
                    ParamValue::step_field(StepId::new(0), FieldPath::parse("client.id").unwrap()),
                ),
                Step::new("query_cases"),
            ],
        )
        .unwrap();
        let events = RecordingEventSink::new();

        let outcome = runner.run(&TenantId::new("t1"), &mut plan, &events, &None).await;

        assert!(matches!(outcome, PlanRunOutcome::Aborted(ResolutionError::MissingField { .. })));
        assert!(mock.calls_to("insert_cases").is_empty());
        assert!(mock.calls_to("query_cases").is_empty());
        assert_eq!(plan.steps[0].status, StepStatus::Completed);
        assert_eq!(plan.steps[2].status, StepStatus::Failed);
        assert_eq!(plan.status, PlanStatus::Failed);
    }

    #[tokio::test]
    async fn test_cancelled_plan_keeps_nothing_running() {
        let (mock, runner) = runner(RecordingToolExecutor::new(catalog()), ExecutionParams::default());
        let mut plan = Plan::new("two", vec![Step::new("query_cases"), Step::new("query_clients")]).unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let events = RecordingEventSink::new();

        let outcome = runner
            .run(&TenantId::new("t1"), &mut plan, &events, &Some(token))
            .await;

        assert_eq!(outcome, PlanRunOutcome::Cancelled);
        assert!(mock.calls().is_empty());
        assert!(plan.steps.iter().all(|s| s.status == StepStatus::Failed));
        assert_eq!(events.names(), vec!["PLAN_FAILED"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_reads_run_concurrently() {
        let (mock, runner) = runner(
            RecordingToolExecutor::new(catalog())
                .with_delay("query_cases", Duration::from_secs(10))
                .with_delay("query_clients", Duration::from_secs(10)),
            ExecutionParams::default().with_parallel_independent_steps(true),
        );
        let mut plan = Plan::new(
            "reads",
            vec![
                Step::new("query_cases"),
                Step::new("query_clients"),
                Step::new("insert_cases").with_param("client_id", ParamValue::step_result(StepId::new(1))),
            ],
        )
        .unwrap();

        let started = tokio::time::Instant::now();
        let outcome = runner
            .run(&TenantId::new("t1"), &mut plan, &RecordingEventSink::new(), &None)
            .await;

        assert_eq!(outcome, PlanRunOutcome::Completed);
        assert_eq!(mock.calls().len(), 3);
        assert!(started.elapsed() < Duration::from_secs(20));
        assert_eq!(
            mock.calls_to("insert_cases")[0].get_str("client_id"),
            Some("query_clients-2")
        );
    }
}
