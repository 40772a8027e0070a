//! Run Request use case
//!
//! Drives one request through the cognitive state machine:
//!
//! ```text
//! ANALYZE ─▶ PLAN ─▶ EXECUTE ─▶ FORMAT ─▶ COMPLETED
//!              │       ↺ retry    ▲
//!              │       │          │
//!              └───────┴▶ DELIBERATE ─▶ SUSPENDED
//! ```
//!
//! Any non-terminal phase may fall into ERROR. Every transition goes
//! through [`PhaseTracker`], so an illegal edge is a bug surfaced as
//! [`RunRequestError::Phase`] rather than a silent skip.

mod planning;
mod types;

pub use types::{RequestStatus, RunRequestError, RunRequestInput, RunRequestOutput};

use crate::config::ExecutionParams;
use crate::ports::audit_logger::{AuditEvent, AuditLogger, NoAuditLogger};
use crate::ports::case_store::CaseContextStore;
use crate::ports::event_sink::{EventSink, NoEvents};
use crate::ports::model_gateway::ModelGateway;
use crate::ports::tool_executor::ToolExecutorPort;
use crate::use_cases::deliberate::{DeliberationOrchestrator, DeliberationOutcome};
use crate::use_cases::execute_plan::{PlanRunOutcome, PlanRunner};
use crate::use_cases::shared::is_cancelled;
use counsel_domain::plan::format::{format_plan_result, render_value};
use counsel_domain::{
    CaseContext, CognitivePhase, OrchestrationEvent, PhaseTracker, Plan, Request, StepStatus,
    analyze,
};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use types::Planned;

pub struct RunRequestUseCase<G, T>
where
    G: ModelGateway + ?Sized,
    T: ToolExecutorPort + ?Sized,
{
    gateway: Arc<G>,
    tools: Arc<T>,
    params: ExecutionParams,
    deliberation: Option<Arc<DeliberationOrchestrator>>,
    contexts: Option<Arc<dyn CaseContextStore>>,
    audit: Arc<dyn AuditLogger>,
    cancellation_token: Option<CancellationToken>,
}

impl<G, T> RunRequestUseCase<G, T>
where
    G: ModelGateway + ?Sized,
    T: ToolExecutorPort + ?Sized,
{
    pub fn new(gateway: Arc<G>, tools: Arc<T>) -> Self {
        Self {
            gateway,
            tools,
            params: ExecutionParams::default(),
            deliberation: None,
            contexts: None,
            audit: Arc::new(NoAuditLogger),
            cancellation_token: None,
        }
    }

    pub fn with_params(mut self, params: ExecutionParams) -> Self {
        self.params = params;
        self
    }

    /// Enable the DELIBERATE phase for requests that ask for advice.
    pub fn with_deliberation(mut self, orchestrator: Arc<DeliberationOrchestrator>) -> Self {
        self.deliberation = Some(orchestrator);
        self
    }

    /// Where suspended case contexts are kept for a later resume.
    pub fn with_context_store(mut self, contexts: Arc<dyn CaseContextStore>) -> Self {
        self.contexts = Some(contexts);
        self
    }

    pub fn with_audit_logger(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    pub async fn execute(
        &self,
        input: RunRequestInput,
    ) -> Result<RunRequestOutput, RunRequestError> {
        self.execute_with_events(input, &NoEvents).await
    }

    pub async fn execute_with_events(
        &self,
        input: RunRequestInput,
        events: &dyn EventSink,
    ) -> Result<RunRequestOutput, RunRequestError> {
        if is_cancelled(&self.cancellation_token) {
            return Err(RunRequestError::Cancelled);
        }
        let RunRequestInput {
            request,
            mut context,
        } = input;
        let mut phases = PhaseTracker::new();

        // ==================== ANALYZE ====================
        let analysis = match analyze(&request, &context) {
            Ok(analysis) => analysis,
            Err(e) => {
                let error = RunRequestError::from(e);
                return Err(self.fail_early(&mut phases, error, events));
            }
        };
        context.record(&analysis);
        info!(
            request = %request.id(),
            classification = analysis.classification.as_str(),
            deliberation = analysis.requires_deliberation,
            "Request analyzed"
        );
        let mut output = RunRequestOutput::new(analysis.clone(), context);

        // ==================== PLAN ====================
        phases.advance(CognitivePhase::Plan)?;
        let planned = match self.plan(&request, &analysis).await {
            Ok(planned) => planned,
            Err(e) => return Err(self.fail_early(&mut phases, e, events)),
        };

        // ==================== EXECUTE ====================
        let mut plan_ok = true;
        match planned {
            Planned::Answer(text) => output.response = text,
            Planned::Plan(mut plan) => {
                phases.advance(CognitivePhase::Execute)?;
                events.emit(OrchestrationEvent::plan_created(&plan));
                self.audit.log(AuditEvent::new(
                    "plan_created",
                    json!({
                        "tenant": request.tenant_id(),
                        "request": request.id(),
                        "plan": plan.id,
                        "steps": plan.steps.iter().map(|s| s.tool_name.as_str()).collect::<Vec<_>>(),
                    }),
                ));

                let runner = PlanRunner::new(self.tools.clone(), &self.params)
                    .with_audit_logger(self.audit.clone());
                let outcome = runner
                    .run(request.tenant_id(), &mut plan, events, &self.cancellation_token)
                    .await;
                record_retries(&mut phases, &plan)?;

                match outcome {
                    PlanRunOutcome::Completed => {}
                    PlanRunOutcome::Failed { failed } => {
                        plan_ok = false;
                        events.emit(OrchestrationEvent::error_with_code(
                            format!("{} step(s) failed", failed.len()),
                            "PLAN_FAILED",
                        ));
                    }
                    PlanRunOutcome::Aborted(e) => {
                        warn!(plan = %plan.id, error = %e, "Plan aborted");
                        phases.advance(CognitivePhase::Error)?;
                        events.emit(OrchestrationEvent::error_with_code(
                            e.to_string(),
                            "RESOLUTION_ERROR",
                        ));
                        output.response = format_plan_result(&plan);
                        output.plan = Some(plan);
                        return Ok(finish(output, phases, RequestStatus::Failed));
                    }
                    PlanRunOutcome::Cancelled => {
                        output.plan = Some(plan);
                        return Ok(self.cancelled(output, phases, events));
                    }
                }
                output.response = format_plan_result(&plan);
                output.plan = Some(plan);
            }
        }

        // ==================== DELIBERATE ====================
        if plan_ok
            && analysis.requires_deliberation
            && let Some(orchestrator) = &self.deliberation
        {
            phases.advance(CognitivePhase::Deliberate)?;
            let mut case = case_context_for(&request, output.plan.as_ref());
            match orchestrator
                .run(&mut case, events, &self.cancellation_token)
                .await
            {
                Ok(DeliberationOutcome::Recommended(recommendation)) => {
                    output.response = recommendation.text.clone();
                    output.recommendation = Some(recommendation);
                    output.case_context = Some(case);
                }
                Ok(DeliberationOutcome::NeedsClarification(question)) => {
                    phases.advance(CognitivePhase::Suspended)?;
                    if let Some(store) = &self.contexts
                        && let Err(e) = store.save(&case).await
                    {
                        warn!(session = %case.session_id, error = %e, "Could not save suspended case context");
                    }
                    output.response = question.text.clone();
                    output.question = Some(question);
                    output.case_context = Some(case);
                    return Ok(finish(output, phases, RequestStatus::AwaitingClarification));
                }
                Err(e) if e.is_cancelled() => {
                    output.case_context = Some(case);
                    return Ok(self.cancelled(output, phases, events));
                }
                Err(e) => {
                    warn!(error = %e, "Deliberation aborted");
                    phases.advance(CognitivePhase::Error)?;
                    events.emit(OrchestrationEvent::error_with_code(
                        e.to_string(),
                        "DELIBERATION_ABORTED",
                    ));
                    output.case_context = Some(case);
                    return Ok(finish(output, phases, RequestStatus::Failed));
                }
            }
        }

        // ==================== FORMAT ====================
        phases.advance(CognitivePhase::Format)?;
        events.emit(OrchestrationEvent::Response {
            text: output.response.clone(),
        });
        phases.advance(CognitivePhase::Completed)?;

        let status = if plan_ok {
            RequestStatus::Completed
        } else {
            RequestStatus::Failed
        };
        info!(request = %request.id(), status = status.as_str(), "Request finished");
        Ok(finish(output, phases, status))
    }

    fn fail_early(
        &self,
        phases: &mut PhaseTracker,
        error: RunRequestError,
        events: &dyn EventSink,
    ) -> RunRequestError {
        if let Err(e) = phases.advance(CognitivePhase::Error) {
            return e.into();
        }
        events.emit(OrchestrationEvent::error_with_code(
            error.to_string(),
            error.code(),
        ));
        error
    }

    fn cancelled(
        &self,
        output: RunRequestOutput,
        mut phases: PhaseTracker,
        events: &dyn EventSink,
    ) -> RunRequestOutput {
        info!("Request cancelled");
        if !phases.current().is_terminal()
            && let Err(e) = phases.advance(CognitivePhase::Error)
        {
            warn!(error = %e, "Could not record cancellation phase");
        }
        events.emit(OrchestrationEvent::error_with_code(
            "Operation cancelled",
            "CANCELLED",
        ));
        finish(output, phases, RequestStatus::Cancelled)
    }
}

fn finish(
    mut output: RunRequestOutput,
    phases: PhaseTracker,
    status: RequestStatus,
) -> RunRequestOutput {
    output.phases = phases.history().to_vec();
    output.status = status;
    output
}

/// Each extra attempt of a step re-enters EXECUTE.
fn record_retries(phases: &mut PhaseTracker, plan: &Plan) -> Result<(), RunRequestError> {
    let retries: u32 = plan
        .steps
        .iter()
        .map(|s| s.attempt_count.saturating_sub(1))
        .sum();
    for _ in 0..retries {
        phases.advance(CognitivePhase::Execute)?;
    }
    Ok(())
}

/// Seed a case context from the request and whatever the plan produced.
fn case_context_for(request: &Request, plan: Option<&Plan>) -> CaseContext {
    let mut case = CaseContext::new(
        request.tenant_id().clone(),
        request.session_id().clone(),
        request.raw_text(),
    );
    if let Some(case_id) = request.case_ref() {
        case = case.with_case(case_id.clone());
    }
    for step in plan.into_iter().flat_map(|p| p.steps.iter()) {
        if step.status == StepStatus::Completed
            && let Some(result) = &step.result
        {
            case.add_fact(format!("{}: {}", step.tool_name, render_value(result)));
        }
    }
    case
}
