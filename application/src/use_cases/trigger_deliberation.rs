//! Deliberation trigger
//!
//! Implements [`SubOrchestrationPort`] on top of the
//! [`DeliberationOrchestrator`], so the `start_deliberation` tool can hand
//! control to the specialist pipeline without knowing about it. A
//! suspended context is saved so that a later `resume` can answer it.

use crate::ports::case_store::CaseContextStore;
use crate::ports::event_sink::NoEvents;
use crate::ports::sub_orchestration::{DeliberationRequest, SubOrchestrationPort};
use crate::use_cases::deliberate::{DeliberationError, DeliberationOrchestrator, DeliberationOutcome};
use async_trait::async_trait;
use counsel_domain::{CaseContext, ToolError};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::warn;

pub struct DeliberationTrigger {
    orchestrator: Arc<DeliberationOrchestrator>,
    contexts: Arc<dyn CaseContextStore>,
}

impl DeliberationTrigger {
    pub fn new(
        orchestrator: Arc<DeliberationOrchestrator>,
        contexts: Arc<dyn CaseContextStore>,
    ) -> Self {
        Self {
            orchestrator,
            contexts,
        }
    }
}

/// Structured form of a deliberation outcome, as returned to tools.
pub fn outcome_json(outcome: &DeliberationOutcome, context: &CaseContext) -> Value {
    match outcome {
        DeliberationOutcome::Recommended(recommendation) => json!({
            "status": "recommended",
            "session_id": context.session_id,
            "confidence": recommendation.confidence,
            "recommendation": recommendation.text,
            "verified_claims": recommendation.tally.verified,
            "flagged_claims": recommendation.tally.flagged,
            "research_exhausted": recommendation.research_exhausted,
            "contributing_rounds": recommendation
                .contributing_rounds
                .iter()
                .map(|r| json!({"round": r.round_number, "role": r.role}))
                .collect::<Vec<_>>(),
        }),
        DeliberationOutcome::NeedsClarification(question) => json!({
            "status": "needs_clarification",
            "session_id": context.session_id,
            "question": question.text,
            "missing": question.missing,
        }),
    }
}

#[async_trait]
impl SubOrchestrationPort for DeliberationTrigger {
    async fn deliberate(&self, request: DeliberationRequest) -> Result<Value, ToolError> {
        let mut context =
            CaseContext::new(request.tenant_id, request.session_id, request.question);
        if let Some(case_id) = request.case_id {
            context = context.with_case(case_id);
        }

        let outcome = self
            .orchestrator
            .run(&mut context, &NoEvents, &None)
            .await
            .map_err(|e| match e {
                DeliberationError::Cancelled { .. } => {
                    ToolError::upstream("deliberation cancelled")
                }
                other => ToolError::upstream(other.to_string()),
            })?;

        if outcome.question().is_some()
            && let Err(e) = self.contexts.save(&context).await
        {
            warn!(session = %context.session_id, error = %e, "Could not save suspended case context");
        }
        Ok(outcome_json(&outcome, &context))
    }
}
