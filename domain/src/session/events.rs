//! Orchestration events streamed to the presentation layer.
//!
//! Serialized with a `type` tag (`PLAN_CREATED`, `STEP_START`, ...), one
//! event per discrete state change.

use crate::core::ids::{PlanId, SessionId};
use crate::deliberation::{AgentRole, ConfidenceLabel, CriticalFact, Recommendation};
use crate::plan::entities::Plan;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Summary of one planned step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedStep {
    /// 1-based step number
    pub step: usize,
    pub tool: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrchestrationEvent {
    PlanCreated {
        plan_id: PlanId,
        goal: String,
        steps: Vec<PlannedStep>,
    },
    StepStart {
        step_id: usize,
        tool: String,
        attempt: u32,
    },
    StepComplete {
        step_id: usize,
        result: Value,
        message: String,
        attempts: u32,
    },
    StepFailed {
        step_id: usize,
        error: String,
        attempts: u32,
    },
    PlanCompleted {
        plan_id: PlanId,
    },
    PlanFailed {
        plan_id: PlanId,
        failed_steps: Vec<usize>,
    },
    AgentStatus {
        stage: String,
        message: String,
    },
    Question {
        session_id: SessionId,
        question: String,
        missing: Vec<CriticalFact>,
    },
    Recommendation {
        confidence: ConfidenceLabel,
        text: String,
        contributing_rounds: usize,
    },
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },
    Response {
        text: String,
    },
}

impl OrchestrationEvent {
    pub fn plan_created(plan: &Plan) -> Self {
        OrchestrationEvent::PlanCreated {
            plan_id: plan.id.clone(),
            goal: plan.goal.clone(),
            steps: plan
                .steps
                .iter()
                .map(|s| PlannedStep {
                    step: s.id.ordinal(),
                    tool: s.tool_name.clone(),
                    description: s.description.clone(),
                })
                .collect(),
        }
    }

    pub fn agent_status(stage: AgentRole, message: impl Into<String>) -> Self {
        OrchestrationEvent::AgentStatus {
            stage: stage.as_str().to_string(),
            message: message.into(),
        }
    }

    pub fn recommendation(recommendation: &Recommendation) -> Self {
        OrchestrationEvent::Recommendation {
            confidence: recommendation.confidence,
            text: recommendation.text.clone(),
            contributing_rounds: recommendation.contributing_rounds.len(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        OrchestrationEvent::Error {
            message: message.into(),
            code: None,
        }
    }

    pub fn error_with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        OrchestrationEvent::Error {
            message: message.into(),
            code: Some(code.into()),
        }
    }

    /// Event name as it appears on the wire
    pub fn name(&self) -> &'static str {
        match self {
            OrchestrationEvent::PlanCreated { .. } => "PLAN_CREATED",
            OrchestrationEvent::StepStart { .. } => "STEP_START",
            OrchestrationEvent::StepComplete { .. } => "STEP_COMPLETE",
            OrchestrationEvent::StepFailed { .. } => "STEP_FAILED",
            OrchestrationEvent::PlanCompleted { .. } => "PLAN_COMPLETED",
            OrchestrationEvent::PlanFailed { .. } => "PLAN_FAILED",
            OrchestrationEvent::AgentStatus { .. } => "AGENT_STATUS",
            OrchestrationEvent::Question { .. } => "QUESTION",
            OrchestrationEvent::Recommendation { .. } => "RECOMMENDATION",
            OrchestrationEvent::Error { .. } => "ERROR",
            OrchestrationEvent::Response { .. } => "RESPONSE",
        }
    }

    /// Terminal events end a request's stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrchestrationEvent::Question { .. }
                | OrchestrationEvent::Error { .. }
                | OrchestrationEvent::Response { .. }
        )
    }
}
