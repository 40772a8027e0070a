//! Input/output types for the request state machine.

use crate::use_cases::shared::ModelCallError;
use counsel_domain::{
    Analysis, AnalyzeError, CaseContext, ClarifyingQuestion, CognitivePhase, ConversationContext,
    PhaseError, Plan, PlanParseError, Recommendation, Request,
};
use serde::Serialize;
use thiserror::Error;

/// Input for one conversational turn
#[derive(Debug, Clone)]
pub struct RunRequestInput {
    pub request: Request,
    /// Conversation so far, used to resolve pronouns during analysis
    pub context: ConversationContext,
}

impl RunRequestInput {
    pub fn new(request: Request) -> Self {
        Self {
            request,
            context: ConversationContext::new(),
        }
    }

    pub fn with_context(mut self, context: ConversationContext) -> Self {
        self.context = context;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Completed,
    /// Some step or stage failed; partial results are in the output.
    Failed,
    /// Deliberation is suspended on a clarifying question.
    AwaitingClarification,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Completed => "completed",
            RequestStatus::Failed => "failed",
            RequestStatus::AwaitingClarification => "awaiting_clarification",
            RequestStatus::Cancelled => "cancelled",
        }
    }
}

/// Output of one conversational turn
#[derive(Debug, Clone)]
pub struct RunRequestOutput {
    pub status: RequestStatus,
    /// Phases visited, in order
    pub phases: Vec<CognitivePhase>,
    pub analysis: Analysis,
    /// The executed plan, including failed steps
    pub plan: Option<Plan>,
    /// Formatted response text
    pub response: String,
    pub recommendation: Option<Recommendation>,
    pub question: Option<ClarifyingQuestion>,
    /// Case context of a deliberation, when one ran
    pub case_context: Option<CaseContext>,
    /// Conversation context updated with this turn
    pub context: ConversationContext,
}

impl RunRequestOutput {
    pub(super) fn new(analysis: Analysis, context: ConversationContext) -> Self {
        Self {
            status: RequestStatus::Completed,
            phases: Vec::new(),
            analysis,
            plan: None,
            response: String::new(),
            recommendation: None,
            question: None,
            case_context: None,
            context,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RequestStatus::Completed
    }
}

/// Errors that stop a request before it produces any result
#[derive(Error, Debug)]
pub enum RunRequestError {
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] AnalyzeError),

    #[error("Planning failed: {0}")]
    Planning(#[from] PlanParseError),

    #[error("Model unavailable: {0}")]
    Model(ModelCallError),

    #[error(transparent)]
    Phase(#[from] PhaseError),

    #[error("Operation cancelled")]
    Cancelled,
}

impl RunRequestError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunRequestError::Cancelled)
    }

    /// Wire code for the ERROR event
    pub fn code(&self) -> &'static str {
        match self {
            RunRequestError::InvalidRequest(_) => "INVALID_REQUEST",
            RunRequestError::Planning(_) => "PLANNING_ERROR",
            RunRequestError::Model(_) => "MODEL_ERROR",
            RunRequestError::Phase(_) => "INTERNAL_ERROR",
            RunRequestError::Cancelled => "CANCELLED",
        }
    }
}

impl From<ModelCallError> for RunRequestError {
    fn from(error: ModelCallError) -> Self {
        match error {
            ModelCallError::Cancelled => RunRequestError::Cancelled,
            other => RunRequestError::Model(other),
        }
    }
}

/// What the PLAN phase produced.
pub(super) enum Planned {
    Plan(Plan),
    /// The model answered directly; nothing to execute.
    Answer(String),
}
