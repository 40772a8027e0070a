//! Input/output types for the deliberation pipeline.

use crate::ports::ledger::LedgerError;
use counsel_domain::{
    AgentRole, Claim, ClarifyingQuestion, DomainError, Recommendation, RoundRef, SearchHit,
    SessionId,
};
use thiserror::Error;

/// How a deliberation run ended
#[derive(Debug, Clone, PartialEq)]
pub enum DeliberationOutcome {
    /// The pipeline ran to Drafting.
    Recommended(Recommendation),
    /// Facts found critical gaps; the pipeline is suspended until answered.
    NeedsClarification(ClarifyingQuestion),
}

impl DeliberationOutcome {
    pub fn recommendation(&self) -> Option<&Recommendation> {
        match self {
            DeliberationOutcome::Recommended(r) => Some(r),
            DeliberationOutcome::NeedsClarification(_) => None,
        }
    }

    pub fn question(&self) -> Option<&ClarifyingQuestion> {
        match self {
            DeliberationOutcome::NeedsClarification(q) => Some(q),
            DeliberationOutcome::Recommended(_) => None,
        }
    }
}

/// Errors that abort a deliberation.
///
/// Rounds recorded before the failure stay in the ledger; their references
/// are carried here so the caller can point the requester at them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeliberationError {
    #[error("{stage} stage aborted: {reason} ({} round(s) preserved)", .rounds_recorded.len())]
    Aborted {
        stage: AgentRole,
        reason: String,
        rounds_recorded: Vec<RoundRef>,
    },

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("A clarifying question is still pending for session {0}")]
    AwaitingClarification(SessionId),

    #[error("Invalid clarification: {0}")]
    InvalidAnswer(#[source] DomainError),

    #[error("Operation cancelled")]
    Cancelled { rounds_recorded: Vec<RoundRef> },
}

impl DeliberationError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DeliberationError::Cancelled { .. })
    }

    /// Rounds that were durably recorded before the failure.
    pub fn rounds_recorded(&self) -> &[RoundRef] {
        match self {
            DeliberationError::Aborted {
                rounds_recorded, ..
            }
            | DeliberationError::Cancelled { rounds_recorded } => rounds_recorded,
            _ => &[],
        }
    }
}

pub(super) enum FactsOutcome {
    Proceed,
    Suspend(ClarifyingQuestion),
}

/// What the Research stage hands to Critique.
pub(super) struct ResearchFindings {
    pub claims: Vec<Claim>,
    pub evidence: Vec<SearchHit>,
    /// The cycle cap was hit before the confidence threshold
    pub exhausted: bool,
}
