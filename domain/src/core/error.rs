//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Clarification answer is empty")]
    EmptyAnswer,

    #[error("No clarifying question is pending")]
    NothingPending,
}
