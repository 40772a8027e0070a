//! Tool domain value objects: the typed failure of the tool contract.
//!
//! Every tool returns either a structured JSON success value or a
//! [`ToolError`]. The error's [`ErrorKind`] drives the retry policy in
//! [`super::retry`]:
//!
//! | Kind | Retried? |
//! |------|----------|
//! | `Validation` | Never |
//! | `Permission` | Never (logged as a security event) |
//! | `NotFound` | Once, only if the step depends on an earlier step |
//! | `Upstream` (transient) | Up to budget, reads and writes |
//! | `Upstream` (permanent) | Up to budget, reads only |
//! | `Timeout` | Up to budget, reads and writes |

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of a [`ToolError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Permission,
    Upstream,
    Timeout,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Permission => "PERMISSION_DENIED",
            ErrorKind::Upstream => "UPSTREAM_ERROR",
            ErrorKind::Timeout => "TIMEOUT",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Typed failure of a tool invocation
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolError {
    /// Bad input shape
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// Tenant-scope violation or forbidden operation
    #[error("Permission denied: {message}")]
    Permission { message: String },

    /// Failure of a collaborator (store, retrieval, model, network)
    #[error("Upstream error: {message}")]
    Upstream { message: String, transient: bool },

    #[error("Timed out after {timeout_ms}ms: {operation}")]
    Timeout { operation: String, timeout_ms: u64 },
}

impl ToolError {
    pub fn validation(message: impl Into<String>) -> Self {
        ToolError::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        ToolError::NotFound {
            resource: resource.into(),
        }
    }

    pub fn permission(message: impl Into<String>) -> Self {
        ToolError::Permission {
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        ToolError::Upstream {
            message: message.into(),
            transient: true,
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        ToolError::Upstream {
            message: message.into(),
            transient: false,
        }
    }

    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        ToolError::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::Validation { .. } => ErrorKind::Validation,
            ToolError::NotFound { .. } => ErrorKind::NotFound,
            ToolError::Permission { .. } => ErrorKind::Permission,
            ToolError::Upstream { .. } => ErrorKind::Upstream,
            ToolError::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    /// Transient upstream failures and timeouts.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ToolError::Upstream {
                transient: true,
                ..
            } | ToolError::Timeout { .. }
        )
    }

    pub fn is_security_event(&self) -> bool {
        matches!(self, ToolError::Permission { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_and_codes() {
        assert_eq!(ToolError::validation("x").kind(), ErrorKind::Validation);
        assert_eq!(ToolError::not_found("client 1").code(), "NOT_FOUND");
        assert_eq!(ToolError::permission("x").code(), "PERMISSION_DENIED");
        assert_eq!(ToolError::timeout("query", 10).kind(), ErrorKind::Timeout);
    }

    #[test]
    fn test_transience() {
        assert!(ToolError::transient("503").is_transient());
        assert!(ToolError::timeout("query", 10).is_transient());
        assert!(!ToolError::upstream("bad gateway config").is_transient());
        assert!(!ToolError::validation("x").is_transient());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ToolError::timeout("query_cases", 30000).to_string(),
            "Timed out after 30000ms: query_cases"
        );
        assert_eq!(
            ToolError::not_found("client c-1").to_string(),
            "Not found: client c-1"
        );
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let json = serde_json::to_value(ToolError::transient("down")).unwrap();
        assert_eq!(json["kind"], "upstream");
        assert_eq!(json["transient"], true);
    }
}
