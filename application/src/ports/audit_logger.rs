//! Port for the append-only audit log.
//!
//! This is separate from `tracing`-based diagnostics: tracing handles
//! human-readable operational messages, while this port captures what the
//! engine did (steps, security events, recorded rounds) in a
//! machine-readable form (JSONL in the infrastructure adapter).

use chrono::{DateTime, Utc};
use serde_json::Value;

/// A structured audit event.
pub struct AuditEvent {
    /// Event type identifier (e.g., "step_started", "security_event").
    pub event_type: &'static str,
    pub timestamp: DateTime<Utc>,
    /// Event-specific fields
    pub payload: Value,
}

impl AuditEvent {
    /// Create a new audit event stamped with the current UTC time.
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// Port for recording audit events.
///
/// `log` is synchronous and non-fallible so that audit problems never
/// disrupt a request; adapters swallow their own I/O errors.
pub trait AuditLogger: Send + Sync {
    fn log(&self, event: AuditEvent);
}

/// No-op implementation for tests and when auditing is disabled.
pub struct NoAuditLogger;

impl AuditLogger for NoAuditLogger {
    fn log(&self, _event: AuditEvent) {}
}
