//! Logging infrastructure: the append-only audit log.
//!
//! Provides [`JsonlAuditLogger`], a JSONL file writer that implements
//! the [`AuditLogger`](counsel_application::AuditLogger) port.

mod audit_logger;

pub use audit_logger::JsonlAuditLogger;
