//! Sub-orchestration port
//!
//! Lets a tool hand control to the deliberation pipeline. The tool sees
//! only this port, so the tool registry never depends on the orchestrator.

use async_trait::async_trait;
use counsel_domain::{CaseId, SessionId, TenantId, ToolError};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliberationRequest {
    pub tenant_id: TenantId,
    pub session_id: SessionId,
    pub case_id: Option<CaseId>,
    pub question: String,
}

#[async_trait]
pub trait SubOrchestrationPort: Send + Sync {
    /// Run a deliberation and return its outcome as structured JSON.
    async fn deliberate(&self, request: DeliberationRequest) -> Result<Value, ToolError>;
}
