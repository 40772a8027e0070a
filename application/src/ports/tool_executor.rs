//! Tool Executor port
//!
//! Each tool is a function-call contract `(tenant_id, parameters) → Result|TypedError`.
//! The executor does not know about HTTP, sessions, or UI.

use async_trait::async_trait;
use counsel_domain::{TenantId, ToolCall, ToolCatalog, ToolDescriptor, ToolError};
use serde_json::Value;

/// Port for tool execution
///
/// Implementations must await the underlying operation to completion before
/// returning; how a tool achieves concurrency internally is invisible here.
#[async_trait]
pub trait ToolExecutorPort: Send + Sync {
    /// All available tools
    fn catalog(&self) -> &ToolCatalog;

    fn has_tool(&self, name: &str) -> bool {
        self.catalog().contains(name)
    }

    fn get_tool(&self, name: &str) -> Option<&ToolDescriptor> {
        self.catalog().get(name)
    }

    fn available_tools(&self) -> Vec<&str> {
        self.catalog().names().collect()
    }

    /// Execute a call on behalf of `tenant`.
    async fn execute(&self, tenant: &TenantId, call: &ToolCall) -> Result<Value, ToolError>;
}
