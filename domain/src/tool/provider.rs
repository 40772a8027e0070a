//! Tool provider abstraction
//!
//! A [`ToolProvider`] is one source of tools plugged into the registry:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     ToolRegistry                            │
//! │  (aggregates providers, routes by priority, scopes tenant)  │
//! └─────────────────────────────────────────────────────────────┘
//!           │                     │                     │
//!           ▼                     ▼                     ▼
//!    ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//!    │   Entity     │     │  Knowledge   │     │ Deliberation │
//!    │  (generated) │     │  / Memory    │     │   trigger    │
//!    └──────────────┘     └──────────────┘     └──────────────┘
//!      priority: 0          priority: 50         priority: 50
//! ```
//!
//! When two providers offer the same tool name, the one with higher
//! priority wins. Hand-written tools can therefore override a generated
//! operation for a specific entity.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::entities::{ToolCall, ToolDescriptor};
use super::value_objects::ToolError;
use crate::core::ids::TenantId;

/// Error type for tool provider operations
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider not available: {0}")]
    NotAvailable(String),

    #[error("Discovery failed: {0}")]
    DiscoveryFailed(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// A source of tools.
///
/// Providers receive the tenant explicitly on every call. The registry has
/// already validated the arguments against the descriptor and refused any
/// caller-supplied tenant id by the time `execute` runs.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Unique identifier for this provider (e.g., "entity", "knowledge")
    fn id(&self) -> &str;

    fn display_name(&self) -> &str;

    /// Priority for tool resolution (higher = preferred)
    fn priority(&self) -> i32 {
        0
    }

    /// Tools this provider can execute
    async fn discover_tools(&self) -> Result<Vec<ToolDescriptor>, ProviderError>;

    /// Execute a tool call on behalf of `tenant`.
    ///
    /// Must not return before the underlying operation has finished.
    async fn execute(&self, tenant: &TenantId, call: &ToolCall) -> Result<Value, ToolError>;
}
