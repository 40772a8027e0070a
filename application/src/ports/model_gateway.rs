//! Model gateway port
//!
//! The sole call into the underlying language model:
//! `complete(prompt, tools?) → text | tool_call`. The orchestrator treats it
//! as a black box with bounded latency and non-deterministic output.

use async_trait::async_trait;
use counsel_domain::{Completion, ToolDescriptor};
use thiserror::Error;

/// Errors that can occur during model calls
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

impl GatewayError {
    /// Failures worth retrying under the same budget as other upstream errors.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GatewayError::ConnectionError(_) | GatewayError::RateLimited(_) | GatewayError::Timeout
        )
    }
}

/// Gateway for model communication
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Complete `prompt`. When `tools` is given the model may answer with a
    /// single tool call instead of text.
    async fn complete(
        &self,
        prompt: &str,
        tools: Option<&[ToolDescriptor]>,
    ) -> Result<Completion, GatewayError>;
}
