//! Shared utilities for use cases.
//!
//! Cancellation checks, caller-enforced timeouts and retried model calls
//! used by the step executor, the request state machine and the
//! deliberation stages.

use crate::ports::model_gateway::{GatewayError, ModelGateway};
use counsel_domain::{Completion, ToolDescriptor};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Check if cancellation has been requested.
pub(crate) fn is_cancelled(token: &Option<CancellationToken>) -> bool {
    token.as_ref().is_some_and(|t| t.is_cancelled())
}

/// Outcome of a timeout- and cancellation-bounded external call.
pub(crate) enum Bounded<T> {
    Done(T),
    TimedOut,
    Cancelled,
}

/// Await `future` under `limit`, giving up early if `token` is cancelled.
pub(crate) async fn bounded<F: Future>(
    future: F,
    limit: Duration,
    token: &Option<CancellationToken>,
) -> Bounded<F::Output> {
    let timed = tokio::time::timeout(limit, future);
    match token {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => Bounded::Cancelled,
                result = timed => result.map_or(Bounded::TimedOut, Bounded::Done),
            }
        }
        None => timed.await.map_or(Bounded::TimedOut, Bounded::Done),
    }
}

/// A model call that could not be completed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelCallError {
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Model call failed after {attempts} attempt(s): {last}")]
    Exhausted { attempts: u32, last: GatewayError },
}

/// Call the model, retrying transient failures and timeouts up to `budget` times.
pub(crate) async fn complete_with_retry<G: ModelGateway + ?Sized>(
    gateway: &G,
    prompt: &str,
    tools: Option<&[ToolDescriptor]>,
    limit: Duration,
    budget: u32,
    token: &Option<CancellationToken>,
) -> Result<Completion, ModelCallError> {
    let mut attempts = 0;
    loop {
        if is_cancelled(token) {
            return Err(ModelCallError::Cancelled);
        }
        attempts += 1;

        let error = match bounded(gateway.complete(prompt, tools), limit, token).await {
            Bounded::Done(Ok(completion)) => return Ok(completion),
            Bounded::Done(Err(e)) => e,
            Bounded::TimedOut => GatewayError::Timeout,
            Bounded::Cancelled => return Err(ModelCallError::Cancelled),
        };

        if !error.is_transient() || attempts > budget {
            return Err(ModelCallError::Exhausted {
                attempts,
                last: error,
            });
        }
        warn!(attempt = attempts, error = %error, "Model call failed, retrying");
    }
}
