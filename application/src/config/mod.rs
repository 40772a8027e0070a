//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`ExecutionParams`]: plan execution control (retries, timeouts, concurrency)
//! - [`DeliberationParams`]: research cycle limits and stage retries

pub mod deliberation_params;
pub mod execution_params;

pub use deliberation_params::DeliberationParams;
pub use execution_params::ExecutionParams;
