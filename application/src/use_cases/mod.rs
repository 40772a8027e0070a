//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod deliberate;
pub mod execute_plan;
pub mod execute_step;
pub mod run_request;
pub(crate) mod shared;
pub mod trigger_deliberation;

#[cfg(test)]
mod test_support;
