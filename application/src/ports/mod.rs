//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod audit_logger;
pub mod case_store;
pub mod event_sink;
pub mod ledger;
pub mod model_gateway;
pub mod record_store;
pub mod retrieval;
pub mod sub_orchestration;
pub mod tool_executor;
