//! Application layer for counsel
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{DeliberationParams, ExecutionParams};
pub use ports::{
    audit_logger::{AuditEvent, AuditLogger, NoAuditLogger},
    case_store::{CaseContextStore, ContextStoreError, InMemoryCaseContextStore},
    event_sink::{ChannelEventSink, EventSink, NoEvents},
    ledger::{LedgerError, VerificationLedger},
    model_gateway::{GatewayError, ModelGateway},
    record_store::{Record, RecordStore, StoreError},
    retrieval::{EmbeddingPort, RetrievalError, RetrievalPort, SearchFilters},
    sub_orchestration::{DeliberationRequest, SubOrchestrationPort},
    tool_executor::ToolExecutorPort,
};
pub use use_cases::deliberate::{DeliberationError, DeliberationOrchestrator, DeliberationOutcome};
pub use use_cases::execute_plan::{PlanRunOutcome, PlanRunner};
pub use use_cases::execute_step::{StepExecution, StepExecutor, StepOutcome};
pub use use_cases::run_request::{
    RequestStatus, RunRequestError, RunRequestInput, RunRequestOutput, RunRequestUseCase,
};
pub use use_cases::shared::ModelCallError;
pub use use_cases::trigger_deliberation::{DeliberationTrigger, outcome_json};
