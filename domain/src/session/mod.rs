//! Request session types: model completions and the orchestration event stream.

pub mod events;
pub mod response;

pub use events::{OrchestrationEvent, PlannedStep};
pub use response::Completion;
