//! Tool domain module
//!
//! Every capability the orchestrator can invoke is described by a
//! [`ToolDescriptor`] (name, parameters, side-effect class, tenant scoping),
//! invoked via a [`ToolCall`], and answers with a JSON value or a typed
//! [`ToolError`].
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────────────┐
//! │ DataSchema   │───▶│ ToolCatalog  │───▶│ ToolCall             │
//! │ (entities)   │    │ (descriptors)│    │ → Value | ToolError  │
//! └──────────────┘    └──────────────┘    └──────────────────────┘
//! ```
//!
//! - [`schema`]: declarative entities → generated CRUD/search descriptors
//! - [`retry`]: which failures the caller may retry, and how often
//! - [`provider`]: plug-in sources of tools aggregated by the registry
//!
//! Execution itself lives behind the application layer's
//! `ToolExecutorPort`; this module performs no I/O.

pub mod entities;
pub mod provider;
pub mod retry;
pub mod schema;
pub mod traits;
pub mod value_objects;

pub use entities::{ParamKind, SideEffectClass, ToolCall, ToolCatalog, ToolDescriptor, ToolParameter};
pub use provider::{ProviderError, ToolProvider};
pub use retry::{RetryDecision, RetryPolicy, StopReason};
pub use schema::{DataSchema, EntitySchema, FieldKind, FieldSchema, OperationKind, SchemaError};
pub use traits::{DefaultToolValidator, ToolValidator};
pub use value_objects::{ErrorKind, ToolError};
