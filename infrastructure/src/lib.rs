//! Infrastructure layer for counsel
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: record store, retrieval, tool providers, ledgers,
//! suspended-context storage, the model gateway and configuration loading.

pub mod config;
pub mod contexts;
pub mod ledger;
pub mod logging;
#[cfg(feature = "http-model")]
pub mod model;
pub mod retrieval;
pub mod schema;
pub mod store;
pub mod tools;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigSource, ConfigValidationError, FileConfig, FileDeliberationConfig,
    FileExecutionConfig, FileLedgerConfig, FileLoggingConfig, FileModelConfig, FileSchemaConfig,
    FileStoreConfig,
};
pub use contexts::FileCaseContextStore;
pub use ledger::{InMemoryLedger, JsonlLedger};
pub use logging::JsonlAuditLogger;
#[cfg(feature = "http-model")]
pub use model::HttpModelGateway;
pub use retrieval::{HashingEmbedder, KnowledgeBase, KnowledgeCollection};
pub use schema::{SchemaLoadError, SchemaLoader};
pub use store::{InMemoryRecordStore, SHARED_TENANT};
pub use tools::{
    DeliberationToolProvider, EntityToolProvider, KnowledgeToolProvider, MEMORY_ENTITY,
    MemoryToolProvider, RegistryStats, ToolRegistry,
};
