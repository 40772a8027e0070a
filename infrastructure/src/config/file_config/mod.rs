//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application params.

mod deliberation;
mod execution;
mod logging;
mod model;
mod storage;

pub use deliberation::FileDeliberationConfig;
pub use execution::FileExecutionConfig;
pub use logging::FileLoggingConfig;
pub use model::FileModelConfig;
pub use storage::{FileLedgerConfig, FileSchemaConfig, FileStoreConfig};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    #[error("{field} cannot be 0")]
    ZeroTimeout { field: &'static str },

    #[error("deliberation.research_max_cycles cannot be 0")]
    ZeroResearchCycles,

    #[error("deliberation.research_top_k cannot be 0")]
    ZeroTopK,

    #[error("deliberation.research_confidence_threshold must be in (0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("model.name cannot be empty")]
    EmptyModelName,

    #[error("store.default_tenant cannot be empty")]
    EmptyTenant,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Plan execution: retries, timeouts, concurrency
    pub execution: FileExecutionConfig,
    /// Deliberation pipeline limits
    pub deliberation: FileDeliberationConfig,
    /// Language model endpoint
    pub model: FileModelConfig,
    /// Declarative entity schema
    pub schema: FileSchemaConfig,
    /// Record store seed data and default tenant
    pub store: FileStoreConfig,
    /// Verification ledger location
    pub ledger: FileLedgerConfig,
    /// Audit and diagnostic log files
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Reject values that would make the engine misbehave silently.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.execution.validate()?;
        self.deliberation.validate()?;
        if self.model.name.trim().is_empty() {
            return Err(ConfigValidationError::EmptyModelName);
        }
        if self.store.default_tenant.trim().is_empty() {
            return Err(ConfigValidationError::EmptyTenant);
        }
        Ok(())
    }
}
