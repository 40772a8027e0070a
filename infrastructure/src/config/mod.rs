//! Configuration file loading for counsel
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `COUNSEL_` environment variables (`__` separates nesting)
//! 2. `--config <path>` specified file
//! 3. Project root: `./counsel.toml` or `./.counsel.toml`
//! 4. Global: `$XDG_CONFIG_HOME/counsel/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileDeliberationConfig, FileExecutionConfig,
    FileLedgerConfig, FileLoggingConfig, FileModelConfig, FileSchemaConfig, FileStoreConfig,
};
pub use loader::{ConfigLoader, ConfigSource};
