//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Append-only JSONL audit log
    pub audit_file: Option<PathBuf>,
    /// Diagnostic log file; stderr only when absent
    pub file: Option<PathBuf>,
}
