//! Storage locations from TOML (`[schema]` and `[ledger]` sections)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Declarative entity schema; the built-in legal schema when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSchemaConfig {
    pub path: Option<PathBuf>,
}

/// Record store seeding and the tenant used when none is given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStoreConfig {
    /// JSONL file of `{"tenant", "entity", "record"}` rows loaded at start
    pub seed: Option<PathBuf>,
    pub default_tenant: String,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            seed: None,
            default_tenant: "default".to_string(),
        }
    }
}

/// Verification ledger; in-memory when no path is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLedgerConfig {
    pub path: Option<PathBuf>,
}

impl FileLedgerConfig {
    /// Suspended case contexts live next to the ledger file.
    pub fn contexts_dir(&self) -> Option<PathBuf> {
        self.path.as_ref().map(|p| {
            let stem = p
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "ledger".to_string());
            p.with_file_name(format!("{}.contexts", stem))
        })
    }
}
