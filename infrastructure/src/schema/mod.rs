//! Declarative entity schema loading.
//!
//! ```toml
//! [[entities]]
//! name = "clients"
//! description = "clients of the firm"
//!
//! [[entities.fields]]
//! name = "name"
//! kind = "text"
//! required = true
//! ```
//!
//! The built-in legal schema is used when no file is configured.

use counsel_domain::{DataSchema, SchemaError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum SchemaLoadError {
    #[error("Could not read schema {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not parse schema {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error(transparent)]
    Invalid(#[from] SchemaError),
}

pub struct SchemaLoader;

impl SchemaLoader {
    /// The configured schema, or the built-in one when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<DataSchema, SchemaLoadError> {
        match path {
            Some(path) => Self::load_file(path),
            None => Ok(DataSchema::legal_defaults()),
        }
    }

    pub fn load_file(path: &Path) -> Result<DataSchema, SchemaLoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| SchemaLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let schema = Self::parse(&content).map_err(|e| match e {
            SchemaLoadError::Parse { source, .. } => SchemaLoadError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        info!(path = %path.display(), entities = schema.entities.len(), "Loaded entity schema");
        Ok(schema)
    }

    /// Parse and validate schema TOML.
    pub fn parse(content: &str) -> Result<DataSchema, SchemaLoadError> {
        let schema: DataSchema =
            toml::from_str(content).map_err(|source| SchemaLoadError::Parse {
                path: PathBuf::new(),
                source,
            })?;
        schema.validate()?;
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use counsel_domain::{FieldKind, OperationKind};
    use std::io::Write;

    const SCHEMA: &str = r#"
[[entities]]
name = "invoices"
description = "client invoices"

[[entities.fields]]
name = "amount"
kind = "number"
required = true

[[entities.fields]]
name = "client_id"
kind = "reference"

[[entities]]
name = "precedents"
embedding_field = "summary"

[[entities.fields]]
name = "summary"
"#;

    #[test]
    fn test_parse_schema() {
        let schema = SchemaLoader::parse(SCHEMA).unwrap();

        let invoices = schema.entity("invoices").unwrap();
        assert!(invoices.tenant_scoped);
        assert_eq!(invoices.field("amount").unwrap().kind, FieldKind::Number);
        assert!(invoices.field("amount").unwrap().required);

        let precedents = schema.entity("precedents").unwrap();
        assert_eq!(precedents.field("summary").unwrap().kind, FieldKind::Text);
        assert!(precedents.operations().contains(&OperationKind::VectorSearch));
        assert!(!invoices.operations().contains(&OperationKind::VectorSearch));
    }

    #[test]
    fn test_reserved_field_rejected() {
        let result = SchemaLoader::parse(
            r#"
[[entities]]
name = "clients"
[[entities.fields]]
name = "tenant_id"
"#,
        );
        assert!(matches!(
            result,
            Err(SchemaLoadError::Invalid(SchemaError::ReservedField { .. }))
        ));
    }

    #[test]
    fn test_load_file_and_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", SCHEMA).unwrap();

        let schema = SchemaLoader::load(Some(file.path())).unwrap();
        assert_eq!(schema.entities.len(), 2);

        let defaults = SchemaLoader::load(None).unwrap();
        assert!(defaults.entity("clients").is_some());
    }

    #[test]
    fn test_missing_file() {
        let result = SchemaLoader::load_file(Path::new("/nonexistent/schema.toml"));
        assert!(matches!(result, Err(SchemaLoadError::Io { .. })));
    }
}
