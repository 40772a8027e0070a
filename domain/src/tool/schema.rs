//! Schema-driven tool generation.
//!
//! A declarative [`EntitySchema`] is instantiated into a closed set of
//! operations ([`OperationKind`]) at startup. Nothing is discovered by
//! reflection: the descriptor list is a pure function of the schema.

use super::entities::{ParamKind, SideEffectClass, ToolDescriptor, ToolParameter};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Column carrying the owning tenant. Never supplied by callers.
pub const TENANT_FIELD: &str = "tenant_id";
/// Primary key column, generated on insert.
pub const ID_FIELD: &str = "id";

pub const DEFAULT_QUERY_LIMIT: u64 = 50;
pub const DEFAULT_SEARCH_TOP_K: u64 = 5;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Invalid entity name '{0}': use lowercase letters, digits and underscores")]
    InvalidName(String),

    #[error("Entity '{0}' is declared more than once")]
    DuplicateEntity(String),

    #[error("Entity '{entity}' declares field '{field}' more than once")]
    DuplicateField { entity: String, field: String },

    #[error("Entity '{entity}' may not declare reserved field '{field}'")]
    ReservedField { entity: String, field: String },

    #[error("Entity '{0}' has no fields")]
    NoFields(String),

    #[error("Entity '{entity}' embeds unknown or non-text field '{field}'")]
    InvalidEmbeddingField { entity: String, field: String },
}

/// Storage type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Integer,
    Number,
    Boolean,
    /// ISO-8601 date or datetime, stored as text
    Date,
    /// Identifier of a row in another entity
    Reference,
    /// Free-form JSON
    Json,
}

impl FieldKind {
    pub fn param_kind(&self) -> ParamKind {
        match self {
            FieldKind::Text | FieldKind::Date | FieldKind::Reference => ParamKind::String,
            FieldKind::Integer => ParamKind::Integer,
            FieldKind::Number => ParamKind::Number,
            FieldKind::Boolean => ParamKind::Boolean,
            FieldKind::Json => ParamKind::Any,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: String::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    fn describe(&self) -> String {
        if self.description.is_empty() {
            self.name.replace('_', " ")
        } else {
            self.description.clone()
        }
    }
}

fn default_true() -> bool {
    true
}

/// One persisted entity (table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    /// Plural, snake_case name (`clients`, `cases`)
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub fields: Vec<FieldSchema>,
    #[serde(default = "default_true")]
    pub tenant_scoped: bool,
    /// Text field whose embedding enables a vector-search operation
    #[serde(default)]
    pub embedding_field: Option<String>,
}

impl EntitySchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            fields: Vec::new(),
            tenant_scoped: true,
            embedding_field: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_embedding(mut self, field: impl Into<String>) -> Self {
        self.embedding_field = Some(field.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Operations generated for this entity.
    pub fn operations(&self) -> Vec<OperationKind> {
        OperationKind::all()
            .into_iter()
            .filter(|op| *op != OperationKind::VectorSearch || self.embedding_field.is_some())
            .collect()
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        let valid_name = !self.name.is_empty()
            && self
                .name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !valid_name {
            return Err(SchemaError::InvalidName(self.name.clone()));
        }
        if self.fields.is_empty() {
            return Err(SchemaError::NoFields(self.name.clone()));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name == ID_FIELD || field.name == TENANT_FIELD {
                return Err(SchemaError::ReservedField {
                    entity: self.name.clone(),
                    field: field.name.clone(),
                });
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    entity: self.name.clone(),
                    field: field.name.clone(),
                });
            }
        }

        if let Some(embedding) = &self.embedding_field
            && self.field(embedding).map(|f| f.kind) != Some(FieldKind::Text)
        {
            return Err(SchemaError::InvalidEmbeddingField {
                entity: self.name.clone(),
                field: embedding.clone(),
            });
        }
        Ok(())
    }

    /// Tool descriptors for every operation of this entity.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.operations()
            .into_iter()
            .map(|op| op.descriptor(self))
            .collect()
    }
}

/// Closed set of generated operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Insert,
    Query,
    GetSchema,
    Update,
    Delete,
    VectorSearch,
}

impl OperationKind {
    pub fn all() -> [OperationKind; 6] {
        [
            OperationKind::Insert,
            OperationKind::Query,
            OperationKind::GetSchema,
            OperationKind::Update,
            OperationKind::Delete,
            OperationKind::VectorSearch,
        ]
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            OperationKind::Insert => "insert",
            OperationKind::Query => "query",
            OperationKind::GetSchema => "get_schema",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
            OperationKind::VectorSearch => "search",
        }
    }

    pub fn side_effect(&self) -> SideEffectClass {
        match self {
            OperationKind::Insert | OperationKind::Update | OperationKind::Delete => {
                SideEffectClass::Write
            }
            OperationKind::Query | OperationKind::GetSchema | OperationKind::VectorSearch => {
                SideEffectClass::Read
            }
        }
    }

    pub fn tool_name(&self, entity: &str) -> String {
        format!("{}_{}", self.prefix(), entity)
    }

    /// Split a generated tool name into operation and entity name.
    pub fn from_tool_name(name: &str) -> Option<(OperationKind, &str)> {
        Self::all().into_iter().find_map(|op| {
            name.strip_prefix(op.prefix())
                .and_then(|rest| rest.strip_prefix('_'))
                .filter(|entity| !entity.is_empty())
                .map(|entity| (op, entity))
        })
    }

    pub fn descriptor(&self, entity: &EntitySchema) -> ToolDescriptor {
        let name = self.tool_name(&entity.name);
        let label = if entity.description.is_empty() {
            entity.name.clone()
        } else {
            entity.description.clone()
        };

        let base = |description: String| {
            ToolDescriptor::new(name.clone(), description, self.side_effect())
                .with_tenant_scoping(entity.tenant_scoped)
        };

        let id_param = |required: bool| {
            ToolParameter::new(ID_FIELD, format!("Identifier of the {} row", entity.name), required)
        };

        match self {
            OperationKind::Insert => entity.fields.iter().fold(
                base(format!("Create a new row in {}. Returns the new row with its id.", label)),
                |d, f| {
                    d.with_parameter(
                        ToolParameter::new(&f.name, f.describe(), f.required)
                            .with_kind(f.kind.param_kind()),
                    )
                },
            ),
            OperationKind::Query => entity
                .fields
                .iter()
                .fold(
                    base(format!(
                        "Find rows in {}. Every given field is an exact-match filter.",
                        label
                    ))
                    .with_parameter(id_param(false)),
                    |d, f| {
                        d.with_parameter(
                            ToolParameter::new(&f.name, f.describe(), false)
                                .with_kind(f.kind.param_kind()),
                        )
                    },
                )
                .with_parameter(
                    ToolParameter::new(
                        "limit",
                        format!("Maximum rows to return (default {})", DEFAULT_QUERY_LIMIT),
                        false,
                    )
                    .with_kind(ParamKind::Integer),
                ),
            OperationKind::GetSchema => base(format!("Describe the fields of {}.", label)),
            OperationKind::Update => entity.fields.iter().fold(
                base(format!("Update one row in {}. Only given fields change.", label))
                    .with_parameter(id_param(true)),
                |d, f| {
                    d.with_parameter(
                        ToolParameter::new(&f.name, f.describe(), false)
                            .with_kind(f.kind.param_kind()),
                    )
                },
            ),
            OperationKind::Delete => base(format!("Delete one row from {}.", label))
                .with_parameter(id_param(true)),
            OperationKind::VectorSearch => base(format!(
                "Semantic search over {} by {}.",
                label,
                entity.embedding_field.as_deref().unwrap_or("content")
            ))
            .with_parameter(ToolParameter::new("query", "Natural-language query", true))
            .with_parameter(
                ToolParameter::new(
                    "top_k",
                    format!("Number of results (default {})", DEFAULT_SEARCH_TOP_K),
                    false,
                )
                .with_kind(ParamKind::Integer),
            ),
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// The full declarative schema: a list of entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DataSchema {
    #[serde(default)]
    pub entities: Vec<EntitySchema>,
}

impl DataSchema {
    pub fn new(entities: Vec<EntitySchema>) -> Self {
        Self { entities }
    }

    pub fn entity(&self, name: &str) -> Option<&EntitySchema> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut seen = HashSet::new();
        for entity in &self.entities {
            entity.validate()?;
            if !seen.insert(entity.name.as_str()) {
                return Err(SchemaError::DuplicateEntity(entity.name.clone()));
            }
        }
        Ok(())
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.entities
            .iter()
            .flat_map(EntitySchema::descriptors)
            .collect()
    }

    /// Built-in schema of a small legal practice.
    pub fn legal_defaults() -> Self {
        use FieldKind::*;
        Self::new(vec![
            EntitySchema::new("clients")
                .with_description("clients of the firm")
                .with_field(FieldSchema::new("name", Text).required())
                .with_field(FieldSchema::new("email", Text))
                .with_field(FieldSchema::new("phone", Text))
                .with_field(FieldSchema::new("address", Text))
                .with_field(FieldSchema::new("notes", Text)),
            EntitySchema::new("cases")
                .with_description("legal cases (matters)")
                .with_field(
                    FieldSchema::new("number", Text)
                        .required()
                        .with_description("Docket or internal case number"),
                )
                .with_field(FieldSchema::new("title", Text))
                .with_field(FieldSchema::new("client_id", Reference))
                .with_field(FieldSchema::new("status", Text))
                .with_field(FieldSchema::new("court", Text))
                .with_field(FieldSchema::new("jurisdiction", Text))
                .with_field(FieldSchema::new("opened_on", Date)),
            EntitySchema::new("hearings")
                .with_description("court hearings")
                .with_field(FieldSchema::new("case_id", Reference).required())
                .with_field(FieldSchema::new("scheduled_at", Date).required())
                .with_field(FieldSchema::new("court", Text))
                .with_field(FieldSchema::new("kind", Text))
                .with_field(FieldSchema::new("notes", Text)),
            EntitySchema::new("documents")
                .with_description("case documents")
                .with_field(FieldSchema::new("title", Text).required())
                .with_field(FieldSchema::new("case_id", Reference))
                .with_field(FieldSchema::new("doc_type", Text))
                .with_field(FieldSchema::new("content", Text).required())
                .with_embedding("content"),
            EntitySchema::new("deadlines")
                .with_description("procedural deadlines")
                .with_field(FieldSchema::new("case_id", Reference))
                .with_field(FieldSchema::new("due_on", Date).required())
                .with_field(FieldSchema::new("description", Text).required())
                .with_field(FieldSchema::new("completed", Boolean)),
            EntitySchema::new("notes")
                .with_description("free-form notes")
                .with_field(FieldSchema::new("content", Text).required())
                .with_field(FieldSchema::new("case_id", Reference))
                .with_field(FieldSchema::new("client_id", Reference)),
        ])
    }
}
