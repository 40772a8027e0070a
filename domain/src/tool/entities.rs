//! Tool domain entities

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// Side-effect class of a tool operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideEffectClass {
    /// Reads persisted or external state only
    Read,
    /// Creates, modifies or deletes state
    Write,
}

impl SideEffectClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            SideEffectClass::Read => "read",
            SideEffectClass::Write => "write",
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self, SideEffectClass::Write)
    }
}

impl std::fmt::Display for SideEffectClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// JSON type accepted by a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    #[default]
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    /// Anything, including null
    Any,
}

impl ParamKind {
    /// JSON Schema `type` keyword, `None` for [`ParamKind::Any`]
    pub fn json_type(&self) -> Option<&str> {
        match self {
            ParamKind::String => Some("string"),
            ParamKind::Integer => Some("integer"),
            ParamKind::Number => Some("number"),
            ParamKind::Boolean => Some("boolean"),
            ParamKind::Object => Some("object"),
            ParamKind::Array => Some("array"),
            ParamKind::Any => None,
        }
    }

    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Integer => value.is_i64() || value.is_u64(),
            ParamKind::Number => value.is_number(),
            ParamKind::Boolean => value.is_boolean(),
            ParamKind::Object => value.is_object(),
            ParamKind::Array => value.is_array(),
            ParamKind::Any => true,
        }
    }
}

/// One parameter of a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub description: String,
    pub required: bool,
    pub kind: ParamKind,
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required,
            kind: ParamKind::String,
        }
    }

    pub fn with_kind(mut self, kind: ParamKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Description of a registered tool.
///
/// Immutable once registered. The registry is populated at startup from
/// schema metadata plus static registrations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique name (e.g., `insert_clients`, `knowledge_search`)
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
    pub side_effect: SideEffectClass,
    /// Whether the registry must inject the tenant id
    pub tenant_scoped: bool,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        side_effect: SideEffectClass,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            side_effect,
            tenant_scoped: true,
        }
    }

    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn with_tenant_scoping(mut self, tenant_scoped: bool) -> Self {
        self.tenant_scoped = tenant_scoped;
        self
    }

    pub fn is_write(&self) -> bool {
        self.side_effect.is_write()
    }

    pub fn parameter(&self, name: &str) -> Option<&ToolParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// JSON Schema object describing the tool's input.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            let mut prop = Map::new();
            if let Some(ty) = param.kind.json_type() {
                prop.insert("type".to_string(), json!(ty));
            }
            prop.insert("description".to_string(), json!(param.description));
            properties.insert(param.name.clone(), Value::Object(prop));
            if param.required {
                required.push(json!(param.name));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// The set of tools available to a request
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: BTreeMap<String, ToolDescriptor>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, tool: ToolDescriptor) -> Self {
        self.insert(tool);
        self
    }

    /// Add a tool. Returns the descriptor it replaced, if any.
    pub fn insert(&mut self, tool: ToolDescriptor) -> Option<ToolDescriptor> {
        self.tools.insert(tool.name.clone(), tool)
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn all(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(|s| s.as_str())
    }

    pub fn write_tools(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.values().filter(|t| t.is_write())
    }

    pub fn read_tools(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.values().filter(|t| !t.is_write())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Descriptors as an owned list, in name order.
    pub fn to_vec(&self) -> Vec<ToolDescriptor> {
        self.tools.values().cloned().collect()
    }
}

/// A call to a tool with concrete (already resolved) arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool_name: String,
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments: Map::new(),
        }
    }

    pub fn with_arguments(mut self, arguments: Map<String, Value>) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }

    /// Get a required string argument or return an error message
    pub fn require_str(&self, key: &str) -> Result<&str, String> {
        self.get_str(key)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| format!("Missing required argument: {}", key))
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.arguments.get(key).and_then(|v| v.as_u64())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.arguments.get(key).and_then(|v| v.as_bool())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert_cases() -> ToolDescriptor {
        ToolDescriptor::new("insert_cases", "Create a case", SideEffectClass::Write)
            .with_parameter(ToolParameter::new("number", "Case number", true))
            .with_parameter(
                ToolParameter::new("client_id", "Owning client", false)
                    .with_kind(ParamKind::Any),
            )
    }

    #[test]
    fn test_descriptor() {
        let tool = insert_cases();
        assert!(tool.is_write());
        assert!(tool.tenant_scoped);
        assert_eq!(tool.parameter("number").unwrap().kind, ParamKind::String);
    }

    #[test]
    fn test_input_schema() {
        let schema = insert_cases().input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["number"]["type"], "string");
        assert!(schema["properties"]["client_id"].get("type").is_none());
        assert_eq!(schema["required"], json!(["number"]));
    }

    #[test]
    fn test_param_kind_accepts() {
        assert!(ParamKind::Integer.accepts(&json!(3)));
        assert!(!ParamKind::Integer.accepts(&json!(3.5)));
        assert!(ParamKind::Number.accepts(&json!(3.5)));
        assert!(!ParamKind::String.accepts(&json!(1)));
        assert!(ParamKind::Any.accepts(&Value::Null));
    }

    #[test]
    fn test_catalog() {
        let catalog = ToolCatalog::new()
            .register(insert_cases())
            .register(ToolDescriptor::new(
                "query_cases",
                "Find cases",
                SideEffectClass::Read,
            ));

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.write_tools().count(), 1);
        assert_eq!(catalog.read_tools().count(), 1);
        assert_eq!(
            catalog.names().collect::<Vec<_>>(),
            vec!["insert_cases", "query_cases"]
        );
        assert!(catalog.get("delete_cases").is_none());
    }

    #[test]
    fn test_tool_call() {
        let call = ToolCall::new("insert_cases")
            .with_arg("number", "123")
            .with_arg("blank", "  ")
            .with_arg("limit", 5);

        assert_eq!(call.get_str("number"), Some("123"));
        assert_eq!(call.require_str("number").unwrap(), "123");
        assert!(call.require_str("blank").is_err());
        assert!(call.require_str("missing").is_err());
        assert_eq!(call.get_u64("limit"), Some(5));
    }
}
