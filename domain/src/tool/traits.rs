//! Tool domain traits
//!
//! Contains pure domain logic traits for tool validation.
//! The async ToolExecutorPort is defined in the application layer (ports).

use super::entities::{ToolCall, ToolDescriptor};

/// Validator for tool calls
///
/// This is a pure domain trait that validates tool calls
/// against their descriptors without any I/O operations.
pub trait ToolValidator {
    /// Validate a tool call against its descriptor
    fn validate(&self, call: &ToolCall, descriptor: &ToolDescriptor) -> Result<(), String>;
}

/// Default implementation of ToolValidator
#[derive(Debug, Clone, Default)]
pub struct DefaultToolValidator;

impl ToolValidator for DefaultToolValidator {
    fn validate(&self, call: &ToolCall, descriptor: &ToolDescriptor) -> Result<(), String> {
        for param in &descriptor.parameters {
            match call.arguments.get(&param.name) {
                None | Some(serde_json::Value::Null) if param.required => {
                    return Err(format!(
                        "Missing required parameter '{}' for tool '{}'",
                        param.name, descriptor.name
                    ));
                }
                Some(value) if !value.is_null() && !param.kind.accepts(value) => {
                    return Err(format!(
                        "Parameter '{}' for tool '{}' must be of type {}",
                        param.name,
                        descriptor.name,
                        param.kind.json_type().unwrap_or("any")
                    ));
                }
                _ => {}
            }
        }

        for arg_name in call.arguments.keys() {
            if descriptor.parameter(arg_name).is_none() {
                return Err(format!(
                    "Unknown parameter '{}' for tool '{}'",
                    arg_name, descriptor.name
                ));
            }
        }

        Ok(())
    }
}
