//! Plan parsing from model responses.
//!
//! Extracts a [`Plan`] from either a `create_plan` tool call or text
//! (` ```plan` fenced blocks or raw JSON). This is the only place where JSON
//! of the shape `{"$step": N, "field": "a.b"}` is turned into a typed
//! [`ParamValue::StepResult`].

use super::entities::{Plan, PlanError, Step};
use super::value_objects::{FieldPath, ParamValue, StepId};
use crate::tool::entities::{ParamKind, SideEffectClass, ToolDescriptor, ToolParameter};
use serde_json::{Map, Value};
use thiserror::Error;

/// Name of the tool the model may call to submit a plan.
pub const CREATE_PLAN_TOOL: &str = "create_plan";

/// Key marking a step reference inside a parameter value.
pub const STEP_REF_KEY: &str = "$step";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanParseError {
    #[error("No plan found in model response")]
    NoPlanFound,

    #[error("Step {index}: {reason}")]
    InvalidStep { index: usize, reason: String },

    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// Descriptor of the `create_plan` tool offered to the model for COMPLEX requests.
pub fn create_plan_descriptor() -> ToolDescriptor {
    ToolDescriptor::new(
        CREATE_PLAN_TOOL,
        "Submit the ordered list of tool calls that fulfils the request",
        SideEffectClass::Read,
    )
    .with_parameter(
        ToolParameter::new("goal", "One-line summary of the plan", true).with_kind(ParamKind::String),
    )
    .with_parameter(
        ToolParameter::new(
            "steps",
            "Steps as {tool, description, parameters}; reference earlier results with {\"$step\": N}",
            true,
        )
        .with_kind(ParamKind::Array),
    )
    .with_tenant_scoping(false)
}

/// Parse a plan from model response text.
///
/// Supports two formats:
/// 1. ` ```plan` (or ` ```json`) fenced code blocks containing JSON
/// 2. Raw JSON (the entire response is valid JSON)
pub fn parse_plan(response: &str) -> Result<Plan, PlanParseError> {
    let mut in_plan_block = false;
    let mut current_block = String::new();

    for line in response.lines() {
        let trimmed = line.trim();
        if trimmed == "```plan" || trimmed == "```json" {
            in_plan_block = true;
            current_block.clear();
        } else if in_plan_block && trimmed == "```" {
            in_plan_block = false;
            if let Ok(parsed) = serde_json::from_str::<Value>(&current_block) {
                return parse_plan_json(&parsed);
            }
        } else if in_plan_block {
            current_block.push_str(line);
            current_block.push('\n');
        }
    }

    match serde_json::from_str::<Value>(response.trim()) {
        Ok(parsed) => parse_plan_json(&parsed),
        Err(_) => Err(PlanParseError::NoPlanFound),
    }
}

/// Parse the arguments of a `create_plan` tool call.
pub fn parse_plan_call(arguments: &Map<String, Value>) -> Result<Plan, PlanParseError> {
    parse_plan_json(&Value::Object(arguments.clone()))
}

/// Parse a plan from a JSON value.
///
/// Expected schema:
/// ```json
/// {
///   "goal": "string",
///   "steps": [
///     { "tool": "insert_clients", "description": "...", "parameters": {"name": "X"} },
///     { "tool": "insert_cases", "parameters": {"client_id": {"$step": 1}} }
///   ]
/// }
/// ```
pub fn parse_plan_json(json: &Value) -> Result<Plan, PlanParseError> {
    let goal = json
        .get("goal")
        .and_then(Value::as_str)
        .ok_or(PlanParseError::NoPlanFound)?;
    let steps_json = json
        .get("steps")
        .and_then(Value::as_array)
        .ok_or(PlanParseError::NoPlanFound)?;

    let steps = steps_json
        .iter()
        .enumerate()
        .map(|(index, step)| parse_step(index, step))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Plan::new(goal, steps)?)
}

fn parse_step(index: usize, json: &Value) -> Result<Step, PlanParseError> {
    let invalid = |reason: &str| PlanParseError::InvalidStep {
        index: index + 1,
        reason: reason.to_string(),
    };

    let tool = json
        .get("tool")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| invalid("missing tool name"))?;

    let mut step = Step::new(tool);
    if let Some(description) = json.get("description").and_then(Value::as_str) {
        step = step.with_description(description);
    }

    match json.get("parameters") {
        None | Some(Value::Null) => {}
        Some(Value::Object(params)) => {
            for (name, value) in params {
                let param = parse_param(value).map_err(|reason| invalid(&reason))?;
                step = step.with_param(name.clone(), param);
            }
        }
        Some(_) => return Err(invalid("parameters must be an object")),
    }

    Ok(step)
}

/// Turn one JSON parameter into a literal or a step reference.
pub fn parse_param(value: &Value) -> Result<ParamValue, String> {
    let Some(obj) = value.as_object() else {
        return Ok(ParamValue::Literal(value.clone()));
    };
    let Some(reference) = obj.get(STEP_REF_KEY) else {
        return Ok(ParamValue::Literal(value.clone()));
    };

    let ordinal = reference
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .and_then(StepId::from_ordinal)
        .ok_or_else(|| format!("invalid step reference {}", reference))?;

    match obj.get("field").and_then(Value::as_str) {
        Some(field) => {
            let path =
                FieldPath::parse(field).ok_or_else(|| format!("invalid field path '{}'", field))?;
            Ok(ParamValue::step_field(ordinal, path))
        }
        None => Ok(ParamValue::step_result(ordinal)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_fenced_plan_with_reference() {
        let response = r#"
Here's the plan:

```plan
{
  "goal": "Create client X and open case 123",
  "steps": [
    {"tool": "insert_clients", "description": "Create client", "parameters": {"name": "X"}},
    {"tool": "insert_cases", "parameters": {"client_id": {"$step": 1}, "number": "123"}}
  ]
}
```
"#;
        let plan = parse_plan(response).unwrap();
        assert_eq!(plan.goal, "Create client X and open case 123");
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[0].description, "Create client");
        assert_eq!(
            plan.steps[1].parameters["client_id"],
            ParamValue::step_result(StepId::new(0))
        );
        assert_eq!(
            plan.steps[1].parameters["number"],
            ParamValue::literal("123")
        );
    }

    #[test]
    fn test_parse_raw_json_with_field_path() {
        let response = r#"{"goal": "g", "steps": [
            {"tool": "query_clients", "parameters": {"name": "X"}},
            {"tool": "insert_cases", "parameters": {"client_id": {"$step": 1, "field": "rows.0.id"}}}
        ]}"#;
        let plan = parse_plan(response).unwrap();
        assert_eq!(
            plan.steps[1].parameters["client_id"],
            ParamValue::step_field(StepId::new(0), FieldPath::parse("rows.0.id").unwrap())
        );
    }

    #[test]
    fn test_plain_text_has_no_plan() {
        assert_eq!(
            parse_plan("I'd be happy to help with that."),
            Err(PlanParseError::NoPlanFound)
        );
    }

    #[test]
    fn test_forward_reference_rejected() {
        let response = r#"{"goal": "g", "steps": [
            {"tool": "a", "parameters": {"x": {"$step": 2}}},
            {"tool": "b"}
        ]}"#;
        assert!(matches!(
            parse_plan(response),
            Err(PlanParseError::Plan(PlanError::ForwardReference { .. }))
        ));
    }

    #[test]
    fn test_empty_steps_rejected() {
        assert_eq!(
            parse_plan(r#"{"goal": "g", "steps": []}"#),
            Err(PlanParseError::Plan(PlanError::Empty))
        );
    }

    #[test]
    fn test_invalid_step_reported_with_ordinal() {
        let err = parse_plan(r#"{"goal": "g", "steps": [{"tool": "a"}, {"parameters": {}}]}"#)
            .unwrap_err();
        assert!(matches!(err, PlanParseError::InvalidStep { index: 2, .. }));

        let err = parse_param(&json!({"$step": 0})).unwrap_err();
        assert!(err.contains("invalid step reference"));
    }

    #[test]
    fn test_object_without_marker_is_literal() {
        let value = json!({"street": "Main", "step": 1});
        assert_eq!(parse_param(&value).unwrap(), ParamValue::Literal(value));
    }

    #[test]
    fn test_parse_plan_call() {
        let args = json!({"goal": "g", "steps": [{"tool": "query_cases"}]});
        let plan = parse_plan_call(args.as_object().unwrap()).unwrap();
        assert_eq!(plan.steps[0].tool_name, "query_cases");
    }
}
