//! Dependency resolution for step parameters.
//!
//! Resolution happens immediately before a step executes, against the
//! steps that have already run. A reference that cannot be satisfied is a
//! [`ResolutionError`], which aborts the plan rather than being retried.

use super::entities::{Step, StepStatus};
use super::value_objects::{FieldPath, ParamValue, Parameters, StepId};
use serde_json::{Map, Value};
use thiserror::Error;

/// Why a step reference could not be resolved
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("parameter '{param}' references unknown step {target}")]
    UnknownStep { param: String, target: StepId },

    #[error("parameter '{param}' references step {target}, which does not run before step {step}")]
    ForwardReference {
        param: String,
        step: StepId,
        target: StepId,
    },

    #[error("parameter '{param}' references step {target}, which has not completed")]
    NotCompleted { param: String, target: StepId },

    #[error("parameter '{param}' references missing field '{path}' of step {target}")]
    MissingField {
        param: String,
        target: StepId,
        path: String,
    },
}

impl ResolutionError {
    pub fn param(&self) -> &str {
        match self {
            ResolutionError::UnknownStep { param, .. }
            | ResolutionError::ForwardReference { param, .. }
            | ResolutionError::NotCompleted { param, .. }
            | ResolutionError::MissingField { param, .. } => param,
        }
    }
}

/// Resolves typed step references into concrete JSON values.
pub struct DependencyResolver;

impl DependencyResolver {
    /// Resolve every parameter of `step` against `steps` (the whole plan).
    pub fn resolve_step(step: &Step, steps: &[Step]) -> Result<Map<String, Value>, ResolutionError> {
        Self::resolve_parameters(step.id, &step.parameters, steps)
    }

    pub fn resolve_parameters(
        current: StepId,
        parameters: &Parameters,
        steps: &[Step],
    ) -> Result<Map<String, Value>, ResolutionError> {
        parameters
            .iter()
            .map(|(name, value)| {
                Self::resolve_value(name, current, value, steps).map(|v| (name.clone(), v))
            })
            .collect()
    }

    /// Resolve a single parameter value.
    pub fn resolve_value(
        param: &str,
        current: StepId,
        value: &ParamValue,
        steps: &[Step],
    ) -> Result<Value, ResolutionError> {
        let (target, path) = match value {
            ParamValue::Literal(v) => return Ok(v.clone()),
            ParamValue::StepResult { step, path } => (*step, path.as_ref()),
        };

        if target >= current {
            return Err(ResolutionError::ForwardReference {
                param: param.to_string(),
                step: current,
                target,
            });
        }

        let referenced = steps
            .get(target.index())
            .ok_or_else(|| ResolutionError::UnknownStep {
                param: param.to_string(),
                target,
            })?;

        let result = match (&referenced.status, &referenced.result) {
            (StepStatus::Completed, Some(result)) => result,
            _ => {
                return Err(ResolutionError::NotCompleted {
                    param: param.to_string(),
                    target,
                });
            }
        };

        match path {
            Some(path) => Self::lookup(param, target, path, result),
            None => Ok(extract_identifier(result).clone()),
        }
    }

    fn lookup(
        param: &str,
        target: StepId,
        path: &FieldPath,
        result: &Value,
    ) -> Result<Value, ResolutionError> {
        path.lookup(result)
            .cloned()
            .ok_or_else(|| ResolutionError::MissingField {
                param: param.to_string(),
                target,
                path: path.to_string(),
            })
    }
}

/// Pick the value a bare step reference stands for.
///
/// Objects yield their `id` field, then the first `*_id` field; anything
/// else is passed through whole.
pub fn extract_identifier(result: &Value) -> &Value {
    let Value::Object(map) = result else {
        return result;
    };
    if let Some(id) = map.get("id") {
        return id;
    }
    map.iter()
        .find(|(key, _)| key.ends_with("_id"))
        .map(|(_, v)| v)
        .unwrap_or(result)
}
