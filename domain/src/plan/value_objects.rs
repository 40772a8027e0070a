//! Plan value objects.
//!
//! # Step references
//!
//! A step parameter is either a literal JSON value or a typed reference to
//! the result of an earlier step ([`ParamValue::StepResult`]). References are
//! created once, when a plan is parsed, and resolved by
//! [`DependencyResolver`](super::resolver::DependencyResolver). No call site
//! ever pattern-matches on placeholder strings.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Position of a step within its plan (0-based).
///
/// Displayed 1-based (`#1`, `#2`, ...) because that is how steps are
/// presented to the model and to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(usize);

impl StepId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Build from the 1-based number used in prompts. `0` is rejected.
    pub fn from_ordinal(ordinal: usize) -> Option<Self> {
        ordinal.checked_sub(1).map(Self)
    }

    pub fn index(&self) -> usize {
        self.0
    }

    pub fn ordinal(&self) -> usize {
        self.0 + 1
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.ordinal())
    }
}

/// Dotted path into a structured step result (e.g. `client.id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Parse a dotted path. Empty segments are rejected.
    pub fn parse(path: &str) -> Option<Self> {
        let segments: Vec<String> = path.split('.').map(|s| s.trim().to_string()).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return None;
        }
        Some(Self(segments))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Walk `value` along this path.
    pub fn lookup<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        self.0.iter().try_fold(value, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// A step parameter: a literal, or the (possibly projected) result of an earlier step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ParamValue {
    Literal(Value),
    StepResult {
        step: StepId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<FieldPath>,
    },
}

impl ParamValue {
    pub fn literal(value: impl Into<Value>) -> Self {
        ParamValue::Literal(value.into())
    }

    /// Reference the result of `step`, using the identifier-extraction rule.
    pub fn step_result(step: StepId) -> Self {
        ParamValue::StepResult { step, path: None }
    }

    /// Reference one field of the result of `step`.
    pub fn step_field(step: StepId, path: FieldPath) -> Self {
        ParamValue::StepResult {
            step,
            path: Some(path),
        }
    }

    /// The step this value depends on, if any.
    pub fn referenced_step(&self) -> Option<StepId> {
        match self {
            ParamValue::Literal(_) => None,
            ParamValue::StepResult { step, .. } => Some(*step),
        }
    }
}

/// Named parameters of a step, in stable order.
pub type Parameters = BTreeMap<String, ParamValue>;
