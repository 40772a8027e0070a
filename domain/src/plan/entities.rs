//! Plan domain entities

use super::value_objects::{ParamValue, Parameters, StepId};
use crate::core::ids::PlanId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors raised while building or mutating a plan
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("Plan has no steps")]
    Empty,

    #[error("Step {step} references {target}, which is not an earlier step")]
    ForwardReference { step: StepId, target: StepId },

    #[error("Step {0} does not exist")]
    UnknownStep(StepId),

    #[error("Step {0} already has a result")]
    ResultAlreadySet(StepId),
}

/// Status of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::InProgress => "in_progress",
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Failed)
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single tool invocation within a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Position within the plan, assigned by [`Plan::new`]
    pub id: StepId,
    /// Tool to invoke
    pub tool_name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Parameters, possibly containing references to earlier steps
    pub parameters: Parameters,
    pub status: StepStatus,
    /// Result, set at most once when the step completes
    pub result: Option<Value>,
    /// Number of executor invocations so far
    pub attempt_count: u32,
    /// Last status message (error text, skip reason, ...)
    pub message: Option<String>,
}

impl Step {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            id: StepId::new(0),
            tool_name: tool_name.into(),
            description: String::new(),
            parameters: Parameters::new(),
            status: StepStatus::Pending,
            result: None,
            attempt_count: 0,
            message: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: ParamValue) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn with_literal(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_param(key, ParamValue::literal(value))
    }

    /// Steps whose results this step consumes.
    pub fn dependencies(&self) -> BTreeSet<StepId> {
        self.parameters
            .values()
            .filter_map(ParamValue::referenced_step)
            .collect()
    }

    pub fn has_dependencies(&self) -> bool {
        self.parameters
            .values()
            .any(|v| v.referenced_step().is_some())
    }

    pub fn mark_in_progress(&mut self) {
        self.status = StepStatus::InProgress;
    }

    /// Record the final result. A completed step's result is never replaced.
    pub fn mark_completed(
        &mut self,
        result: Value,
        message: impl Into<String>,
    ) -> Result<(), PlanError> {
        if self.result.is_some() || self.status == StepStatus::Completed {
            return Err(PlanError::ResultAlreadySet(self.id));
        }
        self.status = StepStatus::Completed;
        self.result = Some(result);
        self.message = Some(message.into());
        Ok(())
    }

    pub fn mark_failed(&mut self, message: impl Into<String>) {
        if self.status == StepStatus::Completed {
            return;
        }
        self.status = StepStatus::Failed;
        self.message = Some(message.into());
    }
}

/// Status of a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    #[default]
    Planning,
    Executing,
    Completed,
    Failed,
}

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Planning => "planning",
            PlanStatus::Executing => "executing",
            PlanStatus::Completed => "completed",
            PlanStatus::Failed => "failed",
        }
    }
}

/// An ordered list of steps whose references only point backwards.
///
/// The plan is a dependency DAG collapsed to one topological order at
/// creation time; [`Plan::new`] rejects any forward or self reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub goal: String,
    pub steps: Vec<Step>,
    pub status: PlanStatus,
    pub current_step_index: usize,
}

impl Plan {
    /// Build a plan, assigning step ids by position and validating references.
    pub fn new(goal: impl Into<String>, steps: Vec<Step>) -> Result<Self, PlanError> {
        if steps.is_empty() {
            return Err(PlanError::Empty);
        }

        let mut steps = steps;
        for (index, step) in steps.iter_mut().enumerate() {
            step.id = StepId::new(index);
        }

        for step in &steps {
            if let Some(target) = step.dependencies().into_iter().find(|d| *d >= step.id) {
                return Err(PlanError::ForwardReference {
                    step: step.id,
                    target,
                });
            }
        }

        Ok(Self {
            id: PlanId::generate(),
            goal: goal.into(),
            steps,
            status: PlanStatus::Planning,
            current_step_index: 0,
        })
    }

    /// The implicit one-step plan used for simple requests.
    pub fn single(goal: impl Into<String>, step: Step) -> Self {
        let mut step = step;
        step.id = StepId::new(0);
        // a lone step cannot reference anything valid, so drop references
        step.parameters
            .retain(|_, value| value.referenced_step().is_none());
        Self {
            id: PlanId::generate(),
            goal: goal.into(),
            steps: vec![step],
            status: PlanStatus::Planning,
            current_step_index: 0,
        }
    }

    pub fn start(&mut self) {
        self.status = PlanStatus::Executing;
        self.current_step_index = 0;
    }

    pub fn step(&self, id: StepId) -> Option<&Step> {
        self.steps.get(id.index())
    }

    pub fn step_mut(&mut self, id: StepId) -> Option<&mut Step> {
        self.steps.get_mut(id.index())
    }

    /// All steps that depend on `id`, directly or transitively.
    pub fn dependents_of(&self, id: StepId) -> BTreeSet<StepId> {
        let mut tainted = BTreeSet::from([id]);
        // backward-only references mean one forward sweep is enough
        for step in self.steps.iter().skip(id.index() + 1) {
            if step.dependencies().iter().any(|d| tainted.contains(d)) {
                tainted.insert(step.id);
            }
        }
        tainted.remove(&id);
        tainted
    }

    /// Mark every not-yet-finished dependent of a failed step as failed.
    ///
    /// Returns the ids that were newly failed. Independent siblings are untouched.
    pub fn fail_dependents(&mut self, failed: StepId) -> Vec<StepId> {
        let dependents = self.dependents_of(failed);
        let mut newly_failed = Vec::new();
        for id in dependents {
            if let Some(step) = self.step_mut(id)
                && !step.status.is_terminal()
            {
                step.mark_failed(format!("blocked: depends on failed step {}", failed));
                newly_failed.push(id);
            }
        }
        newly_failed
    }

    /// Mark every step that has not started as failed (used when the plan aborts).
    pub fn abort_remaining(&mut self, reason: &str) -> Vec<StepId> {
        let mut aborted = Vec::new();
        for step in &mut self.steps {
            if !step.status.is_terminal() {
                step.mark_failed(format!("aborted: {}", reason));
                aborted.push(step.id);
            }
        }
        aborted
    }

    /// Close the plan: completed only if every step completed.
    pub fn finish(&mut self) -> PlanStatus {
        self.status = if self
            .steps
            .iter()
            .all(|s| s.status == StepStatus::Completed)
        {
            PlanStatus::Completed
        } else {
            PlanStatus::Failed
        };
        self.current_step_index = self.steps.len();
        self.status
    }

    pub fn failed_steps(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter().filter(|s| s.status == StepStatus::Failed)
    }

    /// Completion progress (terminal / total)
    pub fn progress(&self) -> (usize, usize) {
        let done = self.steps.iter().filter(|s| s.status.is_terminal()).count();
        (done, self.steps.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::value_objects::FieldPath;
    use serde_json::json;

    fn chain_plan() -> Plan {
        Plan::new(
            "create client then case",
            vec![
                Step::new("insert_clients").with_literal("name", "X"),
                Step::new("insert_cases")
                    .with_param("client_id", ParamValue::step_result(StepId::new(0)))
                    .with_literal("number", "123"),
                Step::new("query_hearings").with_literal("limit", 5),
                Step::new("insert_hearings").with_param(
                    "case_id",
                    ParamValue::step_field(StepId::new(1), FieldPath::parse("id").unwrap()),
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_plan_assigns_positional_ids() {
        let plan = chain_plan();
        for (index, step) in plan.steps.iter().enumerate() {
            assert_eq!(step.id.index(), index);
        }
        assert_eq!(plan.status, PlanStatus::Planning);
    }

    #[test]
    fn test_plan_rejects_forward_reference() {
        let result = Plan::new(
            "bad",
            vec![
                Step::new("a").with_param("x", ParamValue::step_result(StepId::new(1))),
                Step::new("b"),
            ],
        );
        assert_eq!(
            result.unwrap_err(),
            PlanError::ForwardReference {
                step: StepId::new(0),
                target: StepId::new(1)
            }
        );
    }

    #[test]
    fn test_plan_rejects_self_reference() {
        let result = Plan::new(
            "bad",
            vec![Step::new("a").with_param("x", ParamValue::step_result(StepId::new(0)))],
        );
        assert!(matches!(result, Err(PlanError::ForwardReference { .. })));
    }

    #[test]
    fn test_empty_plan_rejected() {
        assert_eq!(Plan::new("nothing", vec![]).unwrap_err(), PlanError::Empty);
    }

    #[test]
    fn test_dependents_are_transitive() {
        let plan = chain_plan();
        let dependents = plan.dependents_of(StepId::new(0));
        assert_eq!(
            dependents.into_iter().collect::<Vec<_>>(),
            vec![StepId::new(1), StepId::new(3)]
        );
    }

    #[test]
    fn test_fail_dependents_leaves_siblings() {
        let mut plan = chain_plan();
        plan.steps[0].mark_failed("upstream down");
        let failed = plan.fail_dependents(StepId::new(0));

        assert_eq!(failed, vec![StepId::new(1), StepId::new(3)]);
        assert_eq!(plan.steps[2].status, StepStatus::Pending);
        assert!(
            plan.steps[3]
                .message
                .as_deref()
                .unwrap()
                .contains("failed step #1")
        );
    }

    #[test]
    fn test_result_set_at_most_once() {
        let mut step = Step::new("insert_clients");
        step.mark_completed(json!({"id": "c-1"}), "ok").unwrap();
        assert_eq!(
            step.mark_completed(json!({"id": "c-2"}), "again"),
            Err(PlanError::ResultAlreadySet(StepId::new(0)))
        );
        assert_eq!(step.result, Some(json!({"id": "c-1"})));

        // a completed step cannot be failed afterwards
        step.mark_failed("late failure");
        assert_eq!(step.status, StepStatus::Completed);
    }

    #[test]
    fn test_finish_reports_failure_when_any_step_failed() {
        let mut plan = chain_plan();
        plan.start();
        for step in &mut plan.steps {
            step.mark_completed(json!({}), "ok").unwrap();
        }
        assert_eq!(plan.finish(), PlanStatus::Completed);

        let mut plan = chain_plan();
        plan.steps[2].mark_failed("boom");
        assert_eq!(plan.finish(), PlanStatus::Failed);
        assert_eq!(plan.failed_steps().count(), 1);
    }

    #[test]
    fn test_single_plan_drops_references() {
        let plan = Plan::single(
            "lookup",
            Step::new("query_clients")
                .with_literal("name", "X")
                .with_param("bogus", ParamValue::step_result(StepId::new(3))),
        );
        assert_eq!(plan.steps.len(), 1);
        assert!(!plan.steps[0].has_dependencies());
        assert!(plan.steps[0].parameters.contains_key("name"));
    }

    #[test]
    fn test_progress() {
        let mut plan = chain_plan();
        assert_eq!(plan.progress(), (0, 4));
        plan.steps[0].mark_completed(json!(1), "ok").unwrap();
        plan.steps[2].mark_failed("x");
        assert_eq!(plan.progress(), (2, 4));
    }
}
