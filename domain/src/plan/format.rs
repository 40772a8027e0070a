//! The FORMAT phase: render plan results into a response.
//!
//! Pure functions. A failed step is always reported, never folded into a
//! success message.

use super::entities::{Plan, PlanStatus, StepStatus};
use crate::core::string::truncate;
use serde_json::{Value, json};

const RESULT_PREVIEW_CHARS: usize = 200;

/// Render a finished plan as human-readable text.
pub fn format_plan_result(plan: &Plan) -> String {
    let completed = plan
        .steps
        .iter()
        .filter(|s| s.status == StepStatus::Completed)
        .count();
    let failed = plan.failed_steps().count();

    let headline = match plan.status {
        PlanStatus::Completed => format!("Done: {} ({} steps)", plan.goal, plan.steps.len()),
        _ => format!(
            "Incomplete: {} ({} of {} steps completed, {} failed)",
            plan.goal,
            completed,
            plan.steps.len(),
            failed
        ),
    };

    let mut out = headline;
    for step in &plan.steps {
        let marker = match step.status {
            StepStatus::Completed => "✓",
            StepStatus::Failed => "✗",
            StepStatus::InProgress => "…",
            StepStatus::Pending => "·",
        };
        out.push_str(&format!("\n  {} {} {}", marker, step.id, step.tool_name));
        if !step.description.is_empty() {
            out.push_str(&format!(" ({})", step.description));
        }
        match (&step.result, &step.message) {
            (Some(result), _) if step.status == StepStatus::Completed => {
                out.push_str(&format!(
                    "\n      → {}",
                    truncate(&render_value(result), RESULT_PREVIEW_CHARS)
                ));
            }
            (_, Some(message)) if step.status == StepStatus::Failed => {
                out.push_str(&format!("\n      ! {}", message));
            }
            _ => {}
        }
    }
    out
}

/// Structured form of a finished plan for JSON output.
pub fn plan_result_json(plan: &Plan) -> Value {
    json!({
        "plan_id": plan.id,
        "goal": plan.goal,
        "status": plan.status.as_str(),
        "steps": plan.steps.iter().map(|s| json!({
            "step": s.id.ordinal(),
            "tool": s.tool_name,
            "status": s.status.as_str(),
            "attempts": s.attempt_count,
            "result": s.result,
            "message": s.message,
        })).collect::<Vec<_>>(),
    })
}

/// Compact single-line rendering of a JSON value.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::entities::Step;

    #[test]
    fn test_completed_plan() {
        let mut plan = Plan::new(
            "create client",
            vec![Step::new("insert_clients").with_description("Create X")],
        )
        .unwrap();
        plan.steps[0]
            .mark_completed(json!({"id": "c-1"}), "ok")
            .unwrap();
        plan.finish();

        let text = format_plan_result(&plan);
        assert!(text.starts_with("Done: create client"));
        assert!(text.contains("✓ #1 insert_clients (Create X)"));
        assert!(text.contains(r#"{"id":"c-1"}"#));
    }

    #[test]
    fn test_failure_is_not_masked() {
        let mut plan = Plan::new("two", vec![Step::new("a"), Step::new("b")]).unwrap();
        plan.steps[0].mark_completed(json!("fine"), "ok").unwrap();
        plan.steps[1].mark_failed("upstream unavailable");
        plan.finish();

        let text = format_plan_result(&plan);
        assert!(text.starts_with("Incomplete: two (1 of 2 steps completed, 1 failed)"));
        assert!(text.contains("! upstream unavailable"));

        let json = plan_result_json(&plan);
        assert_eq!(json["status"], "failed");
        assert_eq!(json["steps"][1]["status"], "failed");
    }
}
