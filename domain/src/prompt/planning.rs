//! Prompt templates for the single-agent path (PLAN phase)

use crate::plan::analysis::Analysis;
use crate::plan::parser::{CREATE_PLAN_TOOL, STEP_REF_KEY};
use crate::tool::entities::ToolCatalog;

/// Templates for planning and simple tool selection
pub struct PlanningPromptTemplate;

impl PlanningPromptTemplate {
    fn tool_descriptions(catalog: &ToolCatalog) -> String {
        catalog
            .all()
            .map(|t| {
                let params = t
                    .parameters
                    .iter()
                    .map(|p| {
                        let required = if p.required { " (required)" } else { "" };
                        format!("    - {}: {}{}", p.name, p.description, required)
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("- **{}** [{}]: {}\n{}", t.name, t.side_effect, t.description, params)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// System prompt for a legal practice assistant.
    pub fn system() -> String {
        "You are the orchestration assistant of a legal practice management system. \
You act only through the tools you are given. Never invent identifiers: \
use the results of earlier steps instead."
            .to_string()
    }

    /// Prompt for a COMPLEX request: produce a multi-step plan.
    pub fn planning(request: &str, analysis: &Analysis, catalog: &ToolCatalog) -> String {
        let entities = analysis
            .entities
            .iter()
            .map(|e| e.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            r#"## Task

Create a plan of tool calls that fulfils the request below.

## Request

{request}

Detected entities: {entities}

## Available Tools

{tools}

## Output Format

Respond with a ```plan block (or call `{create_plan}`) containing JSON:

```plan
{{
  "goal": "one-line summary",
  "steps": [
    {{"tool": "insert_clients", "description": "Create the client", "parameters": {{"name": "X"}}}},
    {{"tool": "insert_cases", "description": "Open the case", "parameters": {{"client_id": {{"{step_ref}": 1}}, "number": "123"}}}}
  ]
}}
```

Rules:
1. Steps run in order. To use the result of an earlier step, write {{"{step_ref}": N}}
   (N is the 1-based step number) or {{"{step_ref}": N, "field": "path.to.field"}}.
2. A step may only reference steps that come before it.
3. Never pass `tenant_id`; it is applied automatically."#,
            request = request,
            entities = if entities.is_empty() { "(none)".to_string() } else { entities },
            tools = Self::tool_descriptions(catalog),
            create_plan = CREATE_PLAN_TOOL,
            step_ref = STEP_REF_KEY,
        )
    }

    /// Prompt for a SIMPLE request: call one tool or answer directly.
    pub fn simple(request: &str) -> String {
        format!(
            r#"## Request

{request}

If one of the available tools answers this request, call it. Otherwise answer directly and concisely."#
        )
    }

    /// Ask the model to turn tool output into a short answer.
    pub fn summarize(request: &str, results: &str) -> String {
        format!(
            r#"## Request

{request}

## Tool Results

{results}

Answer the request using only these results. Report failures plainly."#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::analysis::{ConversationContext, analyze_text};
    use crate::tool::entities::{SideEffectClass, ToolDescriptor, ToolParameter};

    #[test]
    fn test_planning_prompt_lists_tools_and_reference_syntax() {
        let catalog = ToolCatalog::new().register(
            ToolDescriptor::new("insert_clients", "Create a client", SideEffectClass::Write)
                .with_parameter(ToolParameter::new("name", "Client name", true)),
        );
        let analysis =
            analyze_text("create client X then open case 1", &ConversationContext::new()).unwrap();
        let prompt = PlanningPromptTemplate::planning("create client X", &analysis, &catalog);

        assert!(prompt.contains("**insert_clients** [write]"));
        assert!(prompt.contains("- name: Client name (required)"));
        assert!(prompt.contains(r#"{"$step": 1}"#));
        assert!(prompt.contains("client, case"));
    }

    #[test]
    fn test_simple_prompt() {
        assert!(PlanningPromptTemplate::simple("list clients").contains("list clients"));
    }
}
