//! PLAN phase.
//!
//! SIMPLE requests offer the model the whole tool catalog; a single tool
//! call becomes a one-step plan and plain text is a direct answer.
//! COMPLEX requests ask for a full plan, either through the `create_plan`
//! tool or as a ```plan block.

use super::RunRequestUseCase;
use super::types::{Planned, RunRequestError};
use crate::ports::model_gateway::ModelGateway;
use crate::ports::tool_executor::ToolExecutorPort;
use crate::use_cases::shared::complete_with_retry;
use counsel_domain::plan::parser::CREATE_PLAN_TOOL;
use counsel_domain::{
    Analysis, Completion, Plan, PlanParseError, PlanningPromptTemplate, Request, Step, ToolCall,
    create_plan_descriptor, parse_plan, parse_plan_call,
};
use tracing::{debug, info};

impl<G, T> RunRequestUseCase<G, T>
where
    G: ModelGateway + ?Sized,
    T: ToolExecutorPort + ?Sized,
{
    pub(super) async fn plan(
        &self,
        request: &Request,
        analysis: &Analysis,
    ) -> Result<Planned, RunRequestError> {
        let goal = request.raw_text();

        if analysis.is_simple() {
            let prompt = format!(
                "{}\n\n{}",
                PlanningPromptTemplate::system(),
                PlanningPromptTemplate::simple(goal)
            );
            let tools = self.tools.catalog().to_vec();
            let completion = self.complete(&prompt, &tools).await?;
            return Ok(match completion {
                Completion::ToolCall { call } => {
                    debug!(tool = %call.tool_name, "Simple request mapped to one tool");
                    Planned::Plan(Plan::single(goal, step_from_call(call)))
                }
                Completion::Text { text } => Planned::Answer(text),
            });
        }

        let prompt = format!(
            "{}\n\n{}",
            PlanningPromptTemplate::system(),
            PlanningPromptTemplate::planning(goal, analysis, self.tools.catalog())
        );
        let completion = self.complete(&prompt, &[create_plan_descriptor()]).await?;

        let planned = match completion {
            Completion::ToolCall { call } if call.tool_name == CREATE_PLAN_TOOL => {
                Planned::Plan(parse_plan_call(&call.arguments)?)
            }
            // the model skipped planning and called a real tool directly
            Completion::ToolCall { call } => Planned::Plan(Plan::single(goal, step_from_call(call))),
            Completion::Text { text } => match parse_plan(&text) {
                Ok(plan) => Planned::Plan(plan),
                Err(PlanParseError::NoPlanFound) => Planned::Answer(text),
                Err(e) => return Err(e.into()),
            },
        };

        if let Planned::Plan(plan) = &planned {
            info!(plan = %plan.id, steps = plan.steps.len(), goal = %plan.goal, "Plan created");
        }
        Ok(planned)
    }

    async fn complete(
        &self,
        prompt: &str,
        tools: &[counsel_domain::ToolDescriptor],
    ) -> Result<Completion, RunRequestError> {
        Ok(complete_with_retry(
            self.gateway.as_ref(),
            prompt,
            Some(tools),
            self.params.model_timeout,
            self.params.retry_budget,
            &self.cancellation_token,
        )
        .await?)
    }
}

fn step_from_call(call: ToolCall) -> Step {
    let description = format!("Call {}", call.tool_name);
    call.arguments
        .into_iter()
        .fold(Step::new(call.tool_name).with_description(description), |step, (k, v)| {
            step.with_literal(k, v)
        })
}
