//! `start_deliberation`: hands a question to the specialist pipeline.

use async_trait::async_trait;
use counsel_application::ports::sub_orchestration::{DeliberationRequest, SubOrchestrationPort};
use counsel_domain::{
    CaseId, ProviderError, SessionId, SideEffectClass, TenantId, ToolCall, ToolDescriptor,
    ToolError, ToolParameter, ToolProvider,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

pub const START_DELIBERATION: &str = "start_deliberation";

pub fn start_deliberation_definition() -> ToolDescriptor {
    ToolDescriptor::new(
        START_DELIBERATION,
        "Run a multi-specialist deliberation (facts, research, critique, drafting) on a \
         legal question. Returns a recommendation or a clarifying question.",
        SideEffectClass::Write,
    )
    .with_parameter(ToolParameter::new("question", "The question to deliberate", true))
    .with_parameter(ToolParameter::new("case_id", "Case the question concerns", false))
    .with_parameter(ToolParameter::new(
        "session_id",
        "Existing session to continue; a new one is created otherwise",
        false,
    ))
}

pub struct DeliberationToolProvider {
    orchestration: Arc<dyn SubOrchestrationPort>,
}

impl DeliberationToolProvider {
    pub fn new(orchestration: Arc<dyn SubOrchestrationPort>) -> Self {
        Self { orchestration }
    }
}

#[async_trait]
impl ToolProvider for DeliberationToolProvider {
    fn id(&self) -> &str {
        "deliberation"
    }

    fn display_name(&self) -> &str {
        "Deliberation trigger"
    }

    fn priority(&self) -> i32 {
        50
    }

    async fn discover_tools(&self) -> Result<Vec<ToolDescriptor>, ProviderError> {
        Ok(vec![start_deliberation_definition()])
    }

    async fn execute(&self, tenant: &TenantId, call: &ToolCall) -> Result<Value, ToolError> {
        if call.tool_name != START_DELIBERATION {
            return Err(ToolError::not_found(call.tool_name.clone()));
        }
        let question = call.require_str("question").map_err(ToolError::validation)?;
        if question.trim().is_empty() {
            return Err(ToolError::validation("question is empty"));
        }

        let request = DeliberationRequest {
            tenant_id: tenant.clone(),
            session_id: call
                .get_str("session_id")
                .map(SessionId::new)
                .unwrap_or_else(SessionId::generate),
            case_id: call.get_str("case_id").map(CaseId::new),
            question: question.to_string(),
        };
        info!(session = %request.session_id, "Starting deliberation from tool call");

        self.orchestration.deliberate(request).await
    }
}
