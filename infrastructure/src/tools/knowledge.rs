//! `knowledge_search`: tenant-filtered hybrid search over the knowledge base.

use super::entity::retrieval_error;
use async_trait::async_trait;
use counsel_application::ports::retrieval::{RetrievalPort, SearchFilters};
use counsel_domain::tool::schema::DEFAULT_SEARCH_TOP_K;
use counsel_domain::{
    CaseId, ParamKind, ProviderError, SideEffectClass, TenantId, ToolCall, ToolDescriptor,
    ToolError, ToolParameter, ToolProvider,
};
use serde_json::{Value, json};
use std::sync::Arc;

pub const KNOWLEDGE_SEARCH: &str = "knowledge_search";

pub fn knowledge_search_definition() -> ToolDescriptor {
    ToolDescriptor::new(
        KNOWLEDGE_SEARCH,
        "Search the firm's knowledge base (documents, precedents, notes). \
         Returns ranked passages with their source ids.",
        SideEffectClass::Read,
    )
    .with_parameter(ToolParameter::new("query", "What to look for", true))
    .with_parameter(
        ToolParameter::new(
            "top_k",
            format!("Number of passages (default {})", DEFAULT_SEARCH_TOP_K),
            false,
        )
        .with_kind(ParamKind::Integer),
    )
    .with_parameter(ToolParameter::new(
        "case_id",
        "Restrict to one case; general material is always included",
        false,
    ))
}

pub struct KnowledgeToolProvider {
    retrieval: Arc<dyn RetrievalPort>,
}

impl KnowledgeToolProvider {
    pub fn new(retrieval: Arc<dyn RetrievalPort>) -> Self {
        Self { retrieval }
    }
}

#[async_trait]
impl ToolProvider for KnowledgeToolProvider {
    fn id(&self) -> &str {
        "knowledge"
    }

    fn display_name(&self) -> &str {
        "Knowledge search"
    }

    fn priority(&self) -> i32 {
        50
    }

    async fn discover_tools(&self) -> Result<Vec<ToolDescriptor>, ProviderError> {
        Ok(vec![knowledge_search_definition()])
    }

    async fn execute(&self, tenant: &TenantId, call: &ToolCall) -> Result<Value, ToolError> {
        if call.tool_name != KNOWLEDGE_SEARCH {
            return Err(ToolError::not_found(call.tool_name.clone()));
        }
        let query = call.require_str("query").map_err(ToolError::validation)?;
        let top_k = call.get_u64("top_k").unwrap_or(DEFAULT_SEARCH_TOP_K) as usize;
        let filters = SearchFilters::for_tenant(tenant.clone())
            .with_case(call.get_str("case_id").map(CaseId::new));

        let hits = self
            .retrieval
            .search(query, top_k, &filters)
            .await
            .map_err(retrieval_error)?;

        Ok(json!({ "query": query, "results": hits }))
    }
}
