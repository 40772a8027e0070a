//! Long-horizon, per-tenant memory: `remember` and `recall_memory`.
//!
//! Memories live in the record store under [`MEMORY_ENTITY`] and are
//! recalled with the same hybrid ranking as knowledge search.

use super::entity::{retrieval_error, store_error};
use crate::retrieval::{KnowledgeBase, KnowledgeCollection};
use async_trait::async_trait;
use chrono::Utc;
use counsel_application::ports::record_store::{Record, RecordStore};
use counsel_application::ports::retrieval::EmbeddingPort;
use counsel_domain::{
    ParamKind, ProviderError, SideEffectClass, TenantId, ToolCall, ToolDescriptor, ToolError,
    ToolParameter, ToolProvider,
};
use serde_json::{Value, json};
use std::sync::Arc;

pub const MEMORY_ENTITY: &str = "memories";
pub const REMEMBER: &str = "remember";
pub const RECALL_MEMORY: &str = "recall_memory";

const DEFAULT_RECALL_LIMIT: u64 = 5;

pub fn remember_definition() -> ToolDescriptor {
    ToolDescriptor::new(
        REMEMBER,
        "Store a fact or preference to recall in later conversations.",
        SideEffectClass::Write,
    )
    .with_parameter(ToolParameter::new("content", "What to remember", true))
    .with_parameter(
        ToolParameter::new("tags", "Optional list of labels", false).with_kind(ParamKind::Array),
    )
}

pub fn recall_memory_definition() -> ToolDescriptor {
    ToolDescriptor::new(
        RECALL_MEMORY,
        "Recall stored memories relevant to a query.",
        SideEffectClass::Read,
    )
    .with_parameter(ToolParameter::new("query", "What to recall", true))
    .with_parameter(
        ToolParameter::new(
            "limit",
            format!("Maximum memories (default {})", DEFAULT_RECALL_LIMIT),
            false,
        )
        .with_kind(ParamKind::Integer),
    )
}

pub struct MemoryToolProvider {
    store: Arc<dyn RecordStore>,
    knowledge: KnowledgeBase,
}

impl MemoryToolProvider {
    pub fn new(store: Arc<dyn RecordStore>, embedder: Arc<dyn EmbeddingPort>) -> Self {
        let knowledge = KnowledgeBase::new(store.clone(), embedder)
            .with_collection(KnowledgeCollection::new(MEMORY_ENTITY, "content"));
        Self { store, knowledge }
    }

    async fn remember(&self, tenant: &TenantId, call: &ToolCall) -> Result<Value, ToolError> {
        let content = call.require_str("content").map_err(ToolError::validation)?;
        if content.trim().is_empty() {
            return Err(ToolError::validation("content is empty"));
        }
        let tags = call.arguments.get("tags").cloned().unwrap_or(json!([]));
        if let Some(bad) = tags
            .as_array()
            .and_then(|tags| tags.iter().find(|t| !t.is_string()))
        {
            return Err(ToolError::validation(format!("tag {} is not a string", bad)));
        }

        let mut record = Record::new();
        record.insert("content".to_string(), json!(content));
        record.insert("tags".to_string(), tags);
        record.insert("remembered_at".to_string(), json!(Utc::now().to_rfc3339()));

        let row = self
            .store
            .insert(tenant, MEMORY_ENTITY, record)
            .await
            .map_err(store_error)?;
        Ok(Value::Object(row))
    }

    async fn recall(&self, tenant: &TenantId, call: &ToolCall) -> Result<Value, ToolError> {
        let query = call.require_str("query").map_err(ToolError::validation)?;
        let limit = call.get_u64("limit").unwrap_or(DEFAULT_RECALL_LIMIT) as usize;

        let ranked = self
            .knowledge
            .rank(query, limit, tenant, None)
            .await
            .map_err(retrieval_error)?;

        let memories: Vec<Value> = ranked
            .into_iter()
            .map(|(hit, row)| {
                json!({
                    "id": row.get("id"),
                    "content": hit.content,
                    "tags": row.get("tags"),
                    "remembered_at": row.get("remembered_at"),
                    "score": hit.score,
                })
            })
            .collect();
        Ok(json!({ "memories": memories }))
    }
}

#[async_trait]
impl ToolProvider for MemoryToolProvider {
    fn id(&self) -> &str {
        "memory"
    }

    fn display_name(&self) -> &str {
        "Tenant memory"
    }

    fn priority(&self) -> i32 {
        50
    }

    async fn discover_tools(&self) -> Result<Vec<ToolDescriptor>, ProviderError> {
        Ok(vec![remember_definition(), recall_memory_definition()])
    }

    async fn execute(&self, tenant: &TenantId, call: &ToolCall) -> Result<Value, ToolError> {
        match call.tool_name.as_str() {
            REMEMBER => self.remember(tenant, call).await,
            RECALL_MEMORY => self.recall(tenant, call).await,
            other => Err(ToolError::not_found(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::HashingEmbedder;
    use crate::store::InMemoryRecordStore;

    fn provider() -> MemoryToolProvider {
        MemoryToolProvider::new(
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(HashingEmbedder::new()),
        )
    }

    #[tokio::test]
    async fn test_remember_then_recall() {
        let provider = provider();
        let tenant = TenantId::new("firm-a");
        provider
            .execute(
                &tenant,
                &ToolCall::new(REMEMBER)
                    .with_arg("content", "Client prefers settlement over trial")
                    .with_arg("tags", json!(["preference"])),
            )
            .await
            .unwrap();

        let result = provider
            .execute(&tenant, &ToolCall::new(RECALL_MEMORY).with_arg("query", "settlement"))
            .await
            .unwrap();
        let memories = result["memories"].as_array().unwrap();
        assert_eq!(memories.len(), 1);
        assert_eq!(memories[0]["tags"], json!(["preference"]));
    }

    #[tokio::test]
    async fn test_memories_are_per_tenant() {
        let provider = provider();
        provider
            .execute(
                &TenantId::new("firm-a"),
                &ToolCall::new(REMEMBER).with_arg("content", "Secret strategy"),
            )
            .await
            .unwrap();

        let result = provider
            .execute(
                &TenantId::new("firm-b"),
                &ToolCall::new(RECALL_MEMORY).with_arg("query", "secret strategy"),
            )
            .await
            .unwrap();
        assert!(result["memories"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_non_string_tags() {
        let err = provider()
            .execute(
                &TenantId::new("firm-a"),
                &ToolCall::new(REMEMBER)
                    .with_arg("content", "x")
                    .with_arg("tags", json!([1])),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Validation { .. }));
    }
}
