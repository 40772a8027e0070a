//! Generated entity tools
//!
//! One provider serves every CRUD and search operation derived from the
//! [`DataSchema`]. The tool name alone decides the operation and entity
//! (`query_cases` → `Query` on `cases`), so adding an entity to the schema
//! adds its tools without any code here.

use crate::retrieval::{KnowledgeBase, KnowledgeCollection};
use crate::store::SHARED_TENANT;
use async_trait::async_trait;
use counsel_application::ports::record_store::{Record, RecordStore, StoreError};
use counsel_application::ports::retrieval::{EmbeddingPort, RetrievalError};
use counsel_domain::tool::schema::{DEFAULT_QUERY_LIMIT, DEFAULT_SEARCH_TOP_K, ID_FIELD};
use counsel_domain::{
    DataSchema, EntitySchema, OperationKind, ProviderError, TenantId, ToolCall, ToolDescriptor,
    ToolError, ToolProvider,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;

pub struct EntityToolProvider {
    schema: DataSchema,
    store: Arc<dyn RecordStore>,
    embedder: Arc<dyn EmbeddingPort>,
}

impl EntityToolProvider {
    pub fn new(
        schema: DataSchema,
        store: Arc<dyn RecordStore>,
        embedder: Arc<dyn EmbeddingPort>,
    ) -> Self {
        Self {
            schema,
            store,
            embedder,
        }
    }

    pub fn schema(&self) -> &DataSchema {
        &self.schema
    }

    async fn insert(
        &self,
        owner: &TenantId,
        entity: &EntitySchema,
        call: &ToolCall,
    ) -> Result<Value, ToolError> {
        let row = self
            .store
            .insert(owner, &entity.name, call.arguments.clone())
            .await
            .map_err(store_error)?;
        Ok(Value::Object(row))
    }

    async fn query(
        &self,
        owner: &TenantId,
        entity: &EntitySchema,
        call: &ToolCall,
    ) -> Result<Value, ToolError> {
        let limit = call.get_u64("limit").unwrap_or(DEFAULT_QUERY_LIMIT) as usize;
        let filter: Record = call
            .arguments
            .iter()
            .filter(|(k, _)| k.as_str() != "limit")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let rows = self
            .store
            .query(owner, &entity.name, &filter, limit)
            .await
            .map_err(store_error)?;
        Ok(Value::Array(rows.into_iter().map(Value::Object).collect()))
    }

    async fn update(
        &self,
        owner: &TenantId,
        entity: &EntitySchema,
        call: &ToolCall,
    ) -> Result<Value, ToolError> {
        let id = call.require_str(ID_FIELD).map_err(ToolError::validation)?;
        let changes: Record = call
            .arguments
            .iter()
            .filter(|(k, _)| k.as_str() != ID_FIELD)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if changes.is_empty() {
            return Err(ToolError::validation(format!(
                "update_{} needs at least one field to change",
                entity.name
            )));
        }

        let row = self
            .store
            .update(owner, &entity.name, id, changes)
            .await
            .map_err(store_error)?;
        Ok(Value::Object(row))
    }

    async fn delete(
        &self,
        owner: &TenantId,
        entity: &EntitySchema,
        call: &ToolCall,
    ) -> Result<Value, ToolError> {
        let id = call.require_str(ID_FIELD).map_err(ToolError::validation)?;
        self.store
            .delete(owner, &entity.name, id)
            .await
            .map_err(store_error)?;
        Ok(json!({ "id": id, "deleted": true }))
    }

    async fn search(
        &self,
        owner: &TenantId,
        entity: &EntitySchema,
        call: &ToolCall,
    ) -> Result<Value, ToolError> {
        let Some(field) = entity.embedding_field.as_deref() else {
            return Err(ToolError::not_found(format!("search_{}", entity.name)));
        };
        let query = call.require_str("query").map_err(ToolError::validation)?;
        let top_k = call.get_u64("top_k").unwrap_or(DEFAULT_SEARCH_TOP_K) as usize;

        let collection =
            KnowledgeCollection::new(&entity.name, field).with_tenant_scoping(entity.tenant_scoped);
        let ranked = KnowledgeBase::new(self.store.clone(), self.embedder.clone())
            .with_collection(collection)
            .rank(query, top_k, owner, None)
            .await
            .map_err(retrieval_error)?;

        Ok(Value::Array(
            ranked
                .into_iter()
                .map(|(hit, mut row)| {
                    row.insert("score".to_string(), json!(hit.score));
                    Value::Object(row)
                })
                .collect(),
        ))
    }
}

fn describe(entity: &EntitySchema) -> Value {
    json!({
        "entity": entity.name,
        "description": entity.description,
        "tenant_scoped": entity.tenant_scoped,
        "embedding_field": entity.embedding_field,
        "fields": entity.fields,
    })
}

pub(crate) fn store_error(e: StoreError) -> ToolError {
    match e {
        StoreError::NotFound { entity, id } => ToolError::not_found(format!("{} '{}'", entity, id)),
        StoreError::UnknownEntity(entity) => ToolError::not_found(entity),
        StoreError::Unavailable(message) => ToolError::transient(message),
    }
}

pub(crate) fn retrieval_error(e: RetrievalError) -> ToolError {
    match e {
        RetrievalError::InvalidQuery(message) => ToolError::validation(message),
        RetrievalError::Unavailable(message) => ToolError::transient(message),
        RetrievalError::Timeout => ToolError::timeout("retrieval", 0),
    }
}

#[async_trait]
impl ToolProvider for EntityToolProvider {
    fn id(&self) -> &str {
        "entity"
    }

    fn display_name(&self) -> &str {
        "Schema-generated data tools"
    }

    async fn discover_tools(&self) -> Result<Vec<ToolDescriptor>, ProviderError> {
        self.schema
            .validate()
            .map_err(|e| ProviderError::ConfigurationError(e.to_string()))?;
        Ok(self.schema.descriptors())
    }

    async fn execute(&self, tenant: &TenantId, call: &ToolCall) -> Result<Value, ToolError> {
        let Some((operation, entity_name)) = OperationKind::from_tool_name(&call.tool_name) else {
            return Err(ToolError::not_found(call.tool_name.clone()));
        };
        let Some(entity) = self.schema.entity(entity_name) else {
            return Err(ToolError::not_found(call.tool_name.clone()));
        };

        let shared = TenantId::new(SHARED_TENANT);
        let owner = if entity.tenant_scoped { tenant } else { &shared };
        debug!(tool = %call.tool_name, operation = %operation, "Executing entity tool");

        match operation {
            OperationKind::Insert => self.insert(owner, entity, call).await,
            OperationKind::Query => self.query(owner, entity, call).await,
            OperationKind::GetSchema => Ok(describe(entity)),
            OperationKind::Update => self.update(owner, entity, call).await,
            OperationKind::Delete => self.delete(owner, entity, call).await,
            OperationKind::VectorSearch => self.search(owner, entity, call).await,
        }
    }
}
