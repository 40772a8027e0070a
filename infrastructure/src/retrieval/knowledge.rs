//! Hybrid keyword + vector search over record store collections.
//!
//! A collection is an entity plus the text field that is searched. Source
//! ids have the form `<entity>/<row id>`, so a citation can be resolved
//! back to the exact row it came from. Collections of entities that are not
//! tenant scoped are read from the shared partition, so every tenant sees
//! them.

use super::scoring::{cosine, hybrid_score, keyword_score};
use crate::store::SHARED_TENANT;
use async_trait::async_trait;
use counsel_application::ports::record_store::{Record, RecordStore, StoreError};
use counsel_application::ports::retrieval::{
    EmbeddingPort, RetrievalError, RetrievalPort, SearchFilters,
};
use counsel_domain::tool::schema::ID_FIELD;
use counsel_domain::{CaseId, DataSchema, SearchHit, TenantId};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

const CASE_FIELD: &str = "case_id";

/// One searchable entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeCollection {
    pub entity: String,
    pub content_field: String,
    /// False for shared material such as a statutes library
    pub tenant_scoped: bool,
}

impl KnowledgeCollection {
    pub fn new(entity: impl Into<String>, content_field: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            content_field: content_field.into(),
            tenant_scoped: true,
        }
    }

    pub fn with_tenant_scoping(mut self, tenant_scoped: bool) -> Self {
        self.tenant_scoped = tenant_scoped;
        self
    }

    /// Partition that holds this collection's rows for `tenant`.
    fn owner(&self, tenant: &TenantId) -> TenantId {
        if self.tenant_scoped {
            tenant.clone()
        } else {
            TenantId::new(SHARED_TENANT)
        }
    }
}

pub struct KnowledgeBase {
    store: Arc<dyn RecordStore>,
    embedder: Arc<dyn EmbeddingPort>,
    collections: Vec<KnowledgeCollection>,
}

impl KnowledgeBase {
    pub fn new(store: Arc<dyn RecordStore>, embedder: Arc<dyn EmbeddingPort>) -> Self {
        Self {
            store,
            embedder,
            collections: Vec::new(),
        }
    }

    /// Search every entity that declares an embedding field.
    pub fn from_schema(
        schema: &DataSchema,
        store: Arc<dyn RecordStore>,
        embedder: Arc<dyn EmbeddingPort>,
    ) -> Self {
        schema
            .entities
            .iter()
            .filter_map(|e| {
                e.embedding_field
                    .as_ref()
                    .map(|field| {
                        KnowledgeCollection::new(&e.name, field).with_tenant_scoping(e.tenant_scoped)
                    })
            })
            .fold(Self::new(store, embedder), |kb, c| kb.with_collection(c))
    }

    pub fn with_collection(mut self, collection: KnowledgeCollection) -> Self {
        self.collections.push(collection);
        self
    }

    pub fn collections(&self) -> &[KnowledgeCollection] {
        &self.collections
    }

    /// Rank `tenant`'s rows of every collection against `query`.
    pub async fn rank(
        &self,
        query: &str,
        top_k: usize,
        tenant: &TenantId,
        case: Option<&CaseId>,
    ) -> Result<Vec<(SearchHit, Record)>, RetrievalError> {
        if query.trim().is_empty() {
            return Err(RetrievalError::InvalidQuery("query is empty".to_string()));
        }
        let query_vector = self.embedder.embed(query).await?;

        let mut ranked = Vec::new();
        for collection in &self.collections {
            let rows = self
                .store
                .query(
                    &collection.owner(tenant),
                    &collection.entity,
                    &Record::new(),
                    usize::MAX,
                )
                .await
                .map_err(store_error)?;

            for row in rows {
                if !in_case(&row, case) {
                    continue;
                }
                let Some(content) = row.get(&collection.content_field).and_then(Value::as_str)
                else {
                    continue;
                };
                let vector = self.embedder.embed(content).await?;
                let score = hybrid_score(keyword_score(query, content), cosine(&query_vector, &vector));
                if score <= 0.0 {
                    continue;
                }
                let Some(id) = row.get(ID_FIELD).and_then(Value::as_str) else {
                    continue;
                };
                let hit = SearchHit::new(
                    format!("{}/{}", collection.entity, id),
                    content,
                    score,
                );
                ranked.push((hit, row));
            }
        }

        ranked.sort_by(|a, b| b.0.score.total_cmp(&a.0.score));
        ranked.truncate(top_k);
        debug!(query, hits = ranked.len(), "Knowledge search");
        Ok(ranked)
    }
}

/// Rows without a case are general knowledge and match every case.
fn in_case(row: &Record, case: Option<&CaseId>) -> bool {
    match (case, row.get(CASE_FIELD)) {
        (None, _) => true,
        (Some(_), None | Some(Value::Null)) => true,
        (Some(case), Some(value)) => value.as_str() == Some(case.as_str()),
    }
}

fn store_error(e: StoreError) -> RetrievalError {
    RetrievalError::Unavailable(e.to_string())
}

#[async_trait]
impl RetrievalPort for KnowledgeBase {
    async fn search(
        &self,
        query: &str,
        top_k: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<SearchHit>, RetrievalError> {
        Ok(self
            .rank(query, top_k, &filters.tenant_id, filters.case_id.as_ref())
            .await?
            .into_iter()
            .map(|(hit, _)| hit)
            .collect())
    }

    async fn resolve_source(
        &self,
        tenant: &TenantId,
        source_id: &str,
    ) -> Result<Option<SearchHit>, RetrievalError> {
        let Some((entity, id)) = source_id.split_once('/') else {
            return Ok(None);
        };
        let Some(collection) = self.collections.iter().find(|c| c.entity == entity) else {
            return Ok(None);
        };
        let row = self
            .store
            .get(&collection.owner(tenant), entity, id)
            .await
            .map_err(store_error)?;
        Ok(row.and_then(|row| {
            row.get(&collection.content_field)
                .and_then(Value::as_str)
                .map(|content| SearchHit::new(source_id, content, 1.0))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::HashingEmbedder;
    use crate::store::InMemoryRecordStore;
    use crate::tools::EntityToolProvider;
    use counsel_domain::{EntitySchema, FieldKind, FieldSchema, ToolCall, ToolProvider};
    use serde_json::json;

    async fn seeded() -> (KnowledgeBase, String) {
        let store = Arc::new(InMemoryRecordStore::new());
        let tenant = TenantId::new("firm-a");
        let lease = store
            .insert(
                &tenant,
                "documents",
                json!({"title": "Lease", "content": "The limitation period for contract claims is six years", "case_id": "k-1"})
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .await
            .unwrap();
        store
            .insert(
                &tenant,
                "documents",
                json!({"title": "Memo", "content": "Hearing moved to the district court"})
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .await
            .unwrap();
        store
            .insert(
                &TenantId::new("firm-b"),
                "documents",
                json!({"title": "Other", "content": "limitation period contract claims"})
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .await
            .unwrap();

        let kb = KnowledgeBase::from_schema(
            &DataSchema::legal_defaults(),
            store,
            Arc::new(HashingEmbedder::new()),
        );
        (kb, lease[ID_FIELD].as_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_collections_come_from_embedding_fields() {
        let (kb, _) = seeded().await;
        assert_eq!(
            kb.collections(),
            &[KnowledgeCollection::new("documents", "content")]
        );
    }

    #[tokio::test]
    async fn test_search_ranks_relevant_rows_first() {
        let (kb, lease_id) = seeded().await;
        let hits = kb
            .search(
                "limitation period contract",
                5,
                &SearchFilters::for_tenant(TenantId::new("firm-a")),
            )
            .await
            .unwrap();

        assert_eq!(hits[0].source_id, format!("documents/{}", lease_id));
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn test_search_never_crosses_tenants() {
        let (kb, _) = seeded().await;
        let hits = kb
            .search(
                "limitation period contract claims",
                10,
                &SearchFilters::for_tenant(TenantId::new("firm-a")),
            )
            .await
            .unwrap();
        assert!(hits.iter().all(|h| h.content != "limitation period contract claims"));
    }

    #[tokio::test]
    async fn test_case_filter_keeps_general_rows() {
        let (kb, _) = seeded().await;
        let filters = SearchFilters::for_tenant(TenantId::new("firm-a"))
            .with_case(Some(CaseId::new("k-2")));
        let hits = kb.search("hearing court limitation", 10, &filters).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].content.contains("district court"));
    }

    #[tokio::test]
    async fn test_empty_query_is_invalid() {
        let (kb, _) = seeded().await;
        let result = kb
            .search(" ", 5, &SearchFilters::for_tenant(TenantId::new("firm-a")))
            .await;
        assert!(matches!(result, Err(RetrievalError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn test_resolve_source() {
        let (kb, lease_id) = seeded().await;
        let tenant = TenantId::new("firm-a");
        let source = format!("documents/{}", lease_id);

        let hit = kb.resolve_source(&tenant, &source).await.unwrap().unwrap();
        assert!(hit.content.contains("six years"));

        assert!(kb.resolve_source(&TenantId::new("firm-b"), &source).await.unwrap().is_none());
        assert!(kb.resolve_source(&tenant, "documents/missing").await.unwrap().is_none());
        assert!(kb.resolve_source(&tenant, "no-slash").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_shared_collections_are_visible_to_every_tenant() {
        let mut statutes = EntitySchema::new("statutes")
            .with_field(FieldSchema::new("text", FieldKind::Text).required())
            .with_embedding("text");
        statutes.tenant_scoped = false;
        let schema = DataSchema::new(vec![statutes]);

        let store = Arc::new(InMemoryRecordStore::new());
        let embedder = Arc::new(HashingEmbedder::new());
        let tools = EntityToolProvider::new(schema.clone(), store.clone(), embedder.clone());
        let row = tools
            .execute(
                &TenantId::new("firm-a"),
                &ToolCall::new("insert_statutes")
                    .with_arg("text", "Contract claims are barred after six years"),
            )
            .await
            .unwrap();
        let source = format!("statutes/{}", row[ID_FIELD].as_str().unwrap());

        let kb = KnowledgeBase::from_schema(&schema, store, embedder);
        for tenant in ["firm-a", "firm-b"] {
            let hits = kb
                .search(
                    "contract claims six years",
                    5,
                    &SearchFilters::for_tenant(TenantId::new(tenant)),
                )
                .await
                .unwrap();
            assert_eq!(hits.len(), 1);
            assert_eq!(hits[0].source_id, source);
            assert!(
                kb.resolve_source(&TenantId::new(tenant), &source)
                    .await
                    .unwrap()
                    .is_some()
            );
        }
    }
}
