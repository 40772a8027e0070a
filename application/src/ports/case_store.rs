//! Case context store port
//!
//! Persists a [`CaseContext`] while its deliberation is suspended on a
//! clarifying question, so that a later `resume` can pick it up.
//! Contexts are keyed by `(tenant, session)`; a load under another
//! tenant finds nothing.

use async_trait::async_trait;
use counsel_domain::{CaseContext, SessionId, TenantId};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Case context store error: {0}")]
pub struct ContextStoreError(pub String);

#[async_trait]
pub trait CaseContextStore: Send + Sync {
    async fn save(&self, context: &CaseContext) -> Result<(), ContextStoreError>;

    async fn load(
        &self,
        tenant: &TenantId,
        session: &SessionId,
    ) -> Result<Option<CaseContext>, ContextStoreError>;
}

/// Process-local store, used when no persistent location is configured.
#[derive(Default)]
pub struct InMemoryCaseContextStore {
    contexts: Mutex<HashMap<(TenantId, SessionId), CaseContext>>,
}

impl InMemoryCaseContextStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CaseContextStore for InMemoryCaseContextStore {
    async fn save(&self, context: &CaseContext) -> Result<(), ContextStoreError> {
        self.contexts
            .lock()
            .map_err(|e| ContextStoreError(e.to_string()))?
            .insert(
                (context.tenant_id.clone(), context.session_id.clone()),
                context.clone(),
            );
        Ok(())
    }

    async fn load(
        &self,
        tenant: &TenantId,
        session: &SessionId,
    ) -> Result<Option<CaseContext>, ContextStoreError> {
        Ok(self
            .contexts
            .lock()
            .map_err(|e| ContextStoreError(e.to_string()))?
            .get(&(tenant.clone(), session.clone()))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_roundtrip() {
        let store = InMemoryCaseContextStore::new();
        let tenant = TenantId::new("t");
        let context = CaseContext::new(tenant.clone(), SessionId::new("s"), "q");
        store.save(&context).await.unwrap();
        assert_eq!(store.load(&tenant, &SessionId::new("s")).await.unwrap(), Some(context));
        assert_eq!(store.load(&tenant, &SessionId::new("other")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_same_session_id_is_separate_per_tenant() {
        let store = InMemoryCaseContextStore::new();
        let session = SessionId::new("s-shared");
        let a = CaseContext::new(TenantId::new("firm-a"), session.clone(), "A's question");
        let b = CaseContext::new(TenantId::new("firm-b"), session.clone(), "B's question");
        store.save(&a).await.unwrap();
        store.save(&b).await.unwrap();

        let loaded = store.load(&TenantId::new("firm-a"), &session).await.unwrap().unwrap();
        assert_eq!(loaded.question, "A's question");
        assert_eq!(loaded.tenant_id, TenantId::new("firm-a"));
        assert_eq!(store.load(&TenantId::new("firm-c"), &session).await.unwrap(), None);
    }
}
