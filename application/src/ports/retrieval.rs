//! Retrieval port
//!
//! `search(query, top_k, filters) → ranked list of {content, source_id, score}`.
//! Ranking (keyword, vector, or hybrid) is opaque to the orchestrator.

use async_trait::async_trait;
use counsel_domain::{CaseId, SearchHit, TenantId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetrievalError {
    #[error("Retrieval unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Retrieval timed out")]
    Timeout,
}

impl RetrievalError {
    pub fn is_transient(&self) -> bool {
        matches!(self, RetrievalError::Unavailable(_) | RetrievalError::Timeout)
    }
}

/// Filters applied to every search. The tenant is mandatory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilters {
    pub tenant_id: TenantId,
    pub case_id: Option<CaseId>,
}

impl SearchFilters {
    pub fn for_tenant(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            case_id: None,
        }
    }

    pub fn with_case(mut self, case_id: Option<CaseId>) -> Self {
        self.case_id = case_id;
        self
    }
}

#[async_trait]
pub trait RetrievalPort: Send + Sync {
    async fn search(
        &self,
        query: &str,
        top_k: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<SearchHit>, RetrievalError>;

    /// Look up a source by id, for citation verification.
    async fn resolve_source(
        &self,
        tenant: &TenantId,
        source_id: &str,
    ) -> Result<Option<SearchHit>, RetrievalError>;
}

/// Text embedding used for vector similarity
#[async_trait]
pub trait EmbeddingPort: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError>;
}
