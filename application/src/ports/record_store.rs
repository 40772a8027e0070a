//! Record store port
//!
//! Tenant-scoped persistence behind the generated entity tools. Every
//! operation takes the tenant explicitly; implementations must never
//! return or touch a row owned by another tenant.

use async_trait::async_trait;
use counsel_domain::TenantId;
use serde_json::{Map, Value};
use thiserror::Error;

/// One persisted row
pub type Record = Map<String, Value>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: String, id: String },

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a row, returning it with its generated `id`.
    async fn insert(&self, tenant: &TenantId, entity: &str, record: Record)
    -> Result<Record, StoreError>;

    /// Rows whose fields equal every entry of `filter`.
    async fn query(
        &self,
        tenant: &TenantId,
        entity: &str,
        filter: &Record,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError>;

    async fn get(&self, tenant: &TenantId, entity: &str, id: &str)
    -> Result<Option<Record>, StoreError>;

    /// Merge `changes` into an existing row, returning the updated row.
    async fn update(
        &self,
        tenant: &TenantId,
        entity: &str,
        id: &str,
        changes: Record,
    ) -> Result<Record, StoreError>;

    async fn delete(&self, tenant: &TenantId, entity: &str, id: &str) -> Result<(), StoreError>;
}
