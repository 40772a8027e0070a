//! Process-local, tenant-scoped record store.
//!
//! Every row carries its owner in `tenant_id`; every read and write
//! filters on it first, so a caller can only ever see its own rows.

use async_trait::async_trait;
use counsel_application::ports::record_store::{Record, RecordStore, StoreError};
use counsel_domain::TenantId;
use counsel_domain::tool::schema::{ID_FIELD, TENANT_FIELD};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::RwLock;
use tracing::debug;

/// One line of a seed file
#[derive(Debug, Deserialize)]
struct SeedRow {
    tenant: String,
    entity: String,
    record: Record,
}

#[derive(Default)]
pub struct InMemoryRecordStore {
    tables: RwLock<HashMap<String, Vec<Record>>>,
    /// Accepted entity names; any name when `None`
    entities: Option<HashSet<String>>,
}

impl InMemoryRecordStore {
    /// A store that accepts any entity name.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that only accepts the given entities.
    pub fn with_entities<I, S>(entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tables: RwLock::new(HashMap::new()),
            entities: Some(entities.into_iter().map(Into::into).collect()),
        }
    }

    /// Load rows from a JSONL file of `{"tenant", "entity", "record"}` lines.
    ///
    /// Returns the number of rows inserted.
    pub fn load_jsonl(&self, path: &Path) -> Result<usize, StoreError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Unavailable(format!("{}: {}", path.display(), e)))?;

        let mut count = 0;
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let row: SeedRow = serde_json::from_str(line).map_err(|e| {
                StoreError::Unavailable(format!("{} line {}: {}", path.display(), number + 1, e))
            })?;
            self.insert_row(&TenantId::new(row.tenant), &row.entity, row.record)?;
            count += 1;
        }
        debug!(path = %path.display(), rows = count, "Seeded record store");
        Ok(count)
    }

    fn check_entity(&self, entity: &str) -> Result<(), StoreError> {
        match &self.entities {
            Some(known) if !known.contains(entity) => {
                Err(StoreError::UnknownEntity(entity.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn insert_row(
        &self,
        tenant: &TenantId,
        entity: &str,
        mut record: Record,
    ) -> Result<Record, StoreError> {
        self.check_entity(entity)?;
        record.insert(
            ID_FIELD.to_string(),
            Value::String(uuid::Uuid::new_v4().to_string()),
        );
        record.insert(TENANT_FIELD.to_string(), Value::String(tenant.to_string()));

        let mut tables = self
            .tables
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        tables
            .entry(entity.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }
}

fn owned_by(record: &Record, tenant: &TenantId) -> bool {
    record.get(TENANT_FIELD).and_then(Value::as_str) == Some(tenant.as_str())
}

fn has_id(record: &Record, id: &str) -> bool {
    record.get(ID_FIELD).and_then(Value::as_str) == Some(id)
}

fn not_found(entity: &str, id: &str) -> StoreError {
    StoreError::NotFound {
        entity: entity.to_string(),
        id: id.to_string(),
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert(
        &self,
        tenant: &TenantId,
        entity: &str,
        record: Record,
    ) -> Result<Record, StoreError> {
        self.insert_row(tenant, entity, record)
    }

    async fn query(
        &self,
        tenant: &TenantId,
        entity: &str,
        filter: &Record,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError> {
        self.check_entity(entity)?;
        let tables = self
            .tables
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(tables
            .get(entity)
            .into_iter()
            .flatten()
            .filter(|r| owned_by(r, tenant))
            .filter(|r| filter.iter().all(|(k, v)| r.get(k) == Some(v)))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get(
        &self,
        tenant: &TenantId,
        entity: &str,
        id: &str,
    ) -> Result<Option<Record>, StoreError> {
        self.check_entity(entity)?;
        let tables = self
            .tables
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(tables
            .get(entity)
            .into_iter()
            .flatten()
            .find(|r| owned_by(r, tenant) && has_id(r, id))
            .cloned())
    }

    async fn update(
        &self,
        tenant: &TenantId,
        entity: &str,
        id: &str,
        changes: Record,
    ) -> Result<Record, StoreError> {
        self.check_entity(entity)?;
        let mut tables = self
            .tables
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let row = tables
            .get_mut(entity)
            .and_then(|rows| {
                rows.iter_mut()
                    .find(|r| owned_by(r, tenant) && has_id(r, id))
            })
            .ok_or_else(|| not_found(entity, id))?;

        for (key, value) in changes {
            if key != ID_FIELD && key != TENANT_FIELD {
                row.insert(key, value);
            }
        }
        Ok(row.clone())
    }

    async fn delete(&self, tenant: &TenantId, entity: &str, id: &str) -> Result<(), StoreError> {
        self.check_entity(entity)?;
        let mut tables = self
            .tables
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let rows = tables
            .get_mut(entity)
            .ok_or_else(|| not_found(entity, id))?;
        let position = rows
            .iter()
            .position(|r| owned_by(r, tenant) && has_id(r, id))
            .ok_or_else(|| not_found(entity, id))?;
        rows.remove(position);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn id_of(record: &Record) -> String {
        record[ID_FIELD].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_insert_stamps_id_and_tenant() {
        let store = InMemoryRecordStore::new();
        let tenant = TenantId::new("firm-a");

        let row = store
            .insert(&tenant, "clients", record(json!({"name": "X"})))
            .await
            .unwrap();

        assert!(!id_of(&row).is_empty());
        assert_eq!(row[TENANT_FIELD], "firm-a");
        assert_eq!(row["name"], "X");
    }

    #[tokio::test]
    async fn test_tenants_are_isolated() {
        let store = InMemoryRecordStore::new();
        let a = TenantId::new("firm-a");
        let b = TenantId::new("firm-b");
        let row = store
            .insert(&a, "clients", record(json!({"name": "Acme"})))
            .await
            .unwrap();
        let id = id_of(&row);

        assert!(store.query(&b, "clients", &Record::new(), 50).await.unwrap().is_empty());
        assert!(store.get(&b, "clients", &id).await.unwrap().is_none());
        assert!(matches!(
            store.update(&b, "clients", &id, record(json!({"name": "Hijacked"}))).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete(&b, "clients", &id).await,
            Err(StoreError::NotFound { .. })
        ));

        let still_there = store.get(&a, "clients", &id).await.unwrap().unwrap();
        assert_eq!(still_there["name"], "Acme");
    }

    #[tokio::test]
    async fn test_query_filters_and_limits() {
        let store = InMemoryRecordStore::new();
        let tenant = TenantId::new("t");
        for (number, status) in [("1", "open"), ("2", "closed"), ("3", "open")] {
            store
                .insert(&tenant, "cases", record(json!({"number": number, "status": status})))
                .await
                .unwrap();
        }

        let open = store
            .query(&tenant, "cases", &record(json!({"status": "open"})), 50)
            .await
            .unwrap();
        assert_eq!(open.len(), 2);

        let limited = store.query(&tenant, "cases", &Record::new(), 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_update_cannot_change_owner_or_id() {
        let store = InMemoryRecordStore::new();
        let tenant = TenantId::new("t");
        let row = store
            .insert(&tenant, "cases", record(json!({"status": "open"})))
            .await
            .unwrap();
        let id = id_of(&row);

        let updated = store
            .update(
                &tenant,
                "cases",
                &id,
                record(json!({"status": "closed", "tenant_id": "other", "id": "x"})),
            )
            .await
            .unwrap();

        assert_eq!(updated["status"], "closed");
        assert_eq!(updated[TENANT_FIELD], "t");
        assert_eq!(id_of(&updated), id);
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let store = InMemoryRecordStore::new();
        let tenant = TenantId::new("t");
        let row = store
            .insert(&tenant, "notes", record(json!({"content": "call back"})))
            .await
            .unwrap();

        store.delete(&tenant, "notes", &id_of(&row)).await.unwrap();

        assert!(store.get(&tenant, "notes", &id_of(&row)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_entity_rejected_when_restricted() {
        let store = InMemoryRecordStore::with_entities(["clients"]);
        let result = store
            .insert(&TenantId::new("t"), "invoices", Record::new())
            .await;
        assert_eq!(result, Err(StoreError::UnknownEntity("invoices".into())));
    }

    #[tokio::test]
    async fn test_load_jsonl_seed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"tenant": "firm-a", "entity": "documents", "record": {{"title": "Lease", "content": "rent due monthly"}}}}"#
        )
        .unwrap();
        writeln!(file).unwrap();
        let store = InMemoryRecordStore::new();

        assert_eq!(store.load_jsonl(file.path()).unwrap(), 1);
        let rows = store
            .query(&TenantId::new("firm-a"), "documents", &Record::new(), 10)
            .await
            .unwrap();
        assert_eq!(rows[0]["title"], "Lease");
    }
}
