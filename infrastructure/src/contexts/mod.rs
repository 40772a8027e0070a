//! Suspended case contexts on disk.
//!
//! Each session is one pretty-printed JSON file, `<tenant>/<session>.json`,
//! replaced atomically (temp file + rename) on every save. Tenants never
//! share a file, even when their session ids collide.

use async_trait::async_trait;
use counsel_application::ports::case_store::{CaseContextStore, ContextStoreError};
use counsel_domain::{CaseContext, SessionId, TenantId};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct FileCaseContextStore {
    dir: PathBuf,
}

impl FileCaseContextStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn tenant_dir(&self, tenant: &TenantId) -> PathBuf {
        self.dir.join(file_safe(tenant.as_str()))
    }

    fn file_for(&self, tenant: &TenantId, session: &SessionId) -> PathBuf {
        self.tenant_dir(tenant)
            .join(format!("{}.json", file_safe(session.as_str())))
    }
}

fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn io_error(path: &Path, e: impl std::fmt::Display) -> ContextStoreError {
    ContextStoreError(format!("{}: {}", path.display(), e))
}

#[async_trait]
impl CaseContextStore for FileCaseContextStore {
    async fn save(&self, context: &CaseContext) -> Result<(), ContextStoreError> {
        let dir = self.tenant_dir(&context.tenant_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_error(&dir, e))?;

        let path = self.file_for(&context.tenant_id, &context.session_id);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(context).map_err(|e| io_error(&path, e))?;

        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| io_error(&path, e))?;

        debug!(session = %context.session_id, path = %path.display(), "Saved case context");
        Ok(())
    }

    async fn load(
        &self,
        tenant: &TenantId,
        session: &SessionId,
    ) -> Result<Option<CaseContext>, ContextStoreError> {
        let path = self.file_for(tenant, session);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path, e)),
        };
        let context: CaseContext =
            serde_json::from_slice(&bytes).map_err(|e| io_error(&path, e))?;
        // sanitized names can collide; the stored owner is authoritative
        if &context.tenant_id != tenant || &context.session_id != session {
            return Ok(None);
        }
        Ok(Some(context))
    }
}
