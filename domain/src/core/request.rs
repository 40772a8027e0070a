//! Inbound request entity

use super::ids::{CaseId, RequestId, SessionId, TenantId};
use serde::{Deserialize, Serialize};

/// An inbound natural-language request.
///
/// Created once per message and never mutated afterwards; all fields are
/// read through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    id: RequestId,
    tenant_id: TenantId,
    session_id: SessionId,
    raw_text: String,
    case_ref: Option<CaseId>,
}

impl Request {
    pub fn new(
        tenant_id: impl Into<TenantId>,
        session_id: impl Into<SessionId>,
        raw_text: impl Into<String>,
    ) -> Self {
        Self {
            id: RequestId::generate(),
            tenant_id: tenant_id.into(),
            session_id: session_id.into(),
            raw_text: raw_text.into(),
            case_ref: None,
        }
    }

    /// Attach an optional case reference (builder; only usable before sharing).
    pub fn with_case(mut self, case_id: impl Into<CaseId>) -> Self {
        self.case_ref = Some(case_id.into());
        self
    }

    pub fn id(&self) -> &RequestId {
        &self.id
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn case_ref(&self) -> Option<&CaseId> {
        self.case_ref.as_ref()
    }
}
