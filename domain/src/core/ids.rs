//! Strongly typed identifiers.
//!
//! Every identifier is a thin wrapper around a `String` so that a tenant id
//! can never be passed where a session id is expected.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generates a fresh random identifier.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&String> for $name {
            fn from(s: &String) -> Self {
                Self::new(s.as_str())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Isolation boundary (a lawyer or firm). Every data operation is scoped to one.
    TenantId
);

string_id!(
    /// Conversation session; deliberation rounds are grouped by session.
    SessionId
);

string_id!(
    /// One inbound message.
    RequestId
);

string_id!(
    /// One plan produced for a complex request.
    PlanId
);

string_id!(
    /// A legal case known to the record store.
    CaseId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_distinct_types() {
        let tenant = TenantId::new("firm-a");
        let session: SessionId = "s-1".into();
        assert_eq!(tenant.as_str(), "firm-a");
        assert_eq!(session.to_string(), "s-1");
    }

    #[test]
    fn test_generate_is_unique() {
        assert_ne!(PlanId::generate(), PlanId::generate());
    }

    #[test]
    fn test_serializes_transparently() {
        let id = CaseId::new("case-123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"case-123\"");
    }
}
