//! Verification ledger port
//!
//! Append-only record of deliberation rounds, partitioned by
//! `(tenant, session)`:
//!
//! - `append(round)`: write-only, durable on return
//! - `read_public(tenant, session)`: ordered rounds with private fields stripped
//! - `read_all(tenant, session)`: full rounds, for human audit
//!
//! A tenant never sees, or appends to, another tenant's session even when
//! both use the same session id. There is no update or delete operation.

use async_trait::async_trait;
use counsel_domain::{AgentRole, DeliberationRound, PublicRound, RoundRef, SessionId, TenantId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Round {round_number} ({role:?}) already recorded for session {session_id}")]
    DuplicateRound {
        session_id: SessionId,
        round_number: u32,
        role: AgentRole,
    },

    #[error("Round {round_number} is not after round {last} in session {session_id}")]
    OutOfOrder {
        session_id: SessionId,
        round_number: u32,
        last: u32,
    },

    #[error("Ledger storage error: {0}")]
    Storage(String),
}

#[async_trait]
pub trait VerificationLedger: Send + Sync {
    /// Record a round. Returns only once the round is durably stored.
    async fn append(&self, round: DeliberationRound) -> Result<RoundRef, LedgerError>;

    /// Peer/aggregator view: rounds in order, monologues removed.
    async fn read_public(
        &self,
        tenant: &TenantId,
        session: &SessionId,
    ) -> Result<Vec<PublicRound>, LedgerError> {
        Ok(self
            .read_all(tenant, session)
            .await?
            .iter()
            .map(DeliberationRound::public_view)
            .collect())
    }

    /// Auditor view: full rounds in order.
    async fn read_all(
        &self,
        tenant: &TenantId,
        session: &SessionId,
    ) -> Result<Vec<DeliberationRound>, LedgerError>;

    /// Next free round number for `session` of `tenant` (1-based).
    async fn next_round_number(
        &self,
        tenant: &TenantId,
        session: &SessionId,
    ) -> Result<u32, LedgerError> {
        Ok(self
            .read_all(tenant, session)
            .await?
            .last()
            .map(|r| r.round_number + 1)
            .unwrap_or(1))
    }
}
