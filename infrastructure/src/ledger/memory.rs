//! Process-local ledger.

use super::check_append;
use async_trait::async_trait;
use counsel_application::ports::ledger::{LedgerError, VerificationLedger};
use counsel_domain::{DeliberationRound, RoundRef, SessionId, TenantId};
use std::sync::RwLock;

#[derive(Default)]
pub struct InMemoryLedger {
    rounds: RwLock<Vec<DeliberationRound>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> LedgerError {
    LedgerError::Storage(e.to_string())
}

#[async_trait]
impl VerificationLedger for InMemoryLedger {
    async fn append(&self, round: DeliberationRound) -> Result<RoundRef, LedgerError> {
        let mut rounds = self.rounds.write().map_err(poisoned)?;
        check_append(&rounds, &round)?;
        let reference = round.reference();
        rounds.push(round);
        Ok(reference)
    }

    async fn read_all(
        &self,
        tenant: &TenantId,
        session: &SessionId,
    ) -> Result<Vec<DeliberationRound>, LedgerError> {
        Ok(self
            .rounds
            .read()
            .map_err(poisoned)?
            .iter()
            .filter(|r| r.belongs_to(tenant, session))
            .cloned()
            .collect())
    }
}
