//! Verification ledger adapters
//!
//! Both adapters partition rounds by `(tenant, session)` and share the
//! same append rule: a round is accepted only if no round with the same
//! `(tenant, session, round_number, role)` exists and its number is
//! greater than every earlier round of that partition.

mod jsonl;
mod memory;

pub use jsonl::JsonlLedger;
pub use memory::InMemoryLedger;

use counsel_application::ports::ledger::LedgerError;
use counsel_domain::DeliberationRound;

/// Check `round` against the rounds already recorded (any partition).
pub(crate) fn check_append(
    existing: &[DeliberationRound],
    round: &DeliberationRound,
) -> Result<(), LedgerError> {
    let session: Vec<&DeliberationRound> = existing
        .iter()
        .filter(|r| r.belongs_to(&round.tenant_id, &round.session_id))
        .collect();

    if session
        .iter()
        .any(|r| r.round_number == round.round_number && r.role == round.role)
    {
        return Err(LedgerError::DuplicateRound {
            session_id: round.session_id.clone(),
            round_number: round.round_number,
            role: round.role,
        });
    }

    if let Some(last) = session.iter().map(|r| r.round_number).max()
        && round.round_number <= last
    {
        return Err(LedgerError::OutOfOrder {
            session_id: round.session_id.clone(),
            round_number: round.round_number,
            last,
        });
    }

    Ok(())
}
