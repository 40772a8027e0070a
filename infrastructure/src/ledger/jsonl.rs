//! File-backed ledger: one JSON round per line.
//!
//! The file is replayed at open, so `read_*` answers from memory and the
//! audit trail survives restarts. `append` writes the whole line in one
//! call and syncs it before acknowledging the round. Nothing is buffered
//! between appends, and a failed write is truncated away, so a round that
//! was reported as failed never reaches the file.

use super::check_append;
use async_trait::async_trait;
use counsel_application::ports::ledger::{LedgerError, VerificationLedger};
use counsel_domain::{DeliberationRound, RoundRef, SessionId, TenantId};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

struct LedgerState {
    rounds: Vec<DeliberationRound>,
    file: File,
}

pub struct JsonlLedger {
    state: Mutex<LedgerState>,
    path: PathBuf,
}

impl JsonlLedger {
    /// Open (or create) the ledger at `path`, replaying existing rounds.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| storage(path, e))?;
        }

        let rounds = if path.exists() {
            replay(path)?
        } else {
            Vec::new()
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| storage(path, e))?;

        info!(path = %path.display(), rounds = rounds.len(), "Opened verification ledger");
        Ok(Self {
            state: Mutex::new(LedgerState { rounds, file }),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn storage(path: &Path, e: impl std::fmt::Display) -> LedgerError {
    LedgerError::Storage(format!("{}: {}", path.display(), e))
}

/// Rebuild the in-memory rounds, applying the append rule to every line.
fn replay(path: &Path) -> Result<Vec<DeliberationRound>, LedgerError> {
    let content = std::fs::read_to_string(path).map_err(|e| storage(path, e))?;
    let mut rounds = Vec::new();
    for (number, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let round: DeliberationRound = serde_json::from_str(line)
            .map_err(|e| storage(path, format!("line {}: {}", number + 1, e)))?;
        check_append(&rounds, &round)
            .map_err(|e| storage(path, format!("line {}: {}", number + 1, e)))?;
        rounds.push(round);
    }
    Ok(rounds)
}

/// Append `line` and sync it. On failure the file is cut back to its
/// previous length.
fn write_line(file: &mut File, line: &str) -> std::io::Result<()> {
    let before = file.metadata()?.len();
    let result = file.write_all(line.as_bytes()).and_then(|()| file.sync_data());
    if result.is_err()
        && let Err(e) = file.set_len(before)
    {
        warn!(error = %e, "Could not roll back partial ledger write");
    }
    result
}

#[async_trait]
impl VerificationLedger for JsonlLedger {
    async fn append(&self, round: DeliberationRound) -> Result<RoundRef, LedgerError> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
        check_append(&state.rounds, &round)?;

        let mut line = serde_json::to_string(&round).map_err(|e| storage(&self.path, e))?;
        line.push('\n');
        write_line(&mut state.file, &line).map_err(|e| storage(&self.path, e))?;

        let reference = round.reference();
        debug!(round = %reference, "Ledger append");
        state.rounds.push(round);
        Ok(reference)
    }

    async fn read_all(
        &self,
        tenant: &TenantId,
        session: &SessionId,
    ) -> Result<Vec<DeliberationRound>, LedgerError> {
        Ok(self
            .state
            .lock()
            .map_err(|e| LedgerError::Storage(e.to_string()))?
            .rounds
            .iter()
            .filter(|r| r.belongs_to(tenant, session))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use counsel_domain::AgentRole;
    use tempfile::TempDir;

    fn tenant() -> TenantId {
        TenantId::new("firm-a")
    }

    fn session() -> SessionId {
        SessionId::new("s-1")
    }

    fn round(number: u32, role: AgentRole) -> DeliberationRound {
        let mut round = DeliberationRound::new(tenant(), session(), number, role);
        round.internal_monologue = "thinking".to_string();
        round.public_opinion = "PARTY: Acme Corp".to_string();
        round
    }

    #[tokio::test]
    async fn test_rounds_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit").join("ledger.jsonl");

        {
            let ledger = JsonlLedger::open(&path).unwrap();
            ledger.append(round(1, AgentRole::Facts)).await.unwrap();
            ledger.append(round(2, AgentRole::Research)).await.unwrap();
        }

        let ledger = JsonlLedger::open(&path).unwrap();
        let all = ledger.read_all(&tenant(), &session()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].internal_monologue, "thinking");
        assert_eq!(ledger.next_round_number(&tenant(), &session()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_replayed_rounds_still_block_duplicates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.jsonl");
        JsonlLedger::open(&path)
            .unwrap()
            .append(round(1, AgentRole::Facts))
            .await
            .unwrap();

        let ledger = JsonlLedger::open(&path).unwrap();
        let err = ledger.append(round(1, AgentRole::Facts)).await.unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateRound { .. }));

        let lines = std::fs::read_to_string(&path).unwrap();
        assert_eq!(lines.lines().count(), 1);
    }

    #[test]
    fn test_corrupt_line_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.jsonl");
        std::fs::write(&path, "{not json}\n").unwrap();
        assert!(matches!(
            JsonlLedger::open(&path),
            Err(LedgerError::Storage(message)) if message.contains("line 1")
        ));
    }

    #[test]
    fn test_replay_rejects_duplicate_rounds() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let line = serde_json::to_string(&round(1, AgentRole::Facts)).unwrap();
        std::fs::write(&path, format!("{}\n{}\n", line, line)).unwrap();

        assert!(matches!(
            JsonlLedger::open(&path),
            Err(LedgerError::Storage(message)) if message.contains("line 2")
        ));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_nothing_for_the_next_append() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.jsonl");
        let ledger = JsonlLedger::open(&path).unwrap();

        // a read-only handle makes the next write fail
        let writable = {
            let mut state = ledger.state.lock().unwrap();
            std::mem::replace(&mut state.file, File::open(&path).unwrap())
        };
        assert!(matches!(
            ledger.append(round(1, AgentRole::Facts)).await,
            Err(LedgerError::Storage(_))
        ));
        assert!(ledger.read_all(&tenant(), &session()).await.unwrap().is_empty());

        ledger.state.lock().unwrap().file = writable;
        ledger.append(round(1, AgentRole::Facts)).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        let reopened = JsonlLedger::open(&path).unwrap();
        assert_eq!(reopened.read_all(&tenant(), &session()).await.unwrap().len(), 1);
    }
}
