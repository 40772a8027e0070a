//! Cognitive state machine phases.
//!
//! `Analyze → Plan → Execute → Format`, with a bounded retry edge from
//! Execute back to itself, an optional Deliberate phase, and the terminal
//! states `Completed`, `Suspended` (waiting for a human answer) and `Error`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CognitivePhase {
    Analyze,
    Plan,
    Execute,
    Deliberate,
    Format,
    Completed,
    Suspended,
    Error,
}

impl CognitivePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CognitivePhase::Analyze => "analyze",
            CognitivePhase::Plan => "plan",
            CognitivePhase::Execute => "execute",
            CognitivePhase::Deliberate => "deliberate",
            CognitivePhase::Format => "format",
            CognitivePhase::Completed => "completed",
            CognitivePhase::Suspended => "suspended",
            CognitivePhase::Error => "error",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CognitivePhase::Analyze => "Analyzing",
            CognitivePhase::Plan => "Planning",
            CognitivePhase::Execute => "Executing",
            CognitivePhase::Deliberate => "Deliberating",
            CognitivePhase::Format => "Formatting",
            CognitivePhase::Completed => "Completed",
            CognitivePhase::Suspended => "Awaiting clarification",
            CognitivePhase::Error => "Error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CognitivePhase::Completed | CognitivePhase::Suspended | CognitivePhase::Error
        )
    }

    /// Whether `next` is a legal successor of this phase.
    pub fn can_transition_to(&self, next: CognitivePhase) -> bool {
        use CognitivePhase::*;
        if next == Error {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Analyze, Plan)
                | (Plan, Execute)
                | (Plan, Deliberate)
                | (Plan, Format)
                | (Execute, Execute)
                | (Execute, Deliberate)
                | (Execute, Format)
                | (Deliberate, Format)
                | (Deliberate, Suspended)
                | (Format, Completed)
        )
    }
}

impl std::fmt::Display for CognitivePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Illegal phase transition {from:?} -> {to:?}")]
pub struct PhaseError {
    pub from: CognitivePhase,
    pub to: CognitivePhase,
}

/// Current phase plus the path taken to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTracker {
    current: CognitivePhase,
    history: Vec<CognitivePhase>,
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self {
            current: CognitivePhase::Analyze,
            history: vec![CognitivePhase::Analyze],
        }
    }

    pub fn current(&self) -> CognitivePhase {
        self.current
    }

    pub fn history(&self) -> &[CognitivePhase] {
        &self.history
    }

    pub fn advance(&mut self, next: CognitivePhase) -> Result<(), PhaseError> {
        if !self.current.can_transition_to(next) {
            return Err(PhaseError {
                from: self.current,
                to: next,
            });
        }
        self.current = next;
        self.history.push(next);
        Ok(())
    }

    /// Number of times the Execute phase was re-entered.
    pub fn retries(&self) -> usize {
        self.history
            .windows(2)
            .filter(|w| w[0] == CognitivePhase::Execute && w[1] == CognitivePhase::Execute)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CognitivePhase::*;

    #[test]
    fn test_happy_path() {
        let mut tracker = PhaseTracker::new();
        for phase in [Plan, Execute, Execute, Format, Completed] {
            tracker.advance(phase).unwrap();
        }
        assert_eq!(tracker.current(), Completed);
        assert_eq!(tracker.retries(), 1);
        assert_eq!(tracker.history().len(), 6);
    }

    #[test]
    fn test_deliberation_can_suspend() {
        let mut tracker = PhaseTracker::new();
        tracker.advance(Plan).unwrap();
        tracker.advance(Deliberate).unwrap();
        tracker.advance(Suspended).unwrap();
        assert!(tracker.current().is_terminal());
        assert!(tracker.advance(Error).is_err());
    }

    #[test]
    fn test_illegal_transitions() {
        let mut tracker = PhaseTracker::new();
        assert_eq!(
            tracker.advance(Execute),
            Err(PhaseError {
                from: Analyze,
                to: Execute
            })
        );
        tracker.advance(Error).unwrap();
        assert!(tracker.advance(Plan).is_err());
        assert!(!Format.can_transition_to(Execute));
    }
}
