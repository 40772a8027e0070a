//! Confidence scoring for the final recommendation.
//!
//! `verified_ratio = verified / (verified + flagged)`
//!
//! - **High**: no flagged claims and at least one verified claim
//! - **Medium**: `verified_ratio >= 0.5`
//! - **Low**: otherwise, or when there are no claims at all
//!
//! If research exhausted its cycle cap without reaching its threshold the
//! label is lowered one level.

use super::claims::ClaimTally;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLabel {
    Low,
    Medium,
    High,
}

impl ConfidenceLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLabel::Low => "low",
            ConfidenceLabel::Medium => "medium",
            ConfidenceLabel::High => "high",
        }
    }

    /// One level lower, saturating at Low.
    pub fn lowered(self) -> Self {
        match self {
            ConfidenceLabel::High => ConfidenceLabel::Medium,
            ConfidenceLabel::Medium | ConfidenceLabel::Low => ConfidenceLabel::Low,
        }
    }

    pub fn score(tally: ClaimTally, research_exhausted: bool) -> Self {
        let base = if tally.total() == 0 {
            ConfidenceLabel::Low
        } else if tally.flagged == 0 {
            ConfidenceLabel::High
        } else if tally.verified as f64 / tally.total() as f64 >= 0.5 {
            ConfidenceLabel::Medium
        } else {
            ConfidenceLabel::Low
        };

        if research_exhausted {
            base.lowered()
        } else {
            base
        }
    }
}

impl std::fmt::Display for ConfidenceLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Number of top hits averaged into the evidence confidence.
pub const EVIDENCE_TOP_N: usize = 3;

/// Confidence of a research cycle's evidence: the mean of the top
/// [`EVIDENCE_TOP_N`] retrieval scores, clamped to `[0, 1]`.
pub fn evidence_confidence(scores: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = scores.iter().copied().filter(|s| s.is_finite()).collect();
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.sort_by(|a, b| b.total_cmp(a));
    let top = &sorted[..sorted.len().min(EVIDENCE_TOP_N)];
    (top.iter().sum::<f64>() / top.len() as f64).clamp(0.0, 1.0)
}
