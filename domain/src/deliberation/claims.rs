//! Claims and citations produced during deliberation.

use serde::{Deserialize, Serialize};

/// A piece of evidence a specialist cites.
///
/// `source_id` must be known to the retrieval subsystem; the Critique stage
/// checks that it resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub source_id: String,
    /// Human-readable locator (section, page, paragraph)
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub quote: String,
}

impl Citation {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            reference: String::new(),
            quote: String::new(),
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }

    pub fn with_quote(mut self, quote: impl Into<String>) -> Self {
        self.quote = quote.into();
        self
    }
}

impl std::fmt::Display for Citation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}", self.source_id)?;
        if !self.reference.is_empty() {
            write!(f, ", {}", self.reference)?;
        }
        write!(f, "]")
    }
}

/// One ranked hit from the retrieval collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub content: String,
    pub source_id: String,
    pub score: f64,
}

impl SearchHit {
    pub fn new(source_id: impl Into<String>, content: impl Into<String>, score: f64) -> Self {
        Self {
            content: content.into(),
            source_id: source_id.into(),
            score,
        }
    }

    pub fn to_citation(&self) -> Citation {
        Citation::new(&self.source_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClaimStatus {
    #[default]
    Unverified,
    Verified,
    Flagged {
        reason: String,
    },
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Unverified => "unverified",
            ClaimStatus::Verified => "verified",
            ClaimStatus::Flagged { .. } => "flagged",
        }
    }
}

/// A statement a specialist asserts, with supporting citations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub statement: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub status: ClaimStatus,
}

impl Claim {
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            citations: Vec::new(),
            status: ClaimStatus::Unverified,
        }
    }

    pub fn with_citation(mut self, citation: Citation) -> Self {
        self.citations.push(citation);
        self
    }

    pub fn verified(mut self) -> Self {
        self.status = ClaimStatus::Verified;
        self
    }

    pub fn flagged(mut self, reason: impl Into<String>) -> Self {
        self.status = ClaimStatus::Flagged {
            reason: reason.into(),
        };
        self
    }

    pub fn is_verified(&self) -> bool {
        self.status == ClaimStatus::Verified
    }

    pub fn is_flagged(&self) -> bool {
        matches!(self.status, ClaimStatus::Flagged { .. })
    }
}

/// Tally of verified and flagged claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClaimTally {
    pub verified: usize,
    pub flagged: usize,
}

impl ClaimTally {
    pub fn of(claims: &[Claim]) -> Self {
        claims.iter().fold(Self::default(), |mut tally, claim| {
            if claim.is_verified() {
                tally.verified += 1;
            } else if claim.is_flagged() {
                tally.flagged += 1;
            }
            tally
        })
    }

    pub fn total(&self) -> usize {
        self.verified + self.flagged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_status_transitions() {
        let claim = Claim::new("Limitation period is 3 years")
            .with_citation(Citation::new("statute-12").with_reference("s. 4(1)"));
        assert_eq!(claim.status, ClaimStatus::Unverified);
        assert!(claim.clone().verified().is_verified());
        assert!(claim.flagged("contradicted by case-7").is_flagged());
    }

    #[test]
    fn test_tally() {
        let claims = vec![
            Claim::new("a").verified(),
            Claim::new("b").flagged("x"),
            Claim::new("c").verified(),
            Claim::new("d"),
        ];
        let tally = ClaimTally::of(&claims);
        assert_eq!(tally, ClaimTally { verified: 2, flagged: 1 });
        assert_eq!(tally.total(), 3);
    }

    #[test]
    fn test_citation_display() {
        assert_eq!(Citation::new("doc-1").to_string(), "[doc-1]");
        assert_eq!(
            Citation::new("doc-1").with_reference("p. 3").to_string(),
            "[doc-1, p. 3]"
        );
    }
}
