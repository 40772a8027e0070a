//! Deliberation rounds and the final recommendation.

use super::claims::{Citation, Claim, ClaimTally};
use super::confidence::ConfidenceLabel;
use crate::core::ids::{SessionId, TenantId};
use crate::core::string::current_timestamp;
use serde::{Deserialize, Serialize};

/// A specialist role in the deliberation pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Facts,
    Research,
    Critique,
    Drafting,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Facts => "facts",
            AgentRole::Research => "research",
            AgentRole::Critique => "critique",
            AgentRole::Drafting => "drafting",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AgentRole::Facts => "Facts",
            AgentRole::Research => "Research",
            AgentRole::Critique => "Critique",
            AgentRole::Drafting => "Drafting",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One specialist's recorded contribution.
///
/// Written once per (tenant, session, round, role) and never mutated after
/// it is appended to the ledger. Peers only ever see [`PublicRound`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliberationRound {
    /// Owner of the session; ledgers partition on `(tenant_id, session_id)`
    pub tenant_id: TenantId,
    pub session_id: SessionId,
    pub round_number: u32,
    pub role: AgentRole,
    /// Private scratch reasoning, visible to human auditors only
    pub internal_monologue: String,
    pub public_opinion: String,
    #[serde(default)]
    pub cited_evidence: Vec<Citation>,
    #[serde(default)]
    pub claims: Vec<Claim>,
    /// False when at least one citation did not resolve to a known source
    pub verified: bool,
    /// Milliseconds since the Unix epoch
    pub recorded_at: u64,
}

impl DeliberationRound {
    pub fn new(
        tenant_id: TenantId,
        session_id: SessionId,
        round_number: u32,
        role: AgentRole,
    ) -> Self {
        Self {
            tenant_id,
            session_id,
            round_number,
            role,
            internal_monologue: String::new(),
            public_opinion: String::new(),
            cited_evidence: Vec::new(),
            claims: Vec::new(),
            verified: true,
            recorded_at: current_timestamp(),
        }
    }

    pub fn with_monologue(mut self, monologue: impl Into<String>) -> Self {
        self.internal_monologue = monologue.into();
        self
    }

    pub fn with_opinion(mut self, opinion: impl Into<String>) -> Self {
        self.public_opinion = opinion.into();
        self
    }

    pub fn with_evidence(mut self, evidence: Vec<Citation>) -> Self {
        self.cited_evidence = evidence;
        self
    }

    pub fn with_claims(mut self, claims: Vec<Claim>) -> Self {
        self.claims = claims;
        self
    }

    pub fn with_verified(mut self, verified: bool) -> Self {
        self.verified = verified;
        self
    }

    /// Whether this round belongs to `session` of `tenant`.
    pub fn belongs_to(&self, tenant: &TenantId, session: &SessionId) -> bool {
        &self.tenant_id == tenant && &self.session_id == session
    }

    pub fn reference(&self) -> RoundRef {
        RoundRef {
            session_id: self.session_id.clone(),
            round_number: self.round_number,
            role: self.role,
        }
    }

    /// The peer-visible projection: everything except the monologue.
    pub fn public_view(&self) -> PublicRound {
        PublicRound {
            session_id: self.session_id.clone(),
            round_number: self.round_number,
            role: self.role,
            public_opinion: self.public_opinion.clone(),
            cited_evidence: self.cited_evidence.clone(),
            claims: self.claims.clone(),
            verified: self.verified,
        }
    }
}

/// Redacted view of a [`DeliberationRound`] for peers and the aggregator.
///
/// Has no monologue field at all, so private reasoning cannot leak through it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicRound {
    pub session_id: SessionId,
    pub round_number: u32,
    pub role: AgentRole,
    pub public_opinion: String,
    pub cited_evidence: Vec<Citation>,
    pub claims: Vec<Claim>,
    pub verified: bool,
}

/// Pointer to a recorded round
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoundRef {
    pub session_id: SessionId,
    pub round_number: u32,
    pub role: AgentRole,
}

impl std::fmt::Display for RoundRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{} ({})", self.session_id, self.round_number, self.role.as_str())
    }
}

/// Final output of the deliberation pipeline. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub confidence: ConfidenceLabel,
    pub text: String,
    pub contributing_rounds: Vec<RoundRef>,
    pub tally: ClaimTally,
    /// Research hit its cycle cap without reaching its threshold
    pub research_exhausted: bool,
}

impl Recommendation {
    pub fn new(
        text: impl Into<String>,
        tally: ClaimTally,
        research_exhausted: bool,
        contributing_rounds: Vec<RoundRef>,
    ) -> Self {
        Self {
            confidence: ConfidenceLabel::score(tally, research_exhausted),
            text: text.into(),
            contributing_rounds,
            tally,
            research_exhausted,
        }
    }
}
