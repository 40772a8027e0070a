//! Deliberation domain: specialist roles, rounds, claims and confidence.
//!
//! The pipeline is fixed: Facts → Research → Critique → Drafting. Each
//! stage records one [`DeliberationRound`] holding its private monologue
//! and its public opinion. Later stages read only [`PublicRound`]s.

pub mod claims;
pub mod confidence;
pub mod context;
pub mod entities;
pub mod parsing;

pub use claims::{Citation, Claim, ClaimStatus, ClaimTally, SearchHit};
pub use confidence::{ConfidenceLabel, evidence_confidence};
pub use context::{CaseContext, Clarification, ClarifyingQuestion, CriticalFact};
pub use entities::{AgentRole, DeliberationRound, PublicRound, Recommendation, RoundRef};
pub use parsing::{StageResponse, Verdict, parse_stage_response, parse_verdict};
