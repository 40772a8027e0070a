//! Domain layer for counsel
//!
//! This crate contains the core rules of the orchestration engine. It has
//! no dependencies on infrastructure or presentation concerns and performs
//! no I/O.
//!
//! # Core Concepts
//!
//! ## Single-agent path
//!
//! A [`Request`] is analyzed ([`plan::analysis`]), turned into a [`Plan`]
//! of tool [`Step`]s whose parameters may reference earlier results
//! ([`ParamValue::StepResult`]), and executed step by step. The
//! [`DependencyResolver`] substitutes references just before a step runs.
//!
//! ## Multi-agent path (deliberation)
//!
//! Facts → Research → Critique → Drafting. Each specialist writes one
//! [`DeliberationRound`] with a private monologue and a public opinion;
//! peers only ever see the [`PublicRound`] projection.
//!
//! ## Tools
//!
//! Data tools are generated from a declarative [`DataSchema`]; every tool
//! is described by a [`ToolDescriptor`] and fails with a typed [`ToolError`].

pub mod core;
pub mod deliberation;
pub mod plan;
pub mod prompt;
pub mod session;
pub mod tool;

pub use core::{
    error::DomainError,
    ids::{CaseId, PlanId, RequestId, SessionId, TenantId},
    request::Request,
};
pub use deliberation::{
    AgentRole, CaseContext, Citation, Claim, ClaimStatus, ClaimTally, Clarification,
    ClarifyingQuestion, ConfidenceLabel, CriticalFact, DeliberationRound, PublicRound,
    Recommendation, RoundRef, SearchHit, StageResponse, Verdict,
};
pub use plan::{
    analysis::{Analysis, AnalyzeError, Classification, ConversationContext, EntityType, analyze},
    entities::{Plan, PlanError, PlanStatus, Step, StepStatus},
    parser::{PlanParseError, create_plan_descriptor, parse_plan, parse_plan_call},
    resolver::{DependencyResolver, ResolutionError},
    state::{CognitivePhase, PhaseError, PhaseTracker},
    value_objects::{FieldPath, ParamValue, Parameters, StepId},
};
pub use prompt::{DeliberationPromptTemplate, PlanningPromptTemplate};
pub use session::{Completion, OrchestrationEvent, PlannedStep};
pub use tool::{
    DataSchema, DefaultToolValidator, EntitySchema, ErrorKind, FieldKind, FieldSchema,
    OperationKind, ParamKind, ProviderError, RetryDecision, RetryPolicy, SchemaError,
    SideEffectClass, StopReason, ToolCall, ToolCatalog, ToolDescriptor, ToolError, ToolParameter,
    ToolProvider, ToolValidator,
};
