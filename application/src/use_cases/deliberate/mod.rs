//! Deliberation Orchestrator
//!
//! Sequences the fixed specialist pipeline over an explicit [`CaseContext`]:
//!
//! | Stage    | Reads                          | Writes                        |
//! |----------|--------------------------------|-------------------------------|
//! | Facts    | case context                   | jurisdiction, parties, facts  |
//! | Research | public rounds, retrieval       | claims with citations         |
//! | Critique | claims, cited sources          | verified / flagged claims     |
//! | Drafting | public rounds, verified claims | recommendation                |
//!
//! Every stage writes exactly one [`DeliberationRound`] and awaits its
//! durable append before the next stage starts. Prompts are built from the
//! ledger's public projection only, so private monologues never reach a
//! peer. When Facts finds critical gaps the pipeline suspends with a
//! clarifying question; [`DeliberationOrchestrator::resume`] answers it and
//! restarts at Facts.

mod critique;
mod drafting;
mod facts;
mod research;
mod types;

pub use types::{DeliberationError, DeliberationOutcome};

use crate::config::{DeliberationParams, ExecutionParams};
use crate::ports::audit_logger::{AuditEvent, AuditLogger, NoAuditLogger};
use crate::ports::event_sink::EventSink;
use crate::ports::ledger::VerificationLedger;
use crate::ports::model_gateway::ModelGateway;
use crate::ports::retrieval::RetrievalPort;
use crate::use_cases::shared::{Bounded, ModelCallError, bounded, complete_with_retry, is_cancelled};
use counsel_domain::{
    AgentRole, CaseContext, Citation, DeliberationRound, RoundRef, SearchHit, TenantId,
};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use types::FactsOutcome;

pub struct DeliberationOrchestrator {
    gateway: Arc<dyn ModelGateway>,
    retrieval: Arc<dyn RetrievalPort>,
    ledger: Arc<dyn VerificationLedger>,
    params: DeliberationParams,
    execution: ExecutionParams,
    audit: Arc<dyn AuditLogger>,
}

impl DeliberationOrchestrator {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        retrieval: Arc<dyn RetrievalPort>,
        ledger: Arc<dyn VerificationLedger>,
    ) -> Self {
        Self {
            gateway,
            retrieval,
            ledger,
            params: DeliberationParams::default(),
            execution: ExecutionParams::default(),
            audit: Arc::new(NoAuditLogger),
        }
    }

    pub fn with_params(mut self, params: DeliberationParams) -> Self {
        self.params = params;
        self
    }

    /// Timeouts for model and retrieval calls come from the execution params.
    pub fn with_execution_params(mut self, execution: ExecutionParams) -> Self {
        self.execution = execution;
        self
    }

    pub fn with_audit_logger(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.audit = audit;
        self
    }

    pub fn ledger(&self) -> &Arc<dyn VerificationLedger> {
        &self.ledger
    }

    /// Run the pipeline from Facts.
    pub async fn run(
        &self,
        context: &mut CaseContext,
        events: &dyn EventSink,
        token: &Option<CancellationToken>,
    ) -> Result<DeliberationOutcome, DeliberationError> {
        if context.is_suspended() {
            return Err(DeliberationError::AwaitingClarification(
                context.session_id.clone(),
            ));
        }
        info!(
            tenant = %context.tenant_id,
            session = %context.session_id,
            "Starting deliberation"
        );

        let mut recorded = Vec::new();

        self.check_cancelled(&recorded, token)?;
        if let FactsOutcome::Suspend(question) =
            self.facts_stage(context, &mut recorded, events, token).await?
        {
            return Ok(DeliberationOutcome::NeedsClarification(question));
        }

        self.check_cancelled(&recorded, token)?;
        let findings = self
            .research_stage(context, &mut recorded, events, token)
            .await?;

        self.check_cancelled(&recorded, token)?;
        let claims = self
            .critique_stage(context, findings.claims, &mut recorded, events, token)
            .await?;
        debug!(evidence = findings.evidence.len(), "Critique complete");

        self.check_cancelled(&recorded, token)?;
        let recommendation = self
            .drafting_stage(
                context,
                &claims,
                findings.exhausted,
                &mut recorded,
                events,
                token,
            )
            .await?;

        Ok(DeliberationOutcome::Recommended(recommendation))
    }

    /// Answer the pending clarifying question and restart at Facts.
    pub async fn resume(
        &self,
        context: &mut CaseContext,
        answer: &str,
        events: &dyn EventSink,
        token: &Option<CancellationToken>,
    ) -> Result<DeliberationOutcome, DeliberationError> {
        context
            .answer_clarification(answer)
            .map_err(DeliberationError::InvalidAnswer)?;
        info!(session = %context.session_id, "Resuming deliberation at Facts");
        self.run(context, events, token).await
    }

    // ==================== Stage helpers ====================

    fn check_cancelled(
        &self,
        recorded: &[RoundRef],
        token: &Option<CancellationToken>,
    ) -> Result<(), DeliberationError> {
        if is_cancelled(token) {
            return Err(DeliberationError::Cancelled {
                rounds_recorded: recorded.to_vec(),
            });
        }
        Ok(())
    }

    /// One model call for `stage`, retried within the stage budget.
    async fn ask(
        &self,
        stage: AgentRole,
        prompt: &str,
        recorded: &[RoundRef],
        token: &Option<CancellationToken>,
    ) -> Result<String, DeliberationError> {
        complete_with_retry(
            self.gateway.as_ref(),
            prompt,
            None,
            self.execution.model_timeout,
            self.params.stage_retry_budget,
            token,
        )
        .await
        .map(|completion| completion.into_text())
        .map_err(|e| match e {
            ModelCallError::Cancelled => DeliberationError::Cancelled {
                rounds_recorded: recorded.to_vec(),
            },
            ModelCallError::Exhausted { .. } => {
                warn!(stage = stage.as_str(), error = %e, "Stage model call failed");
                DeliberationError::Aborted {
                    stage,
                    reason: e.to_string(),
                    rounds_recorded: recorded.to_vec(),
                }
            }
        })
    }

    async fn next_round(&self, context: &CaseContext) -> Result<u32, DeliberationError> {
        Ok(self
            .ledger
            .next_round_number(&context.tenant_id, &context.session_id)
            .await?)
    }

    /// Append `round`; returns once the ledger holds it durably.
    async fn record(
        &self,
        round: DeliberationRound,
        recorded: &mut Vec<RoundRef>,
    ) -> Result<RoundRef, DeliberationError> {
        let verified = round.verified;
        let citations = round.cited_evidence.len();
        let reference = self.ledger.append(round).await?;
        info!(
            session = %reference.session_id,
            round = reference.round_number,
            stage = reference.role.as_str(),
            verified,
            "Round recorded"
        );
        self.audit.log(AuditEvent::new(
            "round_recorded",
            json!({
                "session": reference.session_id,
                "round": reference.round_number,
                "role": reference.role,
                "citations": citations,
                "verified": verified,
            }),
        ));
        recorded.push(reference.clone());
        Ok(reference)
    }

    /// Look up a cited source. Lookup failures count as unresolved.
    async fn resolve_source(&self, tenant: &TenantId, source_id: &str) -> Option<SearchHit> {
        match bounded(
            self.retrieval.resolve_source(tenant, source_id),
            self.execution.retrieval_timeout,
            &None,
        )
        .await
        {
            Bounded::Done(Ok(hit)) => hit,
            Bounded::Done(Err(e)) => {
                warn!(source = source_id, error = %e, "Citation lookup failed");
                None
            }
            Bounded::TimedOut | Bounded::Cancelled => {
                warn!(source = source_id, "Citation lookup timed out");
                None
            }
        }
    }

    /// Whether every citation resolves to a known source.
    async fn citations_resolve(&self, tenant: &TenantId, citations: &[Citation]) -> bool {
        for citation in citations {
            if self
                .resolve_source(tenant, &citation.source_id)
                .await
                .is_none()
            {
                warn!(source = %citation.source_id, "Unresolvable citation; round unverified");
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::model_gateway::GatewayError;
    use crate::use_cases::test_support::{
        MemoryLedger, RecordingEventSink, RoutedGateway, StaticRetrieval,
    };
    use counsel_domain::{
        ClaimStatus, Completion, ConfidenceLabel, CriticalFact, OrchestrationEvent, SearchHit,
        SessionId,
    };

    const FACTS_COMPLETE: &str = "MONOLOGUE: the contract names both sides\n\
OPINION: Breach of supply contract.\n\
JURISDICTION: California\n\
PARTY: Acme Corp\n\
PARTY: Widget LLC\n\
FACT: Delivery was 40 days late";

    const FACTS_NO_JURISDICTION: &str = "OPINION: Breach of supply contract.\n\
JURISDICTION: unknown\n\
PARTY: Acme Corp";

    const SYNTHESIS: &str = "MONOLOGUE: secret reasoning about weak precedent\n\
OPINION: The sources support a damages claim.\n\
CLAIM: Late delivery is a material breach [doc-1 | Cal. Com. Code 2601 | perfect tender]\n\
CLAIM: Consequential damages are capped [doc-404]";

    const SYNTHESIS_ONE_CLAIM: &str = "OPINION: The sources support a damages claim.\n\
CLAIM: Late delivery is a material breach [doc-1 | Cal. Com. Code 2601]";

    fn route(facts: &'static str, synthesis: &'static str) -> RoutedGateway {
        RoutedGateway::new(move |prompt| {
            let text = if prompt.contains("You are the Facts specialist") {
                facts
            } else if prompt.contains("Propose") {
                "QUERY: late delivery material breach"
            } else if prompt.contains("Summarise what the sources establish") {
                synthesis
            } else if prompt.contains("Critique specialist") {
                "VERDICT: SUPPORTED"
            } else if prompt.contains("Drafting specialist") {
                "MONOLOGUE: draft notes\nOPINION: We recommend pursuing damages for late delivery."
            } else {
                return Err(GatewayError::Other("unexpected prompt".to_string()));
            };
            Ok(Completion::text(text))
        })
    }

    fn hits(score: f64) -> Vec<SearchHit> {
        vec![
            SearchHit::new("doc-1", "Perfect tender rule: buyer may reject late goods", score),
            SearchHit::new("doc-2", "Damages for non-delivery", score),
            SearchHit::new("doc-3", "Cover and incidental damages", score),
        ]
    }

    struct Harness {
        gateway: Arc<RoutedGateway>,
        retrieval: Arc<StaticRetrieval>,
        ledger: Arc<MemoryLedger>,
        orchestrator: DeliberationOrchestrator,
    }

    fn harness(gateway: RoutedGateway, retrieval: StaticRetrieval) -> Harness {
        let gateway = Arc::new(gateway);
        let retrieval = Arc::new(retrieval);
        let ledger = Arc::new(MemoryLedger::new());
        let orchestrator =
            DeliberationOrchestrator::new(gateway.clone(), retrieval.clone(), ledger.clone());
        Harness {
            gateway,
            retrieval,
            ledger,
            orchestrator,
        }
    }

    fn context() -> CaseContext {
        CaseContext::new(
            TenantId::new("firm-1"),
            SessionId::new("s-1"),
            "Should we sue Widget LLC for late delivery?",
        )
    }

    fn roles(ledger: &MemoryLedger) -> Vec<AgentRole> {
        ledger.snapshot().iter().map(|r| r.role).collect()
    }

    #[tokio::test]
    async fn test_full_pipeline_writes_one_round_per_stage() {
        let h = harness(route(FACTS_COMPLETE, SYNTHESIS_ONE_CLAIM), StaticRetrieval::new(hits(0.9)));
        let events = RecordingEventSink::new();
        let mut ctx = context();

        let outcome = h.orchestrator.run(&mut ctx, &events, &None).await.unwrap();

        let recommendation = outcome.recommendation().unwrap();
        assert_eq!(recommendation.confidence, ConfidenceLabel::High);
        assert!(!recommendation.research_exhausted);
        assert_eq!(recommendation.contributing_rounds.len(), 4);
        assert_eq!(
            roles(&h.ledger),
            vec![AgentRole::Facts, AgentRole::Research, AgentRole::Critique, AgentRole::Drafting]
        );
        let numbers: Vec<u32> = h.ledger.snapshot().iter().map(|r| r.round_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert_eq!(ctx.jurisdiction.as_deref(), Some("California"));
        assert_eq!(ctx.parties, vec!["Acme Corp", "Widget LLC"]);
        // confidence threshold met on the first cycle
        assert_eq!(h.retrieval.queries().len(), 1);
        assert_eq!(events.count("RECOMMENDATION"), 1);
    }

    #[tokio::test]
    async fn test_missing_jurisdiction_suspends_before_research() {
        let h = harness(route(FACTS_NO_JURISDICTION, SYNTHESIS_ONE_CLAIM), StaticRetrieval::new(hits(0.9)));
        let events = RecordingEventSink::new();
        let mut ctx = context();

        let outcome = h.orchestrator.run(&mut ctx, &events, &None).await.unwrap();

        let question = outcome.question().unwrap();
        assert_eq!(question.missing, vec![CriticalFact::Jurisdiction]);
        assert!(ctx.is_suspended());
        assert_eq!(roles(&h.ledger), vec![AgentRole::Facts]);
        assert!(h.retrieval.queries().is_empty());
        assert_eq!(h.gateway.prompts_containing("Propose"), 0);
        assert!(matches!(
            events.events().last(),
            Some(OrchestrationEvent::Question { .. })
        ));

        // running again without an answer is refused
        let again = h.orchestrator.run(&mut ctx, &events, &None).await;
        assert!(matches!(again, Err(DeliberationError::AwaitingClarification(_))));
    }

    #[tokio::test]
    async fn test_answer_resumes_at_facts_not_research() {
        let h = harness(route(FACTS_NO_JURISDICTION, SYNTHESIS_ONE_CLAIM), StaticRetrieval::new(hits(0.9)));
        let events = RecordingEventSink::new();
        let mut ctx = context();
        h.orchestrator.run(&mut ctx, &events, &None).await.unwrap();

        let outcome = h
            .orchestrator
            .resume(&mut ctx, "California", &events, &None)
            .await
            .unwrap();

        assert!(outcome.recommendation().is_some());
        assert_eq!(ctx.jurisdiction.as_deref(), Some("California"));
        assert_eq!(h.gateway.prompts_containing("You are the Facts specialist"), 2);
        assert_eq!(
            roles(&h.ledger),
            vec![
                AgentRole::Facts,
                AgentRole::Facts,
                AgentRole::Research,
                AgentRole::Critique,
                AgentRole::Drafting
            ]
        );
        // the second Facts prompt saw the answer
        let facts_prompts: Vec<String> = h
            .gateway
            .prompts()
            .into_iter()
            .filter(|p| p.contains("You are the Facts specialist"))
            .collect();
        assert!(facts_prompts[1].contains("Jurisdiction: California"));
    }

    #[tokio::test]
    async fn test_research_cap_proceeds_with_lowered_confidence() {
        let h = harness(route(FACTS_COMPLETE, SYNTHESIS_ONE_CLAIM), StaticRetrieval::new(hits(0.3)));
        let mut ctx = context();

        let outcome = h
            .orchestrator
            .run(&mut ctx, &RecordingEventSink::new(), &None)
            .await
            .unwrap();

        assert_eq!(h.retrieval.queries().len(), 10);
        let recommendation = outcome.recommendation().unwrap();
        assert!(recommendation.research_exhausted);
        // one verified claim would be High; exhaustion lowers it
        assert_eq!(recommendation.confidence, ConfidenceLabel::Medium);
        assert_eq!(
            roles(&h.ledger),
            vec![AgentRole::Facts, AgentRole::Research, AgentRole::Critique, AgentRole::Drafting]
        );
        let research = &h.ledger.snapshot()[1];
        assert!(research.internal_monologue.contains("cycle cap reached"));
        assert_eq!(research.cited_evidence.len(), 3);
    }

    #[tokio::test]
    async fn test_research_cap_is_configurable() {
        let h = harness(route(FACTS_COMPLETE, SYNTHESIS_ONE_CLAIM), StaticRetrieval::new(hits(0.1)));
        let orchestrator = h
            .orchestrator
            .with_params(DeliberationParams::default().with_research_max_cycles(3));
        orchestrator
            .run(&mut context(), &RecordingEventSink::new(), &None)
            .await
            .unwrap();
        assert_eq!(h.retrieval.queries().len(), 3);
    }

    #[tokio::test]
    async fn test_unresolvable_citation_flags_claim_and_round() {
        let h = harness(route(FACTS_COMPLETE, SYNTHESIS), StaticRetrieval::new(hits(0.9)));
        let mut ctx = context();

        let outcome = h
            .orchestrator
            .run(&mut ctx, &RecordingEventSink::new(), &None)
            .await
            .unwrap();

        let rounds = h.ledger.snapshot();
        let critique = rounds.iter().find(|r| r.role == AgentRole::Critique).unwrap();
        assert!(!critique.verified);
        assert!(critique.claims[0].is_verified());
        assert_eq!(
            critique.claims[1].status,
            ClaimStatus::Flagged {
                reason: "unresolvable citation doc-404".to_string()
            }
        );
        let research = rounds.iter().find(|r| r.role == AgentRole::Research).unwrap();
        assert!(!research.verified);

        let recommendation = outcome.recommendation().unwrap();
        assert_eq!(recommendation.tally.verified, 1);
        assert_eq!(recommendation.tally.flagged, 1);
        assert_eq!(recommendation.confidence, ConfidenceLabel::Medium);

        let drafting = rounds.iter().find(|r| r.role == AgentRole::Drafting).unwrap();
        assert_eq!(drafting.claims.len(), 1);
    }

    #[tokio::test]
    async fn test_private_monologue_never_reaches_peers() {
        let h = harness(route(FACTS_COMPLETE, SYNTHESIS), StaticRetrieval::new(hits(0.9)));
        h.orchestrator
            .run(&mut context(), &RecordingEventSink::new(), &None)
            .await
            .unwrap();

        let research = &h.ledger.snapshot()[1];
        assert!(research.internal_monologue.contains("secret reasoning"));
        assert!(
            h.gateway
                .prompts()
                .iter()
                .all(|p| !p.contains("secret reasoning"))
        );
        assert!(
            h.gateway
                .prompts()
                .iter()
                .all(|p| !p.contains("the contract names both sides"))
        );
    }

    #[tokio::test]
    async fn test_stage_failure_preserves_recorded_rounds() {
        let gateway = RoutedGateway::new(|prompt| {
            if prompt.contains("Critique specialist") {
                Err(GatewayError::InvalidResponse("garbled".to_string()))
            } else if prompt.contains("You are the Facts specialist") {
                Ok(Completion::text(FACTS_COMPLETE))
            } else if prompt.contains("Propose") {
                Ok(Completion::text("QUERY: breach"))
            } else {
                Ok(Completion::text(SYNTHESIS_ONE_CLAIM))
            }
        });
        let h = harness(gateway, StaticRetrieval::new(hits(0.9)));

        let err = h
            .orchestrator
            .run(&mut context(), &RecordingEventSink::new(), &None)
            .await
            .unwrap_err();

        match &err {
            DeliberationError::Aborted { stage, .. } => assert_eq!(*stage, AgentRole::Critique),
            other => panic!("expected abort, got {:?}", other),
        }
        assert_eq!(err.rounds_recorded().len(), 2);
        assert_eq!(roles(&h.ledger), vec![AgentRole::Facts, AgentRole::Research]);
    }

    #[tokio::test]
    async fn test_transient_retrieval_failures_are_retried() {
        let h = harness(
            route(FACTS_COMPLETE, SYNTHESIS_ONE_CLAIM),
            StaticRetrieval::new(hits(0.9)).failing(2),
        );
        let outcome = h
            .orchestrator
            .run(&mut context(), &RecordingEventSink::new(), &None)
            .await;
        assert!(outcome.is_ok());
        assert_eq!(h.retrieval.queries().len(), 3);
    }

    #[tokio::test]
    async fn test_retrieval_outage_aborts_research() {
        let h = harness(
            route(FACTS_COMPLETE, SYNTHESIS_ONE_CLAIM),
            StaticRetrieval::new(hits(0.9)).failing(10),
        );
        let err = h
            .orchestrator
            .run(&mut context(), &RecordingEventSink::new(), &None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DeliberationError::Aborted {
                stage: AgentRole::Research,
                ..
            }
        ));
        assert_eq!(roles(&h.ledger), vec![AgentRole::Facts]);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let h = harness(route(FACTS_COMPLETE, SYNTHESIS), StaticRetrieval::new(hits(0.9)));
        let token = CancellationToken::new();
        token.cancel();

        let err = h
            .orchestrator
            .run(&mut context(), &RecordingEventSink::new(), &Some(token))
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(h.ledger.snapshot().is_empty());
        assert!(h.gateway.prompts().is_empty());
    }
}
