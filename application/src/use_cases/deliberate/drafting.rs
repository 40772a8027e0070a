//! Drafting stage: the recommendation, from verified claims only.

use super::DeliberationOrchestrator;
use super::types::DeliberationError;
use crate::ports::audit_logger::AuditEvent;
use crate::ports::event_sink::EventSink;
use counsel_domain::{
    AgentRole, CaseContext, Claim, ClaimTally, DeliberationPromptTemplate, DeliberationRound,
    OrchestrationEvent, Recommendation, RoundRef, deliberation::parse_stage_response,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::info;

impl DeliberationOrchestrator {
    pub(super) async fn drafting_stage(
        &self,
        context: &CaseContext,
        claims: &[Claim],
        research_exhausted: bool,
        recorded: &mut Vec<RoundRef>,
        events: &dyn EventSink,
        token: &Option<CancellationToken>,
    ) -> Result<Recommendation, DeliberationError> {
        let role = AgentRole::Drafting;
        events.emit(OrchestrationEvent::agent_status(role, "Drafting recommendation"));

        let verified: Vec<Claim> = claims.iter().filter(|c| c.is_verified()).cloned().collect();
        let earlier = self
            .ledger
            .read_public(&context.tenant_id, &context.session_id)
            .await?;
        let prompt = DeliberationPromptTemplate::drafting(context, &earlier, &verified);
        let reply = self.ask(role, &prompt, recorded, token).await?;
        let parsed = parse_stage_response(&reply);
        let text = if parsed.opinion.is_empty() {
            reply.trim().to_string()
        } else {
            parsed.opinion
        };

        let evidence = verified
            .iter()
            .flat_map(|c| c.citations.iter().cloned())
            .collect::<Vec<_>>();
        let round = DeliberationRound::new(
            context.tenant_id.clone(),
            context.session_id.clone(),
            self.next_round(context).await?,
            role,
        )
        .with_monologue(parsed.monologue)
        .with_opinion(text.clone())
        .with_evidence(evidence)
        .with_claims(verified)
        .with_verified(true);
        self.record(round, recorded).await?;

        let recommendation = Recommendation::new(
            text,
            ClaimTally::of(claims),
            research_exhausted,
            recorded.clone(),
        );
        info!(
            session = %context.session_id,
            confidence = %recommendation.confidence,
            rounds = recommendation.contributing_rounds.len(),
            "Recommendation drafted"
        );
        self.audit.log(AuditEvent::new(
            "recommendation",
            json!({
                "tenant": context.tenant_id,
                "session": context.session_id,
                "confidence": recommendation.confidence,
                "verified_claims": recommendation.tally.verified,
                "flagged_claims": recommendation.tally.flagged,
                "research_exhausted": research_exhausted,
            }),
        ));
        events.emit(OrchestrationEvent::recommendation(&recommendation));
        Ok(recommendation)
    }
}
