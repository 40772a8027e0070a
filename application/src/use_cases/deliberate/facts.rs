//! Facts stage: deconstruct the matter and run gap analysis.

use super::DeliberationOrchestrator;
use super::types::{DeliberationError, FactsOutcome};
use crate::ports::audit_logger::AuditEvent;
use crate::ports::event_sink::EventSink;
use counsel_domain::{
    AgentRole, CaseContext, DeliberationPromptTemplate, DeliberationRound, OrchestrationEvent,
    RoundRef, deliberation::parse_stage_response,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::info;

impl DeliberationOrchestrator {
    pub(super) async fn facts_stage(
        &self,
        context: &mut CaseContext,
        recorded: &mut Vec<RoundRef>,
        events: &dyn EventSink,
        token: &Option<CancellationToken>,
    ) -> Result<FactsOutcome, DeliberationError> {
        let role = AgentRole::Facts;
        events.emit(OrchestrationEvent::agent_status(role, "Extracting case facts"));

        let prompt = DeliberationPromptTemplate::facts(context);
        let reply = self.ask(role, &prompt, recorded, token).await?;
        let parsed = parse_stage_response(&reply);

        if let Some(jurisdiction) = &parsed.jurisdiction {
            context.set_jurisdiction(jurisdiction);
        }
        for party in &parsed.parties {
            context.add_party(party);
        }
        for fact in &parsed.facts {
            context.add_fact(fact);
        }

        let missing = context.missing_critical();
        let mut opinion = if parsed.opinion.is_empty() {
            format!(
                "Jurisdiction: {}. Parties: {}. {} fact(s) established.",
                context.jurisdiction.as_deref().unwrap_or("unknown"),
                if context.parties.is_empty() {
                    "unknown".to_string()
                } else {
                    context.parties.join(", ")
                },
                context.facts.len()
            )
        } else {
            parsed.opinion.clone()
        };
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|m| m.as_str()).collect();
            opinion.push_str(&format!("\nMissing critical facts: {}", names.join(", ")));
        }

        let evidence = parsed.citations();
        let verified = self.citations_resolve(&context.tenant_id, &evidence).await;
        let round = DeliberationRound::new(
            context.tenant_id.clone(),
            context.session_id.clone(),
            self.next_round(context).await?,
            role,
        )
        .with_monologue(parsed.monologue)
        .with_opinion(opinion)
        .with_evidence(evidence)
        .with_verified(verified);
        self.record(round, recorded).await?;

        if missing.is_empty() {
            return Ok(FactsOutcome::Proceed);
        }

        let question = context.suspend(missing);
        info!(
            session = %context.session_id,
            missing = question.missing.len(),
            "Deliberation suspended for clarification"
        );
        self.audit.log(AuditEvent::new(
            "deliberation_suspended",
            json!({
                "tenant": context.tenant_id,
                "session": context.session_id,
                "missing": question.missing,
            }),
        ));
        events.emit(OrchestrationEvent::Question {
            session_id: context.session_id.clone(),
            question: question.text.clone(),
            missing: question.missing.clone(),
        });
        Ok(FactsOutcome::Suspend(question))
    }
}
