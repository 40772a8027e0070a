//! Critique stage: systematic doubt applied to every upstream claim.
//!
//! A claim is checked in two steps. Its citations must resolve to known
//! sources (otherwise it is flagged and the round is unverified), then the
//! model tries to refute it against those sources. Claims are checked
//! concurrently.

use super::DeliberationOrchestrator;
use super::types::DeliberationError;
use crate::ports::event_sink::EventSink;
use crate::use_cases::shared::{ModelCallError, complete_with_retry};
use counsel_domain::{
    AgentRole, CaseContext, Claim, ClaimStatus, ClaimTally, DeliberationPromptTemplate,
    DeliberationRound, OrchestrationEvent, RoundRef, Verdict, deliberation::parse_verdict,
};
use futures::future::join_all;
use tokio_util::sync::CancellationToken;

/// Critique result for one claim
struct ClaimReview {
    claim: Claim,
    note: String,
    citations_resolved: bool,
}

impl DeliberationOrchestrator {
    pub(super) async fn critique_stage(
        &self,
        context: &CaseContext,
        claims: Vec<Claim>,
        recorded: &mut Vec<RoundRef>,
        events: &dyn EventSink,
        token: &Option<CancellationToken>,
    ) -> Result<Vec<Claim>, DeliberationError> {
        let role = AgentRole::Critique;
        events.emit(OrchestrationEvent::agent_status(
            role,
            format!("Reviewing {} claim(s)", claims.len()),
        ));

        let reviews = join_all(
            claims
                .into_iter()
                .map(|claim| self.review_claim(context, claim, token)),
        )
        .await;

        let mut reviewed = Vec::with_capacity(reviews.len());
        let mut notes = Vec::new();
        let mut all_resolved = true;
        for review in reviews {
            match review {
                Ok(review) => {
                    all_resolved &= review.citations_resolved;
                    notes.push(review.note);
                    reviewed.push(review.claim);
                }
                Err(ModelCallError::Cancelled) => {
                    return Err(DeliberationError::Cancelled {
                        rounds_recorded: recorded.clone(),
                    });
                }
                Err(e) => {
                    return Err(DeliberationError::Aborted {
                        stage: role,
                        reason: e.to_string(),
                        rounds_recorded: recorded.clone(),
                    });
                }
            }
        }

        let tally = ClaimTally::of(&reviewed);
        let mut opinion = format!(
            "{} of {} claim(s) survived critique.",
            tally.verified,
            tally.total()
        );
        for claim in &reviewed {
            if let ClaimStatus::Flagged { reason } = &claim.status {
                opinion.push_str(&format!("\nFlagged: {} ({})", claim.statement, reason));
            }
        }

        let evidence = reviewed
            .iter()
            .flat_map(|c| c.citations.iter().cloned())
            .fold(Vec::new(), |mut acc, citation| {
                if !acc.contains(&citation) {
                    acc.push(citation);
                }
                acc
            });

        let round = DeliberationRound::new(
            context.tenant_id.clone(),
            context.session_id.clone(),
            self.next_round(context).await?,
            role,
        )
        .with_monologue(notes.join("\n"))
        .with_opinion(opinion)
        .with_evidence(evidence)
        .with_claims(reviewed.clone())
        .with_verified(all_resolved);
        self.record(round, recorded).await?;

        Ok(reviewed)
    }

    async fn review_claim(
        &self,
        context: &CaseContext,
        claim: Claim,
        token: &Option<CancellationToken>,
    ) -> Result<ClaimReview, ModelCallError> {
        if claim.citations.is_empty() {
            return Ok(ClaimReview {
                note: format!("\"{}\": no citation", claim.statement),
                claim: claim.flagged("no supporting citation"),
                citations_resolved: true,
            });
        }

        let mut sources = Vec::with_capacity(claim.citations.len());
        for citation in &claim.citations {
            match self.resolve_source(&context.tenant_id, &citation.source_id).await {
                Some(hit) => sources.push(hit),
                None => {
                    return Ok(ClaimReview {
                        note: format!(
                            "\"{}\": citation {} does not resolve",
                            claim.statement, citation.source_id
                        ),
                        claim: claim
                            .clone()
                            .flagged(format!("unresolvable citation {}", citation.source_id)),
                        citations_resolved: false,
                    });
                }
            }
        }

        let prompt = DeliberationPromptTemplate::critique(context, &claim, &sources);
        let reply = complete_with_retry(
            self.gateway.as_ref(),
            &prompt,
            None,
            self.execution.model_timeout,
            self.params.stage_retry_budget,
            token,
        )
        .await?
        .into_text();

        let review = match parse_verdict(&reply) {
            Verdict::Supported => ClaimReview {
                note: format!("\"{}\": supported", claim.statement),
                claim: claim.verified(),
                citations_resolved: true,
            },
            Verdict::Contradicted { reason } => ClaimReview {
                note: format!("\"{}\": contradicted: {}", claim.statement, reason),
                claim: claim.flagged(reason),
                citations_resolved: true,
            },
        };
        Ok(review)
    }
}
