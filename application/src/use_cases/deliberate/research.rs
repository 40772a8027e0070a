//! Research stage: bounded retrieval cycles, then synthesis into claims.
//!
//! Each cycle asks the model for a query (broader when the previous one
//! found too little, narrower otherwise), searches, and scores the hits.
//! The loop stops early once the evidence confidence reaches the
//! threshold. Hitting the cycle cap is not a failure: the best evidence
//! set seen so far is used and the findings are marked exhausted.

use super::DeliberationOrchestrator;
use super::types::{DeliberationError, ResearchFindings};
use crate::ports::event_sink::EventSink;
use crate::ports::retrieval::SearchFilters;
use crate::use_cases::shared::{Bounded, bounded, is_cancelled};
use counsel_domain::core::string::truncate;
use counsel_domain::{
    AgentRole, CaseContext, DeliberationPromptTemplate, DeliberationRound, OrchestrationEvent,
    RoundRef, SearchHit,
    deliberation::{evidence_confidence, parse_stage_response},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const QUOTE_CHARS: usize = 160;

impl DeliberationOrchestrator {
    pub(super) async fn research_stage(
        &self,
        context: &CaseContext,
        recorded: &mut Vec<RoundRef>,
        events: &dyn EventSink,
        token: &Option<CancellationToken>,
    ) -> Result<ResearchFindings, DeliberationError> {
        let role = AgentRole::Research;
        let earlier = self
            .ledger
            .read_public(&context.tenant_id, &context.session_id)
            .await?;
        let filters =
            SearchFilters::for_tenant(context.tenant_id.clone()).with_case(context.case_id.clone());
        let top_k = self.params.research_top_k;
        let threshold = self.params.research_confidence_threshold;

        let mut best: Option<(f64, Vec<SearchHit>)> = None;
        let mut previous_query: Option<String> = None;
        let mut previous_hits: Vec<SearchHit> = Vec::new();
        let mut broaden = false;
        let mut reached = false;
        let mut trail = Vec::new();

        for cycle in 1..=self.params.research_max_cycles {
            let prompt = DeliberationPromptTemplate::research_query(
                context,
                &earlier,
                previous_query.as_deref(),
                &previous_hits,
                broaden,
            );
            let reply = self.ask(role, &prompt, recorded, token).await?;
            let query = parse_stage_response(&reply)
                .queries
                .into_iter()
                .next()
                .or_else(|| previous_query.clone())
                .unwrap_or_else(|| context.question.clone());

            let hits = self.search(&query, top_k, &filters, recorded, token).await?;
            let scores: Vec<f64> = hits.iter().map(|h| h.score).collect();
            let confidence = evidence_confidence(&scores);
            debug!(cycle, query = %query, hits = hits.len(), confidence, "Research cycle");
            trail.push(format!(
                "cycle {}: \"{}\" -> {} source(s), confidence {:.2}",
                cycle,
                query,
                hits.len(),
                confidence
            ));
            events.emit(OrchestrationEvent::agent_status(
                role,
                format!(
                    "Cycle {}: {} source(s), confidence {:.2}",
                    cycle,
                    hits.len(),
                    confidence
                ),
            ));

            if best.as_ref().is_none_or(|(c, _)| confidence > *c) {
                best = Some((confidence, hits.clone()));
            }
            if confidence >= threshold {
                reached = true;
                break;
            }

            broaden = hits.len() < top_k;
            previous_query = Some(query);
            previous_hits = hits;
        }

        let exhausted = !reached;
        let (confidence, evidence) = best.unwrap_or((0.0, Vec::new()));
        if exhausted {
            warn!(
                session = %context.session_id,
                cycles = self.params.research_max_cycles,
                confidence,
                "Research cycle cap reached below confidence threshold"
            );
        }

        let prompt = DeliberationPromptTemplate::research_synthesis(context, &earlier, &evidence);
        let reply = self.ask(role, &prompt, recorded, token).await?;
        let parsed = parse_stage_response(&reply);

        let mut monologue = trail.join("\n");
        if exhausted {
            monologue.push_str("\ncycle cap reached; using best evidence set");
        }
        if !parsed.monologue.is_empty() {
            monologue.push('\n');
            monologue.push_str(&parsed.monologue);
        }

        let mut cited: Vec<_> = evidence
            .iter()
            .map(|hit| hit.to_citation().with_quote(truncate(&hit.content, QUOTE_CHARS)))
            .collect();
        for citation in parsed.citations() {
            if !cited.iter().any(|c| c.source_id == citation.source_id) {
                cited.push(citation);
            }
        }

        let verified = self.citations_resolve(&context.tenant_id, &cited).await;
        let round = DeliberationRound::new(
            context.tenant_id.clone(),
            context.session_id.clone(),
            self.next_round(context).await?,
            role,
        )
        .with_monologue(monologue)
        .with_opinion(parsed.opinion)
        .with_evidence(cited)
        .with_claims(parsed.claims.clone())
        .with_verified(verified);
        self.record(round, recorded).await?;

        Ok(ResearchFindings {
            claims: parsed.claims,
            evidence,
            exhausted,
        })
    }

    /// One retrieval call, retried on transient failures within the stage budget.
    async fn search(
        &self,
        query: &str,
        top_k: usize,
        filters: &SearchFilters,
        recorded: &[RoundRef],
        token: &Option<CancellationToken>,
    ) -> Result<Vec<SearchHit>, DeliberationError> {
        let mut attempts = 0;
        loop {
            if is_cancelled(token) {
                return Err(DeliberationError::Cancelled {
                    rounds_recorded: recorded.to_vec(),
                });
            }
            attempts += 1;
            let error = match bounded(
                self.retrieval.search(query, top_k, filters),
                self.execution.retrieval_timeout,
                token,
            )
            .await
            {
                Bounded::Done(Ok(hits)) => return Ok(hits),
                Bounded::Done(Err(e)) => e,
                Bounded::TimedOut => crate::ports::retrieval::RetrievalError::Timeout,
                Bounded::Cancelled => {
                    return Err(DeliberationError::Cancelled {
                        rounds_recorded: recorded.to_vec(),
                    });
                }
            };

            if !error.is_transient() || attempts > self.params.stage_retry_budget {
                return Err(DeliberationError::Aborted {
                    stage: AgentRole::Research,
                    reason: format!("retrieval failed after {} attempt(s): {}", attempts, error),
                    rounds_recorded: recorded.to_vec(),
                });
            }
            warn!(attempt = attempts, error = %error, "Retrieval failed, retrying");
        }
    }
}
