//! Prompt templates for the deliberation specialists.
//!
//! Every template takes the explicit [`CaseContext`] plus the *public*
//! rounds of earlier stages. Private monologues never reach a prompt.

use crate::deliberation::{CaseContext, Claim, PublicRound, SearchHit};

const RESPONSE_FORMAT: &str = r#"## Response Format

Answer using these line prefixes:
MONOLOGUE: your private reasoning (only human auditors read this)
OPINION: your conclusion for the other specialists
CLAIM: a statement [source_id | reference | quote]   (one line per claim)"#;

/// Templates for the Facts → Research → Critique → Drafting pipeline
pub struct DeliberationPromptTemplate;

impl DeliberationPromptTemplate {
    fn public_record(rounds: &[PublicRound]) -> String {
        if rounds.is_empty() {
            return "(no earlier opinions)".to_string();
        }
        rounds
            .iter()
            .map(|r| format!("### {} (round {})\n{}", r.role, r.round_number, r.public_opinion))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn evidence(hits: &[SearchHit]) -> String {
        if hits.is_empty() {
            return "(no sources found)".to_string();
        }
        hits.iter()
            .map(|h| format!("[{}] (score {:.2}) {}", h.source_id, h.score, h.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Facts stage: deconstruct the matter into structured entities.
    pub fn facts(context: &CaseContext) -> String {
        format!(
            r#"## Role

You are the Facts specialist. Extract the structured facts of this matter.

## Case Context

{context}
{format}
JURISDICTION: governing jurisdiction, or "unknown"
PARTY: one line per party
FACT: one line per material fact"#,
            context = context.to_prompt_context(),
            format = RESPONSE_FORMAT,
        )
    }

    /// Research stage: propose the next search query.
    pub fn research_query(
        context: &CaseContext,
        earlier: &[PublicRound],
        previous_query: Option<&str>,
        previous_hits: &[SearchHit],
        broaden: bool,
    ) -> String {
        let direction = match previous_query {
            None => "Propose the first search query.".to_string(),
            Some(q) if broaden => format!(
                "The query \"{}\" found too little. Propose a BROADER query.",
                q
            ),
            Some(q) => format!(
                "The query \"{}\" found relevant but unfocused material. Propose a NARROWER query.",
                q
            ),
        };

        format!(
            r#"## Role

You are the Research specialist searching the firm's legal knowledge base.

## Case Context

{context}
## Earlier Opinions

{record}

## Previous Results

{hits}

## Instruction

{direction}
Answer with a single line: QUERY: <search terms>"#,
            context = context.to_prompt_context(),
            record = Self::public_record(earlier),
            hits = Self::evidence(previous_hits),
            direction = direction,
        )
    }

    /// Research stage: synthesise the gathered evidence into claims.
    pub fn research_synthesis(
        context: &CaseContext,
        earlier: &[PublicRound],
        evidence: &[SearchHit],
    ) -> String {
        format!(
            r#"## Role

You are the Research specialist. Summarise what the sources establish.
Cite only the source ids shown below.

## Case Context

{context}
## Earlier Opinions

{record}

## Sources

{evidence}

{format}"#,
            context = context.to_prompt_context(),
            record = Self::public_record(earlier),
            evidence = Self::evidence(evidence),
            format = RESPONSE_FORMAT,
        )
    }

    /// Critique stage: systematic doubt applied to one claim.
    pub fn critique(context: &CaseContext, claim: &Claim, sources: &[SearchHit]) -> String {
        let citations = claim
            .citations
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        format!(
            r#"## Role

You are the Critique specialist. Try to refute the claim below: look for a
contradicting source or a flaw in its reasoning.

## Case Context

{context}
## Claim

{statement} {citations}

## Cited Sources

{sources}

## Response Format

VERDICT: SUPPORTED
or
VERDICT: CONTRADICTED <reason>"#,
            context = context.to_prompt_context(),
            statement = claim.statement,
            citations = citations,
            sources = Self::evidence(sources),
        )
    }

    /// Drafting stage: compose the recommendation from verified claims only.
    pub fn drafting(context: &CaseContext, earlier: &[PublicRound], verified: &[Claim]) -> String {
        let claims = if verified.is_empty() {
            "(no claims survived critique)".to_string()
        } else {
            verified
                .iter()
                .map(|c| {
                    let cites = c
                        .citations
                        .iter()
                        .map(|x| x.to_string())
                        .collect::<Vec<_>>()
                        .join(" ");
                    format!("- {} {}", c.statement, cites)
                })
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            r#"## Role

You are the Drafting specialist. Write the recommendation to the lawyer.
Rely ONLY on the verified claims below; do not introduce new authority.

## Case Context

{context}
## Earlier Opinions

{record}

## Verified Claims

{claims}

{format}"#,
            context = context.to_prompt_context(),
            record = Self::public_record(earlier),
            claims = claims,
            format = RESPONSE_FORMAT,
        )
    }
}
