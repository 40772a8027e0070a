//! Specialist response parsing.
//!
//! Specialists answer in a line-oriented sectioned format:
//!
//! ```text
//! MONOLOGUE: private reasoning (may span lines)
//! OPINION: what peers should read
//! CLAIM: statement [source_id | reference | quote]
//! JURISDICTION: Ontario
//! PARTY: Acme Ltd
//! FACT: contract signed March 2021
//! QUERY: next search query
//! VERDICT: SUPPORTED | CONTRADICTED <reason>
//! ```
//!
//! Parsing is pure and forgiving: unknown lines continue the previous
//! section, and a response with no sections becomes the public opinion.
//! Verdict parsing is conservative and defaults to flagged.

use super::claims::{Citation, Claim};
use serde::{Deserialize, Serialize};

/// Structured content of one specialist response
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StageResponse {
    pub monologue: String,
    pub opinion: String,
    pub claims: Vec<Claim>,
    pub jurisdiction: Option<String>,
    pub parties: Vec<String>,
    pub facts: Vec<String>,
    pub queries: Vec<String>,
}

impl StageResponse {
    /// All citations across claims, in order, without duplicates.
    pub fn citations(&self) -> Vec<Citation> {
        let mut out: Vec<Citation> = Vec::new();
        for citation in self.claims.iter().flat_map(|c| &c.citations) {
            if !out.contains(citation) {
                out.push(citation.clone());
            }
        }
        out
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Monologue,
    Opinion,
}

/// Parse a sectioned specialist response.
pub fn parse_stage_response(response: &str) -> StageResponse {
    let mut parsed = StageResponse::default();
    let mut section = Section::None;
    let mut saw_section = false;

    for line in response.lines() {
        match split_key(line) {
            Some(("MONOLOGUE", rest)) => {
                section = Section::Monologue;
                saw_section = true;
                append_line(&mut parsed.monologue, rest);
            }
            Some(("OPINION", rest)) => {
                section = Section::Opinion;
                saw_section = true;
                append_line(&mut parsed.opinion, rest);
            }
            Some((key, rest)) => {
                section = Section::None;
                saw_section = true;
                match key {
                    "CLAIM" => {
                        if let Some(claim) = parse_claim(rest) {
                            parsed.claims.push(claim);
                        }
                    }
                    "JURISDICTION" => {
                        if !is_unknown(rest) {
                            parsed.jurisdiction = Some(rest.to_string());
                        }
                    }
                    "PARTY" if !is_unknown(rest) => parsed.parties.push(rest.to_string()),
                    "FACT" if !rest.is_empty() => parsed.facts.push(rest.to_string()),
                    "QUERY" if !rest.is_empty() => parsed.queries.push(rest.to_string()),
                    _ => {}
                }
            }
            None => match section {
                Section::Monologue => append_line(&mut parsed.monologue, line.trim()),
                Section::Opinion => append_line(&mut parsed.opinion, line.trim()),
                Section::None => {}
            },
        }
    }

    if !saw_section {
        parsed.opinion = response.trim().to_string();
    }
    parsed
}

const KEYS: &[&str] = &[
    "MONOLOGUE",
    "OPINION",
    "CLAIM",
    "JURISDICTION",
    "PARTY",
    "FACT",
    "QUERY",
    "VERDICT",
];

fn split_key(line: &str) -> Option<(&'static str, &str)> {
    let trimmed = line.trim().trim_start_matches(['-', '*', ' ']);
    let (key, rest) = trimmed.split_once(':')?;
    let key = key.trim().trim_matches('*').to_uppercase();
    KEYS.iter()
        .find(|k| **k == key)
        .map(|k| (*k, rest.trim()))
}

fn append_line(target: &mut String, text: &str) {
    if text.is_empty() {
        return;
    }
    if !target.is_empty() {
        target.push('\n');
    }
    target.push_str(text);
}

fn is_unknown(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    lower.is_empty() || matches!(lower.as_str(), "unknown" | "none" | "n/a" | "?")
}

/// Parse `statement [source | reference | quote] [source2]`.
pub fn parse_claim(text: &str) -> Option<Claim> {
    let mut statement = text.trim();
    let mut citations = Vec::new();

    while statement.ends_with(']') {
        let Some(open) = statement.rfind('[') else {
            break;
        };
        let inner = &statement[open + 1..statement.len() - 1];
        let mut parts = inner.split('|').map(str::trim);
        match parts.next() {
            Some(source) if !source.is_empty() => {
                let citation = Citation::new(source)
                    .with_reference(parts.next().unwrap_or_default())
                    .with_quote(parts.next().unwrap_or_default());
                citations.push(citation);
            }
            _ => {}
        }
        statement = statement[..open].trim_end();
    }

    if statement.is_empty() {
        return None;
    }
    citations.reverse();
    Some(Claim {
        statement: statement.to_string(),
        citations,
        status: Default::default(),
    })
}

/// Critique outcome for a single claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Supported,
    Contradicted { reason: String },
}

/// Parse a critique response for one claim.
///
/// Only an explicit `SUPPORTED` without any negation counts as support;
/// anything ambiguous is treated as contradicted.
pub fn parse_verdict(response: &str) -> Verdict {
    let upper = response.to_uppercase();

    let negated = upper.contains("UNSUPPORTED")
        || upper.contains("NOT SUPPORTED")
        || upper.contains("CONTRADICT")
        || upper.contains("REFUTED");
    let supported = upper.contains("SUPPORTED") && !negated;

    if supported {
        return Verdict::Supported;
    }

    let reason = response
        .lines()
        .find_map(|line| match split_key(line) {
            Some(("VERDICT", rest)) => {
                let reason = match rest.split_once(char::is_whitespace) {
                    Some((word, tail)) if is_verdict_word(word) => tail,
                    _ if is_verdict_word(rest) => "",
                    _ => rest,
                };
                let reason = reason.trim_start_matches([':', '-', ' ']);
                (!reason.is_empty()).then(|| reason.to_string())
            }
            _ => None,
        })
        .unwrap_or_else(|| {
            if negated {
                "contradicted by critique".to_string()
            } else {
                "no clear verdict from critique".to_string()
            }
        });

    Verdict::Contradicted { reason }
}

fn is_verdict_word(word: &str) -> bool {
    matches!(
        word.trim_end_matches([':', ',', '.']).to_uppercase().as_str(),
        "SUPPORTED" | "UNSUPPORTED" | "CONTRADICTED" | "REFUTED" | "FLAGGED"
    )
}
