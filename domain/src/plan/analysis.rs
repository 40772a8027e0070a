//! Request analysis (the ANALYZE phase).
//!
//! Pure, keyword-driven classification of a request. No model call is made
//! here: the outcome only decides which path the request takes, and a cheap
//! deterministic rule is easier to audit than a model's judgement.

use crate::core::request::Request;
use crate::core::string::words;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Longest request text accepted, in characters.
pub const MAX_REQUEST_CHARS: usize = 20_000;

/// Malformed input. Reported to the requester, never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyzeError {
    #[error("Request text is empty")]
    EmptyRequest,

    #[error("Request text is too long ({len} chars, max {max})")]
    TooLong { len: usize, max: usize },
}

/// Entity types the legal data model knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Client,
    Case,
    Hearing,
    Document,
    Deadline,
    Note,
}

impl EntityType {
    pub fn all() -> [EntityType; 6] {
        [
            EntityType::Client,
            EntityType::Case,
            EntityType::Hearing,
            EntityType::Document,
            EntityType::Deadline,
            EntityType::Note,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Client => "client",
            EntityType::Case => "case",
            EntityType::Hearing => "hearing",
            EntityType::Document => "document",
            EntityType::Deadline => "deadline",
            EntityType::Note => "note",
        }
    }

    /// Name of the backing schema entity (`clients`, `cases`, ...)
    pub fn collection(&self) -> String {
        format!("{}s", self.as_str())
    }

    fn from_word(word: &str) -> Option<Self> {
        let singular = word.strip_suffix('s').unwrap_or(word);
        match singular {
            "client" => Some(EntityType::Client),
            "case" => Some(EntityType::Case),
            "hearing" => Some(EntityType::Hearing),
            "document" | "doc" => Some(EntityType::Document),
            "deadline" => Some(EntityType::Deadline),
            "note" => Some(EntityType::Note),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Complexity class of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Single action on a single entity: executed as one implicit step
    Simple,
    /// Multi-entity or multi-action: needs an explicit plan
    Complex,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Simple => "simple",
            Classification::Complex => "complex",
        }
    }
}

/// Conversation state carried between turns of one session.
///
/// Only what analysis needs: which entities the previous turns were about,
/// so that follow-ups like "schedule a hearing for it" resolve sensibly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationContext {
    pub recent_entities: BTreeSet<EntityType>,
    pub turns: usize,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a finished turn's analysis into the context.
    pub fn record(&mut self, analysis: &Analysis) {
        self.recent_entities = analysis.entities.clone();
        self.turns += 1;
    }
}

/// Outcome of ANALYZE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub classification: Classification,
    pub entities: BTreeSet<EntityType>,
    pub actions: Vec<String>,
    pub requires_deliberation: bool,
}

impl Analysis {
    pub fn is_simple(&self) -> bool {
        self.classification == Classification::Simple
    }
}

const ACTION_VERBS: &[&str] = &[
    "create", "open", "add", "register", "schedule", "update", "change", "edit", "delete",
    "remove", "close", "find", "list", "show", "search", "get", "file", "draft", "set",
];

const SEQUENCING: &[&str] = &["then", "afterwards", "afterward", "next", "finally"];

const DELIBERATION_TERMS: &[&str] = &[
    "advise", "advice", "opinion", "strategy", "recommend", "recommendation", "chances",
    "liability", "liable", "merits",
];

const PRONOUNS: &[&str] = &["it", "them", "they", "that", "this", "him", "her"];

/// Classify a request. Pure function of the request text and context.
pub fn analyze(request: &Request, context: &ConversationContext) -> Result<Analysis, AnalyzeError> {
    analyze_text(request.raw_text(), context)
}

pub fn analyze_text(text: &str, context: &ConversationContext) -> Result<Analysis, AnalyzeError> {
    if text.trim().is_empty() {
        return Err(AnalyzeError::EmptyRequest);
    }
    let len = text.chars().count();
    if len > MAX_REQUEST_CHARS {
        return Err(AnalyzeError::TooLong {
            len,
            max: MAX_REQUEST_CHARS,
        });
    }

    let tokens = words(text);

    let mut entities: BTreeSet<EntityType> =
        tokens.iter().filter_map(|w| EntityType::from_word(w)).collect();

    let actions: Vec<String> = tokens
        .iter()
        .filter(|w| ACTION_VERBS.contains(&w.as_str()))
        .cloned()
        .collect();

    if entities.is_empty() && tokens.iter().any(|w| PRONOUNS.contains(&w.as_str())) {
        entities = context.recent_entities.clone();
    }

    let sequenced = tokens.iter().any(|w| SEQUENCING.contains(&w.as_str()))
        || text.to_lowercase().contains("after that");

    let requires_deliberation = tokens
        .iter()
        .any(|w| DELIBERATION_TERMS.contains(&w.as_str()))
        || contains_phrase(&tokens, &["should", "we"])
        || contains_phrase(&tokens, &["should", "i"]);

    let classification = if actions.len() > 1 || entities.len() > 1 || sequenced {
        Classification::Complex
    } else {
        Classification::Simple
    };

    Ok(Analysis {
        classification,
        entities,
        actions,
        requires_deliberation,
    })
}

fn contains_phrase(tokens: &[String], phrase: &[&str]) -> bool {
    tokens
        .windows(phrase.len())
        .any(|w| w.iter().zip(phrase).all(|(a, b)| a == b))
}
