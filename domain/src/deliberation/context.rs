//! Case context threaded explicitly through every deliberation stage.
//!
//! There is no ambient or global context: every stage receives the
//! [`CaseContext`] it works on as a parameter.

use crate::core::error::DomainError;
use crate::core::ids::{CaseId, SessionId, TenantId};
use serde::{Deserialize, Serialize};

/// Facts without which deliberation cannot proceed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalFact {
    Jurisdiction,
    Parties,
}

impl CriticalFact {
    pub fn as_str(&self) -> &'static str {
        match self {
            CriticalFact::Jurisdiction => "jurisdiction",
            CriticalFact::Parties => "parties",
        }
    }

    fn prompt(&self) -> &'static str {
        match self {
            CriticalFact::Jurisdiction => "Which jurisdiction (court, state or country) governs this matter?",
            CriticalFact::Parties => "Who are the parties involved (names of claimant and respondent)?",
        }
    }
}

/// A question surfaced to the requester when critical facts are missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarifyingQuestion {
    pub missing: Vec<CriticalFact>,
    pub text: String,
}

impl ClarifyingQuestion {
    pub fn for_missing(missing: Vec<CriticalFact>) -> Self {
        let text = missing
            .iter()
            .map(|fact| fact.prompt())
            .collect::<Vec<_>>()
            .join(" ");
        Self { missing, text }
    }
}

/// A clarifying question together with the requester's answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clarification {
    pub question: String,
    pub answer: String,
}

/// Everything known about the matter under deliberation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseContext {
    pub tenant_id: TenantId,
    pub session_id: SessionId,
    pub case_id: Option<CaseId>,
    /// The legal question being deliberated
    pub question: String,
    pub jurisdiction: Option<String>,
    #[serde(default)]
    pub parties: Vec<String>,
    #[serde(default)]
    pub facts: Vec<String>,
    #[serde(default)]
    pub clarifications: Vec<Clarification>,
    /// Set while the pipeline is suspended waiting for an answer
    #[serde(default)]
    pub pending_question: Option<ClarifyingQuestion>,
}

impl CaseContext {
    pub fn new(tenant_id: TenantId, session_id: SessionId, question: impl Into<String>) -> Self {
        Self {
            tenant_id,
            session_id,
            case_id: None,
            question: question.into(),
            jurisdiction: None,
            parties: Vec::new(),
            facts: Vec::new(),
            clarifications: Vec::new(),
            pending_question: None,
        }
    }

    pub fn with_case(mut self, case_id: CaseId) -> Self {
        self.case_id = Some(case_id);
        self
    }

    pub fn with_jurisdiction(mut self, jurisdiction: impl Into<String>) -> Self {
        self.set_jurisdiction(jurisdiction);
        self
    }

    pub fn with_party(mut self, party: impl Into<String>) -> Self {
        self.add_party(party);
        self
    }

    pub fn with_fact(mut self, fact: impl Into<String>) -> Self {
        self.add_fact(fact);
        self
    }

    pub fn set_jurisdiction(&mut self, jurisdiction: impl Into<String>) {
        let jurisdiction = jurisdiction.into();
        let trimmed = jurisdiction.trim();
        if !trimmed.is_empty() {
            self.jurisdiction = Some(trimmed.to_string());
        }
    }

    /// Add a party, ignoring blanks and case-insensitive duplicates.
    pub fn add_party(&mut self, party: impl Into<String>) {
        let party = party.into();
        let trimmed = party.trim();
        if !trimmed.is_empty()
            && !self
                .parties
                .iter()
                .any(|p| p.eq_ignore_ascii_case(trimmed))
        {
            self.parties.push(trimmed.to_string());
        }
    }

    pub fn add_fact(&mut self, fact: impl Into<String>) {
        let fact = fact.into();
        let trimmed = fact.trim();
        if !trimmed.is_empty() && !self.facts.iter().any(|f| f == trimmed) {
            self.facts.push(trimmed.to_string());
        }
    }

    /// Gap analysis: which critical facts are still unknown.
    pub fn missing_critical(&self) -> Vec<CriticalFact> {
        let mut missing = Vec::new();
        if self.jurisdiction.is_none() {
            missing.push(CriticalFact::Jurisdiction);
        }
        if self.parties.is_empty() {
            missing.push(CriticalFact::Parties);
        }
        missing
    }

    pub fn is_suspended(&self) -> bool {
        self.pending_question.is_some()
    }

    /// Suspend on `missing`, returning the question to surface.
    pub fn suspend(&mut self, missing: Vec<CriticalFact>) -> ClarifyingQuestion {
        let question = ClarifyingQuestion::for_missing(missing);
        self.pending_question = Some(question.clone());
        question
    }

    /// Record the requester's answer to the pending question.
    ///
    /// When the question asked for a single fact, the answer fills it in
    /// directly. Otherwise the answer is kept as a clarification for the
    /// Facts stage to deconstruct on resume.
    pub fn answer_clarification(&mut self, answer: &str) -> Result<(), DomainError> {
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(DomainError::EmptyAnswer);
        }
        let question = self
            .pending_question
            .take()
            .ok_or(DomainError::NothingPending)?;

        match question.missing.as_slice() {
            [CriticalFact::Jurisdiction] => self.set_jurisdiction(answer),
            [CriticalFact::Parties] => {
                for party in split_parties(answer) {
                    self.add_party(party);
                }
            }
            _ => {}
        }

        self.clarifications.push(Clarification {
            question: question.text,
            answer: answer.to_string(),
        });
        Ok(())
    }

    /// Context rendered for prompts.
    pub fn to_prompt_context(&self) -> String {
        let mut out = format!("Question: {}\n", self.question);
        if let Some(case_id) = &self.case_id {
            out.push_str(&format!("Case: {}\n", case_id));
        }
        out.push_str(&format!(
            "Jurisdiction: {}\n",
            self.jurisdiction.as_deref().unwrap_or("(unknown)")
        ));
        if self.parties.is_empty() {
            out.push_str("Parties: (unknown)\n");
        } else {
            out.push_str(&format!("Parties: {}\n", self.parties.join(", ")));
        }
        if !self.facts.is_empty() {
            out.push_str("Known facts:\n");
            for fact in &self.facts {
                out.push_str(&format!("- {}\n", fact));
            }
        }
        if !self.clarifications.is_empty() {
            out.push_str("Clarifications from the requester:\n");
            for c in &self.clarifications {
                out.push_str(&format!("- Q: {}\n  A: {}\n", c.question, c.answer));
            }
        }
        out
    }
}

fn split_parties(answer: &str) -> Vec<&str> {
    answer
        .split([',', ';'])
        .flat_map(|part| part.split(" and "))
        .flat_map(|part| part.split(" v. "))
        .flat_map(|part| part.split(" vs "))
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}
