//! JSON rendering of results

use counsel_application::RunRequestOutput;
use counsel_domain::{CaseContext, ClarifyingQuestion, Recommendation};
use serde::Serialize;
use serde_json::{Value, json};

pub struct JsonRenderer;

impl JsonRenderer {
    pub fn request_output(output: &RunRequestOutput) -> Value {
        json!({
            "status": output.status,
            "phases": output.phases,
            "analysis": output.analysis,
            "plan": output.plan,
            "response": output.response,
            "recommendation": output.recommendation,
            "question": output.question,
            "session_id": output.case_context.as_ref().map(|c| &c.session_id),
        })
    }

    pub fn deliberation(
        context: &CaseContext,
        recommendation: Option<&Recommendation>,
        question: Option<&ClarifyingQuestion>,
    ) -> Value {
        json!({
            "session_id": context.session_id,
            "status": if question.is_some() { "needs_clarification" } else { "recommended" },
            "recommendation": recommendation,
            "question": question,
            "context": context,
        })
    }

    /// Pretty JSON, falling back to `{}` for values that cannot serialize.
    pub fn pretty<T: Serialize + ?Sized>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }

    /// Compact, single-line JSON for event streams.
    pub fn line<T: Serialize + ?Sized>(value: &T) -> String {
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use counsel_domain::{CriticalFact, SessionId, TenantId};

    #[test]
    fn test_deliberation_question() {
        let context = CaseContext::new(TenantId::new("t"), SessionId::new("s-9"), "Can we sue?");
        let question = ClarifyingQuestion::for_missing(vec![CriticalFact::Jurisdiction]);
        let value = JsonRenderer::deliberation(&context, None, Some(&question));

        assert_eq!(value["status"], "needs_clarification");
        assert_eq!(value["session_id"], "s-9");
        assert!(value["recommendation"].is_null());
        assert_eq!(value["question"]["missing"][0], "jurisdiction");
    }
}
