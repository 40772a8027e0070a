//! Console rendering of events, results and audit reports

use colored::Colorize;
use counsel_application::RunRequestOutput;
use counsel_domain::{
    ClaimStatus, ClarifyingQuestion, ConfidenceLabel, DeliberationRound, OrchestrationEvent,
    PublicRound, Recommendation, StepStatus, ToolDescriptor,
};
use serde_json::Value;

/// Maximum characters of a step result shown inline
const RESULT_PREVIEW: usize = 120;

pub struct ConsoleRenderer;

impl ConsoleRenderer {
    /// One line per event, as shown in the live stream.
    pub fn event_line(event: &OrchestrationEvent) -> String {
        match event {
            OrchestrationEvent::PlanCreated { goal, steps, .. } => {
                let mut line = format!("{} {} ({} steps)", "plan".cyan().bold(), goal, steps.len());
                for step in steps {
                    line.push_str(&format!("\n  {}. {} {}", step.step, step.tool.bold(), step.description.dimmed()));
                }
                line
            }
            OrchestrationEvent::StepStart {
                step_id,
                tool,
                attempt,
            } => {
                if *attempt > 1 {
                    format!("{} step {} {} (attempt {})", "->".cyan(), step_id, tool, attempt)
                } else {
                    format!("{} step {} {}", "->".cyan(), step_id, tool)
                }
            }
            OrchestrationEvent::StepComplete {
                step_id, result, ..
            } => format!("  {} step {} {}", "v".green(), step_id, preview(result).dimmed()),
            OrchestrationEvent::StepFailed {
                step_id,
                error,
                attempts,
            } => format!(
                "  {} step {} failed after {} attempt(s): {}",
                "x".red(),
                step_id,
                attempts,
                error
            ),
            OrchestrationEvent::PlanCompleted { .. } => format!("{}", "plan completed".green()),
            OrchestrationEvent::PlanFailed { failed_steps, .. } => format!(
                "{} (failed steps: {})",
                "plan failed".red(),
                failed_steps
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            OrchestrationEvent::AgentStatus { stage, message } => {
                format!("{} {}", format!("[{}]", stage).yellow().bold(), message)
            }
            OrchestrationEvent::Question { question, .. } => {
                format!("{} {}", "?".yellow().bold(), question)
            }
            OrchestrationEvent::Recommendation { confidence, .. } => format!(
                "{} confidence {}",
                "recommendation".green().bold(),
                Self::confidence(*confidence)
            ),
            OrchestrationEvent::Error { message, code } => match code {
                Some(code) => format!("{} [{}] {}", "error".red().bold(), code, message),
                None => format!("{} {}", "error".red().bold(), message),
            },
            OrchestrationEvent::Response { .. } => format!("{}", "done".green()),
        }
    }

    pub fn confidence(label: ConfidenceLabel) -> String {
        match label {
            ConfidenceLabel::High => label.as_str().green().bold().to_string(),
            ConfidenceLabel::Medium => label.as_str().yellow().bold().to_string(),
            ConfidenceLabel::Low => label.as_str().red().bold().to_string(),
        }
    }

    /// Final result of `ask`.
    pub fn request_output(output: &RunRequestOutput) -> String {
        let mut out = String::new();
        out.push_str(&Self::header("Result"));
        out.push_str(&format!(
            "\n{} {}   {} {}\n",
            "Status:".cyan().bold(),
            output.status.as_str(),
            "Classification:".cyan().bold(),
            output.analysis.classification.as_str()
        ));

        if let Some(plan) = &output.plan {
            out.push_str(&Self::section_header(&format!("Plan: {}", plan.goal)));
            for step in &plan.steps {
                let mark = match step.status {
                    StepStatus::Completed => "v".green(),
                    StepStatus::Failed => "x".red(),
                    _ => "-".dimmed(),
                };
                out.push_str(&format!(
                    "  {} {}. {} {}\n",
                    mark,
                    step.id.ordinal(),
                    step.tool_name.bold(),
                    step.message.as_deref().unwrap_or("").dimmed()
                ));
            }
        }

        if let Some(recommendation) = &output.recommendation {
            out.push_str(&Self::recommendation(recommendation));
        }
        if let Some(question) = &output.question {
            out.push_str(&Self::question(question, None));
        }

        if !output.response.is_empty() {
            out.push_str(&Self::section_header("Response"));
            out.push_str(&output.response);
            out.push('\n');
        }
        out.push_str(&Self::footer());
        out
    }

    pub fn recommendation(recommendation: &Recommendation) -> String {
        let mut out = Self::section_header("Recommendation");
        out.push_str(&format!(
            "{} {}   {} {} verified / {} flagged\n",
            "Confidence:".cyan().bold(),
            Self::confidence(recommendation.confidence),
            "Claims:".cyan().bold(),
            recommendation.tally.verified,
            recommendation.tally.flagged
        ));
        if recommendation.research_exhausted {
            out.push_str(&format!(
                "{}\n",
                "Research reached its cycle limit before the confidence threshold.".yellow()
            ));
        }
        out.push('\n');
        out.push_str(&recommendation.text);
        out.push('\n');

        if !recommendation.contributing_rounds.is_empty() {
            out.push_str(&format!("\n{}\n", "Contributing rounds:".dimmed()));
            for round in &recommendation.contributing_rounds {
                out.push_str(&format!("  * {}\n", round));
            }
        }
        out
    }

    /// A pending clarifying question, with the command that answers it.
    ///
    /// `resume` is the `(tenant, session)` the question belongs to.
    pub fn question(question: &ClarifyingQuestion, resume: Option<(&str, &str)>) -> String {
        let mut out = Self::section_header("Clarification needed");
        out.push_str(&format!("{}\n", question.text));
        if let Some((tenant, session)) = resume {
            out.push_str(&format!(
                "\n{} counsel resume --tenant {} --session {} --answer \"...\"\n",
                "Answer with:".dimmed(),
                tenant,
                session
            ));
        }
        out
    }

    /// Full audit view, including private monologues.
    pub fn audit_full(rounds: &[DeliberationRound]) -> String {
        if rounds.is_empty() {
            return format!("{}\n", "No rounds recorded for this session.".dimmed());
        }
        let mut out = Self::header("Verification ledger (full)");
        out.push('\n');
        for round in rounds {
            out.push_str(&Self::section_header(&format!(
                "Round {} - {}{}",
                round.round_number,
                round.role.as_str(),
                if round.verified { "" } else { " (unverified citations)" }
            )));
            out.push_str(&format!("{}\n", "Internal monologue:".magenta().bold()));
            out.push_str(&Self::indent(&round.internal_monologue, "  "));
            out.push_str(&format!("\n{}\n", "Public opinion:".cyan().bold()));
            out.push_str(&Self::indent(&round.public_opinion, "  "));
            out.push('\n');
            out.push_str(&Self::evidence(&round.cited_evidence, &round.claims));
        }
        out.push_str(&Self::footer());
        out
    }

    /// Public projection: what peers and the aggregator saw.
    pub fn audit_public(rounds: &[PublicRound]) -> String {
        if rounds.is_empty() {
            return format!("{}\n", "No rounds recorded for this session.".dimmed());
        }
        let mut out = Self::header("Verification ledger (public)");
        out.push('\n');
        for round in rounds {
            out.push_str(&Self::section_header(&format!(
                "Round {} - {}",
                round.round_number,
                round.role.as_str()
            )));
            out.push_str(&Self::indent(&round.public_opinion, "  "));
            out.push('\n');
            out.push_str(&Self::evidence(&round.cited_evidence, &round.claims));
        }
        out.push_str(&Self::footer());
        out
    }

    fn evidence(citations: &[counsel_domain::Citation], claims: &[counsel_domain::Claim]) -> String {
        let mut out = String::new();
        if !citations.is_empty() {
            out.push_str(&format!("{}\n", "Cited evidence:".cyan().bold()));
            for citation in citations {
                out.push_str(&format!("  * {}", citation.source_id.bold()));
                if !citation.reference.is_empty() {
                    out.push_str(&format!(" ({})", citation.reference));
                }
                if !citation.quote.is_empty() {
                    out.push_str(&format!(" \"{}\"", citation.quote.dimmed()));
                }
                out.push('\n');
            }
        }
        if !claims.is_empty() {
            out.push_str(&format!("{}\n", "Claims:".cyan().bold()));
            for claim in claims {
                let status = match &claim.status {
                    ClaimStatus::Verified => "verified".green().to_string(),
                    ClaimStatus::Flagged { reason } => format!("{} ({})", "flagged".red(), reason),
                    ClaimStatus::Unverified => "unverified".dimmed().to_string(),
                };
                out.push_str(&format!("  * [{}] {}\n", status, claim.statement));
            }
        }
        out
    }

    pub fn tools(tools: &[&ToolDescriptor]) -> String {
        let mut out = Self::header("Tools");
        out.push('\n');
        for tool in tools {
            let params = tool
                .parameters
                .iter()
                .map(|p| {
                    if p.required {
                        p.name.clone()
                    } else {
                        format!("{}?", p.name)
                    }
                })
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!(
                "{:<28} {:<6} {}\n  {}\n",
                tool.name.bold(),
                tool.side_effect.as_str().dimmed(),
                params,
                tool.description.dimmed()
            ));
        }
        out.push_str(&Self::footer());
        out
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn preview(value: &Value) -> String {
    let text = value.to_string();
    if text.chars().count() <= RESULT_PREVIEW {
        return text;
    }
    let cut: String = text.chars().take(RESULT_PREVIEW).collect();
    format!("{}...", cut)
}
