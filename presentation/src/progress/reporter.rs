//! Live rendering of the orchestration event stream

use crate::output::console::ConsoleRenderer;
use crate::output::json::JsonRenderer;
use counsel_application::EventSink;
use counsel_domain::OrchestrationEvent;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner that shows the current activity and prints each event above it.
pub struct ProgressReporter {
    spinner: ProgressBar,
}

impl ProgressReporter {
    pub fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            spinner.set_style(style);
        }
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message("Analyzing request...");
        Self { spinner }
    }

    fn status(event: &OrchestrationEvent) -> Option<String> {
        match event {
            OrchestrationEvent::PlanCreated { .. } => Some("Executing plan...".to_string()),
            OrchestrationEvent::StepStart { step_id, tool, .. } => {
                Some(format!("Step {}: {}", step_id, tool))
            }
            OrchestrationEvent::AgentStatus { stage, .. } => {
                Some(format!("{} specialist working...", stage))
            }
            _ => None,
        }
    }

    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for ProgressReporter {
    fn emit(&self, event: OrchestrationEvent) {
        self.spinner.println(ConsoleRenderer::event_line(&event));
        if let Some(message) = Self::status(&event) {
            self.spinner.set_message(message);
        }
        if event.is_terminal() {
            self.spinner.finish_and_clear();
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

/// Plain line-per-event output (no spinner)
pub struct SimpleProgress;

impl EventSink for SimpleProgress {
    fn emit(&self, event: OrchestrationEvent) {
        println!("{}", ConsoleRenderer::event_line(&event));
    }
}

/// One JSON object per event on stdout
pub struct JsonLinesProgress;

impl EventSink for JsonLinesProgress {
    fn emit(&self, event: OrchestrationEvent) {
        println!("{}", JsonRenderer::line(&event));
    }
}
