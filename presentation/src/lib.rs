//! Presentation layer for counsel
//!
//! This crate contains CLI definitions, console and JSON renderers, and
//! event-stream progress reporters.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{Cli, Command, OutputFormat};
pub use output::console::ConsoleRenderer;
pub use output::json::JsonRenderer;
pub use progress::reporter::{JsonLinesProgress, ProgressReporter, SimpleProgress};
