//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, colored output with live progress
    Text,
    /// One JSON object per event, then the result
    Json,
}

/// CLI arguments for counsel
#[derive(Parser, Debug)]
#[command(name = "counsel")]
#[command(author, version, about = "Cognitive orchestration for legal practice work")]
#[command(long_about = r#"
counsel turns a natural-language request into a plan of tool calls over the
firm's records, and runs legal questions through a deliberation of
specialists (facts, research, critique, drafting) whose reasoning is kept
in an auditable ledger.

Configuration files are loaded from (in priority order):
1. COUNSEL_* environment variables
2. --config <path>     Explicit config file
3. ./counsel.toml      Project-level config
4. ~/.config/counsel/config.toml   Global config

Example:
  counsel ask "Create client Acme Corp, then open a case for them" --tenant firm-a
  counsel deliberate "Can we appeal the ruling?" --tenant firm-a --case c-12 --jurisdiction NY
  counsel resume --session s-42 --answer "New York"
  counsel audit --session s-42 --public
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a request through analysis, planning, execution and formatting
    Ask {
        /// The request text
        text: String,

        /// Tenant the request acts for (defaults to store.default_tenant)
        #[arg(long)]
        tenant: Option<String>,

        /// Conversation session; a new one is generated when omitted
        #[arg(long)]
        session: Option<String>,

        /// Case the request refers to
        #[arg(long)]
        case: Option<String>,
    },

    /// Run the specialist deliberation pipeline on a legal question
    Deliberate {
        /// The legal question
        question: String,

        #[arg(long)]
        tenant: Option<String>,

        #[arg(long)]
        case: Option<String>,

        #[arg(long)]
        session: Option<String>,

        /// Jurisdiction, if already known
        #[arg(long)]
        jurisdiction: Option<String>,

        /// Party to the matter (repeatable)
        #[arg(long = "party", value_name = "NAME")]
        parties: Vec<String>,
    },

    /// Answer a pending clarifying question and continue the deliberation
    Resume {
        #[arg(long)]
        session: String,

        /// Tenant that owns the session (defaults to store.default_tenant)
        #[arg(long)]
        tenant: Option<String>,

        /// Answer to the pending question
        #[arg(long)]
        answer: String,
    },

    /// Print the ledger rounds of a session
    Audit {
        #[arg(long)]
        session: String,

        /// Tenant that owns the session (defaults to store.default_tenant)
        #[arg(long)]
        tenant: Option<String>,

        /// Show the public projection only (no private monologues)
        #[arg(long)]
        public: bool,
    },

    /// List the registered tools
    Tools,

    /// Show configuration sources and the effective configuration
    Config,
}
