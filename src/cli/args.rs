//! CLI argument definitions and parsing structures
//!
//! This module defines the command-line interface structure using clap,
//! including the main `Cli` struct and the subcommand enum.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// draftloop - research, outline, write and score content with an LLM
#[derive(Parser, Debug)]
#[command(name = "draftloop")]
#[command(about = "Research a topic, approve an outline, generate content and score it")]
#[command(long_about = r#"
draftloop runs a content workflow: web research on a topic, a structured
outline you approve or revise, a full article written from the approved
outline, and a concurrent three-criteria quality evaluation.

EXAMPLES:
  # Interactive session
  draftloop run

  # Non-interactive session with JSON output
  draftloop run --topic "Quantum Computing" --auto-approve --json

  # Score existing text without generating anything
  draftloop judge --outline outline.md --content article.md

  # Show the effective configuration and where each value came from
  draftloop config

CONFIGURATION:
  Configuration is loaded with precedence: CLI flags > config file > defaults
  Config file is discovered by searching upward from CWD for .draftloop/config.toml
  Use --config to specify an explicit config file path
  API keys are read from the environment; a .env file is loaded at start-up

STAGES:
  Research → Outline → (approval) → Content → Judge
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Model for every stage unless a stage override is configured
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Text generation provider: gemini, openrouter or anthropic
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Per-call stage timeout in seconds (default: 600, min: 5)
    #[arg(long, global = true)]
    pub stage_timeout: Option<u64>,

    /// Run research without web search
    #[arg(long, global = true)]
    pub no_search: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a full content session
    ///
    /// Prompts for a topic, shows the drafted outline and loops on change
    /// requests until you approve it, then generates content, asks for
    /// feedback and prints the evaluation.
    ///
    /// EXAMPLES:
    ///   draftloop run
    ///   draftloop run --topic "Rust async runtimes"
    ///   draftloop run --topic "Quantum Computing" --auto-approve --feedback "Too technical" --json
    Run {
        /// Topic to write about (prompted for when omitted)
        #[arg(long)]
        topic: Option<String>,

        /// Approve the first outline without prompting
        #[arg(long)]
        auto_approve: bool,

        /// Feedback passed to the judge (prompted for when omitted)
        #[arg(long)]
        feedback: Option<String>,

        /// Maximum outline change requests (default: unlimited)
        #[arg(long)]
        max_revisions: Option<u32>,

        /// Print the finished session as JSON
        #[arg(long)]
        json: bool,
    },

    /// Score existing text with the concurrent judge
    ///
    /// EXAMPLES:
    ///   draftloop judge --outline outline.md --content article.md
    ///   draftloop judge --outline outline.md --content article.md --research notes.md --json
    Judge {
        /// File holding the outline
        #[arg(long)]
        outline: PathBuf,

        /// File holding the article
        #[arg(long)]
        content: PathBuf,

        /// File holding the research summary (the article is rated when omitted)
        #[arg(long)]
        research: Option<PathBuf>,

        /// Reader feedback included in the content rubric
        #[arg(long)]
        feedback: Option<String>,

        /// Topic used for log correlation
        #[arg(long)]
        topic: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration with sources
    Config,
}

impl Commands {
    /// Operation name used in error reports.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Run { .. } => "run",
            Self::Judge { .. } => "judge",
            Self::Config => "config",
        }
    }
}

/// Build the clap command, for help rendering and completion generation.
#[must_use]
pub fn build_cli() -> clap::Command {
    use clap::CommandFactory;
    Cli::command()
}
