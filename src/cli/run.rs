//! CLI entry point and dispatch logic
//!
//! This module owns the `run()` function which:
//! - Parses CLI arguments and loads `.env`
//! - Initializes tracing
//! - Builds CliArgs and discovers Config
//! - Creates the tokio runtime
//! - Dispatches to command handlers
//! - Handles all error output

use clap::Parser;
use draftloop_config::{CliArgs, Config};
use draftloop_utils::error::{ConfigError, DraftloopError};
use draftloop_utils::logging::init_tracing;
use draftloop_utils::redaction::redact_error_message;
use draftloop_utils::ExitCode;

use super::args::{Cli, Commands};
use super::commands::{self, JudgeFiles};
use crate::session::SessionOptions;

/// Main CLI execution function.
///
/// This function handles ALL output including errors. On error it prints a
/// report to stderr and returns the exit code; main.rs only calls
/// `std::process::exit(code.as_i32())`.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();
    run_with(cli)
}

/// Run an already-parsed command line.
pub fn run_with(cli: Cli) -> Result<(), ExitCode> {
    // A missing .env file is not an error.
    let _ = dotenv::dotenv();

    if let Err(e) = init_tracing(cli.verbose, cli.log_json) {
        eprintln!("warning: failed to initialize logging: {e}");
    }

    let cli_args = cli_args_from(&cli);
    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => {
            match err.downcast_ref::<ConfigError>() {
                Some(config_err) => {
                    let report = DraftloopError::Config(config_err.clone()).display_for_user();
                    eprintln!("{report}");
                }
                None => eprintln!("✗ Configuration error: {}", redact_error_message(&format!("{err:#}"))),
            }
            return Err(ExitCode::CLI_ARGS);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("✗ Failed to create async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    let operation = cli.command.operation();
    let result = rt.block_on(async {
        match &cli.command {
            Commands::Run {
                topic,
                auto_approve,
                feedback,
                json,
                ..
            } => {
                let options = SessionOptions {
                    topic: topic.clone(),
                    auto_approve: *auto_approve,
                    feedback: feedback.clone(),
                    json: *json,
                };
                commands::execute_run_command(&config, &options).await
            }
            Commands::Judge {
                outline,
                content,
                research,
                feedback,
                topic,
                json,
            } => {
                let files = JudgeFiles {
                    outline,
                    content,
                    research: research.as_deref(),
                    feedback: feedback.as_deref(),
                    topic: topic.as_deref(),
                };
                commands::execute_judge_command(&config, &files, *json).await
            }
            Commands::Config => commands::execute_config_command(&config),
        }
    });

    let Err(error) = result else {
        return Ok(());
    };

    if let Some(draftloop_error) = error.downcast_ref::<DraftloopError>() {
        eprintln!("✗ {operation} failed\n\n{}", draftloop_error.display_for_user());
        return Err(draftloop_error.to_exit_code());
    }

    eprintln!(
        "✗ {operation} failed: {}",
        redact_error_message(&format!("{error:#}"))
    );
    eprintln!("\n  Run with --verbose for more detailed output");
    Err(ExitCode::INTERNAL)
}

/// Map parsed flags onto configuration overrides.
#[must_use]
pub fn cli_args_from(cli: &Cli) -> CliArgs {
    let max_revisions = match &cli.command {
        Commands::Run { max_revisions, .. } => *max_revisions,
        Commands::Judge { .. } | Commands::Config => None,
    };

    CliArgs {
        config_path: cli.config.clone(),
        model: cli.model.clone(),
        stage_timeout: cli.stage_timeout,
        verbose: cli.verbose.then_some(true),
        max_revisions,
        llm_provider: cli.provider.clone(),
        search_enabled: cli.no_search.then_some(false),
    }
}
