//! Logging and observability for draftloop.
//!
//! Structured logging with tracing. Every stage execution logs its start,
//! completion with duration, or failure with redacted error text.

use tracing::{Level, error, info, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::redaction::redact_error_message;

/// Initialize tracing subscriber for structured logging.
///
/// `RUST_LOG` takes precedence. Otherwise the filter is
/// `draftloop=debug,info` when `verbose` is set and `draftloop=info,warn`
/// when not. `json` switches the output to one JSON object per event.
///
/// Logs go to stderr so they never interleave with generated content on stdout.
pub fn init_tracing(verbose: bool, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("draftloop=debug,info")
            } else {
                EnvFilter::try_new("draftloop=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()?;
    } else if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Create a span for stage execution with structured fields
pub fn stage_span(topic: &str, stage: &str) -> tracing::Span {
    span!(
        Level::INFO,
        "stage_execution",
        topic = %topic,
        stage = %stage,
    )
}

/// Log stage start with structured fields
pub fn log_stage_start(topic: &str, stage: &str) {
    info!(topic = %topic, stage = %stage, "Starting stage execution");
}

/// Log stage completion with duration
pub fn log_stage_complete(topic: &str, stage: &str, duration_ms: u128) {
    info!(
        topic = %topic,
        stage = %stage,
        duration_ms = %duration_ms,
        "Stage execution completed"
    );
}

/// Log stage error with context.
///
/// Error messages are redacted to prevent secrets from appearing in logs.
pub fn log_stage_error(topic: &str, stage: &str, error: &str, duration_ms: u128) {
    let sanitized_error = redact_error_message(error);

    error!(
        topic = %topic,
        stage = %stage,
        duration_ms = %duration_ms,
        error = %sanitized_error,
        "Stage execution failed"
    );
}
