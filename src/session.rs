//! Line-oriented driver for one content session.
//!
//! Reads replies from any [`BufRead`] and writes prompts and results to any
//! [`Write`], so the same loop serves the terminal and tests.

use std::io::{BufRead, Write};

use anyhow::{Context, Result, bail};
use draftloop_judge::EvaluationReport;
use draftloop_orchestrator::{OutlineResponse, WorkflowHandle};
use tracing::debug;

use crate::report::{SessionView, render_content, render_outline, render_report};

/// Options for `draftloop run`.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Topic to use instead of prompting for one.
    pub topic: Option<String>,
    /// Approve the first outline without prompting.
    pub auto_approve: bool,
    /// Feedback to use instead of prompting for it.
    pub feedback: Option<String>,
    /// Print one JSON document at the end instead of conversational text.
    pub json: bool,
}

/// Drive `handle` from topic to evaluation.
///
/// Returns `None` only when the content could not be scored.
///
/// # Errors
///
/// Fails when input ends before the outline is approved, or on an I/O or
/// workflow error. Stage failures are printed and do not end the session.
pub async fn run_session<R: BufRead, W: Write>(
    handle: &mut WorkflowHandle,
    options: &SessionOptions,
    input: &mut R,
    output: &mut W,
) -> Result<Option<EvaluationReport>> {
    let chatter = !options.json;

    let topic = match options.topic.as_deref() {
        Some(topic) => topic.to_string(),
        None => {
            prompt(output, chatter, "Enter a topic: ")?;
            match read_reply(input)? {
                Some(topic) => topic,
                None => bail!("No topic provided"),
            }
        }
    };

    let drafted = handle.submit_topic(&topic).await?;
    if chatter {
        if drafted.research.is_degraded() {
            writeln!(output, "{}\n", drafted.research.output)?;
        }
        writeln!(output, "{}", render_outline(&topic, &drafted.outline.output))?;
    }

    loop {
        let reply = if options.auto_approve {
            "yes".to_string()
        } else {
            prompt(output, chatter, "> ")?;
            match read_reply(input)? {
                Some(reply) => reply,
                None => bail!("Input ended before the outline was approved"),
            }
        };

        match handle.respond_to_outline(&reply).await? {
            OutlineResponse::Approved { content } => {
                if chatter {
                    writeln!(output, "{}", render_content(&content.output))?;
                }
                break;
            }
            OutlineResponse::Revised { outline } => {
                if chatter {
                    writeln!(output, "{}", render_outline(&topic, &outline.output))?;
                }
            }
            OutlineResponse::RevisionLimitReached { limit } => {
                prompt(
                    output,
                    chatter,
                    &format!(
                        "Revision limit of {limit} reached. Type 'yes' to approve the current outline.\n"
                    ),
                )?;
            }
        }
    }

    let feedback = match options.feedback.clone() {
        Some(feedback) => Some(feedback),
        None if options.auto_approve => None,
        None => {
            prompt(output, chatter, "Please provide your feedback (press Enter to skip): ")?;
            read_optional(input)?
        }
    };

    let report = handle.submit_feedback(feedback.as_deref()).await?;
    let scored = handle.state().score().is_some();
    debug!(scored, "Session finished");

    if options.json {
        let view = SessionView::new(handle.state(), scored.then_some(&report));
        writeln!(output, "{}", serde_json::to_string_pretty(&view)?)?;
    } else {
        writeln!(output, "{}", render_report(&report))?;
    }

    Ok(scored.then_some(report))
}

fn prompt<W: Write>(output: &mut W, chatter: bool, text: &str) -> Result<()> {
    if chatter {
        write!(output, "{text}")?;
        output.flush()?;
    }
    Ok(())
}

/// Next non-blank line, trimmed. `None` at end of input.
fn read_reply<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    loop {
        line.clear();
        let read = input
            .read_line(&mut line)
            .context("Failed to read from input")?;
        if read == 0 {
            return Ok(None);
        }
        let reply = line.trim();
        if !reply.is_empty() {
            return Ok(Some(reply.to_string()));
        }
    }
}

/// One line, trimmed. Blank lines and end of input are `None`.
fn read_optional<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read from input")?;
    let reply = line.trim();
    Ok((!reply.is_empty()).then(|| reply.to_string()))
}
