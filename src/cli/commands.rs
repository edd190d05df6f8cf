//! Command implementations for the draftloop CLI

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use draftloop_config::Config;
use draftloop_judge::{ConcurrentJudge, EvaluationReport, JudgeInput};
use draftloop_llm::LlmFallbackInfo;
use draftloop_orchestrator::WorkflowHandle;
use draftloop_utils::StageId;
use draftloop_utils::error::{DraftloopError, WorkflowError};
use tracing::warn;

use crate::report::{ReportView, render_report};
use crate::session::{SessionOptions, run_session};

/// `draftloop run`
pub async fn execute_run_command(config: &Config, options: &SessionOptions) -> Result<()> {
    let (mut handle, fallback) = WorkflowHandle::from_config(config)?;
    report_fallback(fallback.as_ref());

    let stdin = io::stdin();
    let stdout = io::stdout();
    let result = run_session(&mut handle, options, &mut stdin.lock(), &mut stdout.lock()).await;

    handle.shutdown().await;
    result.map(|_| ())
}

/// Arguments for `draftloop judge`.
#[derive(Debug, Clone)]
pub struct JudgeFiles<'a> {
    pub outline: &'a Path,
    pub content: &'a Path,
    pub research: Option<&'a Path>,
    pub feedback: Option<&'a str>,
    pub topic: Option<&'a str>,
}

/// `draftloop judge`
pub async fn execute_judge_command(config: &Config, files: &JudgeFiles<'_>, json: bool) -> Result<()> {
    let input = load_judge_input(files)?;

    let (backend, fallback) = draftloop_llm::from_config_with_fallback(config)
        .map_err(DraftloopError::from)?;
    report_fallback(fallback.as_ref());

    let judge = ConcurrentJudge::new(
        Arc::from(backend),
        config.model_for_stage(StageId::Judge),
        config.timeout_for_stage(StageId::Judge),
    );
    let report = judge.evaluate(&input).await;
    print_report(&report, json)
}

/// `draftloop config`
pub fn execute_config_command(config: &Config) -> Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "Effective configuration:")?;
    for (key, (value, source)) in config.effective_config() {
        writeln!(stdout, "  {key} = {value}  ({source})")?;
    }
    Ok(())
}

/// Read the judge's text inputs. Content must not be blank.
pub fn load_judge_input(files: &JudgeFiles<'_>) -> Result<JudgeInput> {
    let read = |label: &str, path: &Path| {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {label} file: {}", path.display()))
    };

    let outline = read("outline", files.outline)?;
    let content = read("content", files.content)?;
    let research = files.research.map(|path| read("research", path)).transpose()?;

    if content.trim().is_empty() {
        return Err(DraftloopError::Workflow(WorkflowError::EmptyInput {
            field: "content".to_string(),
        })
        .into());
    }

    Ok(JudgeInput {
        topic: files.topic.unwrap_or_default().to_string(),
        research,
        outline: None,
        approved_outline: Some(outline),
        content,
        feedback: files
            .feedback
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string),
    })
}

fn print_report(report: &EvaluationReport, json: bool) -> Result<()> {
    let mut stdout = io::stdout().lock();
    if json {
        writeln!(stdout, "{}", serde_json::to_string_pretty(&ReportView::new(report))?)?;
    } else {
        writeln!(stdout, "{}", render_report(report))?;
    }
    Ok(())
}

fn report_fallback(fallback: Option<&LlmFallbackInfo>) {
    if let Some(info) = fallback {
        warn!(
            primary = %info.primary_provider,
            fallback = %info.fallback_provider,
            reason = %info.reason,
            "Using fallback text generation provider"
        );
    }
}
