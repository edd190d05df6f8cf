//! Text and JSON rendering of session output.

use std::collections::BTreeMap;

use draftloop_judge::{Criterion, EvaluationReport};
use draftloop_orchestrator::WorkflowState;
use serde::Serialize;

/// Outline block shown while awaiting approval.
#[must_use]
pub fn render_outline(topic: &str, outline: &str) -> String {
    format!(
        "Proposed Outline for '{topic}':\n\n{outline}\n\n\
         Type 'yes' or 'continue' to generate content based on this outline, \
         or describe the changes you want."
    )
}

#[must_use]
pub fn render_content(content: &str) -> String {
    format!("Generated Content:\n\n{content}\n")
}

/// Human-readable evaluation summary.
///
/// ```text
/// Content Score: 78.0%
///
/// Detailed Scores:
/// - research: 8.0/10 (B)
/// - outline: 6.0/10 (D)
/// - content: 9.0/10 (A)
///
/// Suggestions for Improvement:
/// • Improve outline structure and organization
/// ```
#[must_use]
pub fn render_report(report: &EvaluationReport) -> String {
    let detailed = report
        .detailed_scores()
        .iter()
        .map(|(criterion, score)| format!("- {criterion}: {score}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Content Score: {:.1}%\n\nDetailed Scores:\n{detailed}\n\nSuggestions for Improvement:\n{}\n",
        report.composite_percent(),
        report.suggestions_text()
    )
}

/// JSON shape of an evaluation: the report plus its presentation fields.
#[derive(Debug, Serialize)]
pub struct ReportView<'a> {
    #[serde(flatten)]
    pub report: &'a EvaluationReport,
    pub score_percent: f64,
    pub detailed_scores: BTreeMap<Criterion, String>,
    pub improvement_suggestions: String,
}

impl<'a> ReportView<'a> {
    #[must_use]
    pub fn new(report: &'a EvaluationReport) -> Self {
        Self {
            report,
            score_percent: report.composite_percent(),
            detailed_scores: report.detailed_scores(),
            improvement_suggestions: report.suggestions_text(),
        }
    }
}

/// JSON shape of a finished `draftloop run`.
#[derive(Debug, Serialize)]
pub struct SessionView<'a> {
    pub session: &'a WorkflowState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<ReportView<'a>>,
}

impl<'a> SessionView<'a> {
    #[must_use]
    pub fn new(session: &'a WorkflowState, report: Option<&'a EvaluationReport>) -> Self {
        Self {
            session,
            evaluation: report.map(ReportView::new),
        }
    }
}
