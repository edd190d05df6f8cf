//! Stage trait system for the draftloop pipeline
//!
//! This crate is the shared contract between the orchestrator and the stage
//! implementations. A stage never sees the mutable workflow record: it reads
//! an immutable [`StageContext`] snapshot and hands back a [`StageUpdate`]
//! delta, and the orchestrator owns the single merge point.
//!
//! A stage only builds its prompt and shapes the generated text. The
//! orchestrator performs the text generation call in between, so timeouts
//! and the worker pool live in one place.

use async_trait::async_trait;

pub use draftloop_utils::error::StageError;
pub use draftloop_utils::types::StageId;
use draftloop_utils::redaction::redact_error_message;

/// Named fields of the workflow record that a stage may depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextField {
    Topic,
    Research,
    Outline,
    ApprovedOutline,
    Content,
    Feedback,
}

impl ContextField {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Topic => "topic",
            Self::Research => "research",
            Self::Outline => "outline",
            Self::ApprovedOutline => "approved_outline",
            Self::Content => "content",
            Self::Feedback => "feedback",
        }
    }
}

/// Read-only view of the workflow record handed to a stage.
///
/// Every optional field is explicit; absence is `None`, never an empty
/// string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageContext {
    pub topic: String,
    pub research: Option<String>,
    pub outline: Option<String>,
    /// Pending revision instruction for the next outline run.
    pub change_request: Option<String>,
    pub approved_outline: Option<String>,
    pub content: Option<String>,
    pub feedback: Option<String>,
}

impl StageContext {
    #[must_use]
    pub fn for_topic(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }

    /// Value of a field, treating blank text as absent.
    #[must_use]
    pub fn field(&self, field: ContextField) -> Option<&str> {
        let value = match field {
            ContextField::Topic => Some(self.topic.as_str()),
            ContextField::Research => self.research.as_deref(),
            ContextField::Outline => self.outline.as_deref(),
            ContextField::ApprovedOutline => self.approved_outline.as_deref(),
            ContextField::Content => self.content.as_deref(),
            ContextField::Feedback => self.feedback.as_deref(),
        };
        value.filter(|v| !v.trim().is_empty())
    }

    /// Check that every field `stage` requires is present.
    ///
    /// # Errors
    ///
    /// Returns `StageError::NotReady` naming the first missing field.
    pub fn ensure_ready(&self, stage: StageId, requires: &[ContextField]) -> Result<(), StageError> {
        match requires.iter().find(|f| self.field(**f).is_none()) {
            Some(missing) => Err(StageError::NotReady {
                stage: stage.to_string(),
                missing: missing.as_str().to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// Tag telling the orchestrator how a stage run ended.
#[derive(Debug, Clone)]
pub enum StageOutcome {
    Completed,
    /// The stage failed; `output` carries a human-readable error notice.
    Degraded { error: StageError },
}

/// Delta produced by one stage run.
///
/// `output` is the new value of the stage's own field. A degraded update
/// still carries output (`"<Stage> Error: <message>"`) so a caller that only
/// renders text shows the failure, while the `outcome` tag lets code branch
/// without inspecting the text.
#[derive(Debug, Clone)]
pub struct StageUpdate {
    pub stage: StageId,
    pub output: String,
    pub outcome: StageOutcome,
}

impl StageUpdate {
    #[must_use]
    pub fn completed(stage: StageId, output: impl Into<String>) -> Self {
        Self {
            stage,
            output: output.into(),
            outcome: StageOutcome::Completed,
        }
    }

    /// Build the degraded update for `error`. The message is redacted.
    #[must_use]
    pub fn degraded(stage: StageId, error: StageError) -> Self {
        let output = format!(
            "{}: {}",
            stage.error_label(),
            redact_error_message(&error.to_string())
        );
        Self {
            stage,
            output,
            outcome: StageOutcome::Degraded { error },
        }
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        matches!(self.outcome, StageOutcome::Degraded { .. })
    }

    #[must_use]
    pub fn error(&self) -> Option<&StageError> {
        match &self.outcome {
            StageOutcome::Completed => None,
            StageOutcome::Degraded { error } => Some(error),
        }
    }
}

/// Core trait implemented by the research, outline and content stages.
#[async_trait]
pub trait Stage: Send + Sync {
    fn id(&self) -> StageId;

    /// Fields that must be present in the snapshot before this stage runs.
    fn requires(&self) -> &'static [ContextField];

    /// Build the text generation prompt from the snapshot.
    ///
    /// May call other collaborators (research runs a web search here).
    async fn prompt(&self, ctx: &StageContext) -> Result<String, StageError>;

    /// Turn the generated text into this stage's update.
    fn postprocess(&self, raw: String, _ctx: &StageContext) -> StageUpdate {
        StageUpdate::completed(self.id(), raw)
    }
}
