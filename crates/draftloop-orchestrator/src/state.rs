//! The workflow record and its merge rules.

use draftloop_judge::{EvaluationReport, JudgeInput};
use draftloop_stage_api::{StageContext, StageId, StageUpdate};
use draftloop_utils::error::WorkflowError;
use serde::Serialize;
use tracing::warn;

/// Position of a session in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStage {
    #[default]
    AwaitingTopic,
    AwaitingApproval,
    AwaitingFeedback,
    Complete,
}

impl WorkflowStage {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingTopic => "awaiting topic",
            Self::AwaitingApproval => "awaiting outline approval",
            Self::AwaitingFeedback => "awaiting feedback",
            Self::Complete => "complete",
        }
    }
}

/// Output of one orchestrator step, merged into [`WorkflowState`].
#[derive(Debug, Clone)]
pub enum StageDelta {
    Text(StageUpdate),
    Evaluation(EvaluationReport),
}

/// The single record threaded through a session.
///
/// Stages never mutate it. They read a [`StageContext`] snapshot and the
/// orchestrator merges their [`StageDelta`] with [`apply`](Self::apply).
///
/// - `approved_outline` is written once, on explicit approval.
/// - `content` is only merged once an approved outline exists.
/// - `score` is only merged once `content` is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkflowState {
    input: String,
    stage: WorkflowStage,
    research: Option<String>,
    outline: Option<String>,
    change_request: Option<String>,
    approved_outline: Option<String>,
    content: Option<String>,
    feedback: Option<String>,
    score: Option<f64>,
}

impl WorkflowState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    #[must_use]
    pub fn stage(&self) -> WorkflowStage {
        self.stage
    }

    #[must_use]
    pub fn research(&self) -> Option<&str> {
        self.research.as_deref()
    }

    #[must_use]
    pub fn outline(&self) -> Option<&str> {
        self.outline.as_deref()
    }

    #[must_use]
    pub fn change_request(&self) -> Option<&str> {
        self.change_request.as_deref()
    }

    #[must_use]
    pub fn approved_outline(&self) -> Option<&str> {
        self.approved_outline.as_deref()
    }

    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    #[must_use]
    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    /// Composite score on the 0-1 scale.
    #[must_use]
    pub fn score(&self) -> Option<f64> {
        self.score
    }

    #[must_use]
    pub fn snapshot(&self) -> StageContext {
        StageContext {
            topic: self.input.clone(),
            research: self.research.clone(),
            outline: self.outline.clone(),
            change_request: self.change_request.clone(),
            approved_outline: self.approved_outline.clone(),
            content: self.content.clone(),
            feedback: self.feedback.clone(),
        }
    }

    #[must_use]
    pub fn judge_input(&self) -> JudgeInput {
        JudgeInput {
            topic: self.input.clone(),
            research: self.research.clone(),
            outline: self.outline.clone(),
            approved_outline: self.approved_outline.clone(),
            content: self.content.clone().unwrap_or_default(),
            feedback: self.feedback.clone(),
        }
    }

    fn expect_stage(&self, expected: WorkflowStage, action: &str) -> Result<(), WorkflowError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition {
                stage: self.stage.as_str().to_string(),
                action: action.to_string(),
            })
        }
    }

    /// Record the topic. Only valid before the session has started.
    ///
    /// # Errors
    ///
    /// `EmptyInput` for a blank topic, `InvalidTransition` once a topic is set.
    pub fn with_topic(mut self, topic: &str) -> Result<Self, WorkflowError> {
        self.expect_stage(WorkflowStage::AwaitingTopic, "submit a topic")?;
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(WorkflowError::EmptyInput {
                field: "topic".to_string(),
            });
        }
        if !self.input.is_empty() {
            return Err(WorkflowError::InvalidTransition {
                stage: self.stage.as_str().to_string(),
                action: "change the topic".to_string(),
            });
        }
        self.input = topic.to_string();
        Ok(self)
    }

    /// Move to outline approval once the first outline exists.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless awaiting a topic with an outline drafted.
    pub fn outline_drafted(mut self) -> Result<Self, WorkflowError> {
        self.expect_stage(WorkflowStage::AwaitingTopic, "review an outline")?;
        if self.outline.is_none() {
            return Err(WorkflowError::InvalidTransition {
                stage: self.stage.as_str().to_string(),
                action: "review an outline before one is drafted".to_string(),
            });
        }
        self.stage = WorkflowStage::AwaitingApproval;
        Ok(self)
    }

    /// Queue a revision instruction for the next outline run.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` outside outline approval.
    pub fn with_change_request(mut self, change_request: &str) -> Result<Self, WorkflowError> {
        self.expect_stage(WorkflowStage::AwaitingApproval, "request an outline change")?;
        self.change_request = Some(change_request.trim().to_string());
        Ok(self)
    }

    /// Accept the current outline.
    ///
    /// An outline approved earlier in the session is kept as-is.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` outside outline approval or with no outline.
    pub fn approve(mut self) -> Result<Self, WorkflowError> {
        self.expect_stage(WorkflowStage::AwaitingApproval, "approve the outline")?;
        let Some(outline) = self.outline.clone() else {
            return Err(WorkflowError::InvalidTransition {
                stage: self.stage.as_str().to_string(),
                action: "approve a missing outline".to_string(),
            });
        };
        if self.approved_outline.is_none() {
            self.approved_outline = Some(outline);
        }
        self.change_request = None;
        self.stage = WorkflowStage::AwaitingFeedback;
        Ok(self)
    }

    /// Record reader feedback. Blank feedback is stored as absent.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless awaiting feedback.
    pub fn with_feedback(mut self, feedback: Option<&str>) -> Result<Self, WorkflowError> {
        self.expect_stage(WorkflowStage::AwaitingFeedback, "submit feedback")?;
        self.feedback = feedback
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string);
        Ok(self)
    }

    /// Merge a stage delta. This is the only place stage output enters the
    /// record.
    #[must_use]
    pub fn apply(mut self, delta: &StageDelta) -> Self {
        match delta {
            StageDelta::Text(update) => match update.stage {
                StageId::Research => self.research = Some(update.output.clone()),
                StageId::Outline => {
                    self.outline = Some(update.output.clone());
                    self.change_request = None;
                }
                StageId::Content => {
                    if self.approved_outline.is_some() {
                        self.content = Some(update.output.clone());
                    } else {
                        warn!(topic = %self.input, "Ignoring content produced without an approved outline");
                    }
                }
                StageId::Judge => {
                    warn!(topic = %self.input, "Ignoring text update for the judge stage");
                }
            },
            StageDelta::Evaluation(report) => {
                if self.content.as_deref().is_some_and(|c| !c.trim().is_empty()) {
                    self.score = Some(report.composite);
                    self.stage = WorkflowStage::Complete;
                } else {
                    warn!(topic = %self.input, "Ignoring evaluation of empty content");
                }
            }
        }
        self
    }
}
