//! Session façade for external consumers.
//!
//! The CLI drives a session through [`WorkflowHandle`] only. It owns the
//! [`Orchestrator`] and its pool, the [`ApprovalGate`] and the
//! [`WorkflowState`], and is the single writer of that state.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use draftloop_config::Config;
//! use draftloop_orchestrator::{OutlineResponse, WorkflowHandle};
//!
//! # async fn demo(config: Config) -> Result<(), Box<dyn std::error::Error>> {
//! let (mut handle, _fallback) = WorkflowHandle::from_config(&config)?;
//! let drafted = handle.submit_topic("Quantum Computing").await?;
//! println!("{}", drafted.outline.output);
//!
//! if let OutlineResponse::Approved { content } = handle.respond_to_outline("continue").await? {
//!     println!("{}", content.output);
//! }
//! let report = handle.submit_feedback(Some("Clear and engaging")).await?;
//! println!("{:.0}%", report.composite_percent());
//! handle.shutdown().await;
//! # Ok(())
//! # }
//! ```

use draftloop_config::Config;
use draftloop_judge::EvaluationReport;
use draftloop_llm::LlmFallbackInfo;
use draftloop_stage_api::StageUpdate;
use draftloop_utils::error::{DraftloopError, WorkflowError};
use tracing::info;

use crate::gate::{ApprovalGate, GateDecision, GateState};
use crate::orchestrator::Orchestrator;
use crate::state::{StageDelta, WorkflowStage, WorkflowState};

/// Research and first outline for a new topic.
#[derive(Debug, Clone)]
pub struct DraftedOutline {
    pub research: StageUpdate,
    pub outline: StageUpdate,
}

/// Result of replying to a drafted outline.
#[derive(Debug, Clone)]
pub enum OutlineResponse {
    /// The outline was approved and content generated from it.
    Approved { content: StageUpdate },
    /// A new outline was drafted from the change request.
    Revised { outline: StageUpdate },
    /// No more change requests are accepted; approve to continue.
    RevisionLimitReached { limit: u32 },
}

/// One content session.
///
/// Methods that advance the session take `&mut self`, so calls are
/// sequential by construction. A call made out of order fails with
/// [`WorkflowError::InvalidTransition`] and leaves the session unchanged.
pub struct WorkflowHandle {
    orchestrator: Orchestrator,
    gate: ApprovalGate,
    state: WorkflowState,
}

impl WorkflowHandle {
    #[must_use]
    pub fn new(orchestrator: Orchestrator) -> Self {
        let gate = ApprovalGate::new(orchestrator.config().max_revisions());
        Self {
            orchestrator,
            gate,
            state: WorkflowState::new(),
        }
    }

    /// Build the handle and its collaborators from configuration.
    ///
    /// # Errors
    ///
    /// See [`Orchestrator::from_config`].
    pub fn from_config(config: &Config) -> Result<(Self, Option<LlmFallbackInfo>), DraftloopError> {
        let (orchestrator, fallback) = Orchestrator::from_config(config)?;
        Ok((Self::new(orchestrator), fallback))
    }

    #[must_use]
    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    #[must_use]
    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }

    #[must_use]
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Record the topic, then run research and the first outline.
    ///
    /// Stage failures do not fail the call; they come back as degraded
    /// updates and the session still moves to outline approval.
    ///
    /// # Errors
    ///
    /// `DraftloopError::Workflow` for a blank topic or a second topic.
    pub async fn submit_topic(&mut self, topic: &str) -> Result<DraftedOutline, DraftloopError> {
        let state = self.state.clone().with_topic(topic)?;

        let research = self.orchestrator.research(&state).await;
        let state = state.apply(&StageDelta::Text(research.clone()));

        let outline = self.orchestrator.outline(&state).await;
        let state = state
            .apply(&StageDelta::Text(outline.clone()))
            .outline_drafted()?;

        info!(topic = %state.input(), "Outline drafted, awaiting approval");
        self.state = state;
        self.gate = ApprovalGate::new(self.orchestrator.config().max_revisions());
        Ok(DraftedOutline { research, outline })
    }

    /// Pass the user's reply through the approval gate.
    ///
    /// An affirmative reply approves the outline and generates content. Any
    /// other reply regenerates the outline with that reply as the change
    /// request; the gate returns to drafted even if regeneration fails.
    ///
    /// # Errors
    ///
    /// `DraftloopError::Workflow` for a blank reply or when no outline is
    /// awaiting approval.
    pub async fn respond_to_outline(&mut self, reply: &str) -> Result<OutlineResponse, DraftloopError> {
        if self.state.stage() != WorkflowStage::AwaitingApproval {
            return Err(WorkflowError::InvalidTransition {
                stage: self.state.stage().as_str().to_string(),
                action: "respond to the outline".to_string(),
            }
            .into());
        }

        match self.gate.decide(reply)? {
            GateDecision::Approved => {
                let state = self.state.clone().approve()?;
                let content = self.orchestrator.content(&state).await;
                self.state = state.apply(&StageDelta::Text(content.clone()));
                Ok(OutlineResponse::Approved { content })
            }
            GateDecision::RevisionRequested { change_request } => {
                let state = self.state.clone().with_change_request(&change_request)?;
                let outline = self.orchestrator.outline(&state).await;
                self.state = state.apply(&StageDelta::Text(outline.clone()));
                self.gate.revision_complete();
                Ok(OutlineResponse::Revised { outline })
            }
            GateDecision::RevisionLimitReached { limit } => {
                Ok(OutlineResponse::RevisionLimitReached { limit })
            }
        }
    }

    /// Record feedback and score the content.
    ///
    /// # Errors
    ///
    /// `DraftloopError::Workflow` unless content is awaiting feedback.
    pub async fn submit_feedback(
        &mut self,
        feedback: Option<&str>,
    ) -> Result<EvaluationReport, DraftloopError> {
        let state = self.state.clone().with_feedback(feedback)?;
        let report = self.orchestrator.evaluate(&state).await;
        self.state = state.apply(&StageDelta::Evaluation(report.clone()));
        Ok(report)
    }

    /// Wait for in-flight work and release the stage pool.
    pub async fn shutdown(&self) {
        self.orchestrator.shutdown().await;
    }
}
