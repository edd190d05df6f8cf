//! Outline approval and the revision loop.
//!
//! ```text
//! DRAFTED --affirmative--> APPROVED
//! DRAFTED --anything else--> REVISING --outline regenerated--> DRAFTED
//! ```

use draftloop_utils::error::WorkflowError;
use serde::Serialize;
use tracing::{debug, info};

/// Words that approve the outline when they appear anywhere in the reply.
pub const AFFIRMATIVE_WORDS: [&str; 6] = ["yes", "proceed", "ok", "sure", "generate", "continue"];

/// Case-insensitive substring match against [`AFFIRMATIVE_WORDS`].
///
/// Matching is by substring, so `"looks good"` approves (it contains `ok`).
#[must_use]
pub fn is_affirmative(input: &str) -> bool {
    let reply = input.trim().to_lowercase();
    AFFIRMATIVE_WORDS.iter().any(|word| reply.contains(word))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateState {
    #[default]
    Drafted,
    Revising,
    Approved,
}

impl GateState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Drafted => "drafted",
            Self::Revising => "revising",
            Self::Approved => "approved",
        }
    }
}

/// What the caller should do with a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Snapshot the outline and generate content.
    Approved,
    /// Regenerate the outline with this instruction.
    RevisionRequested { change_request: String },
    /// The configured cap on revisions is spent; the gate stays drafted.
    RevisionLimitReached { limit: u32 },
}

/// Decides between approval and revision for the current outline.
#[derive(Debug, Clone, Default)]
pub struct ApprovalGate {
    state: GateState,
    revisions: u32,
    max_revisions: Option<u32>,
}

impl ApprovalGate {
    /// `max_revisions = None` allows unlimited change requests.
    #[must_use]
    pub fn new(max_revisions: Option<u32>) -> Self {
        Self {
            state: GateState::Drafted,
            revisions: 0,
            max_revisions,
        }
    }

    #[must_use]
    pub fn state(&self) -> GateState {
        self.state
    }

    /// Change requests accepted so far.
    #[must_use]
    pub fn revisions(&self) -> u32 {
        self.revisions
    }

    #[must_use]
    pub fn max_revisions(&self) -> Option<u32> {
        self.max_revisions
    }

    /// Classify the user's reply to a drafted outline.
    ///
    /// # Errors
    ///
    /// `EmptyInput` for a blank reply, `InvalidTransition` unless drafted.
    pub fn decide(&mut self, input: &str) -> Result<GateDecision, WorkflowError> {
        if self.state != GateState::Drafted {
            return Err(WorkflowError::InvalidTransition {
                stage: format!("{} outline", self.state.as_str()),
                action: "respond to the outline".to_string(),
            });
        }

        let reply = input.trim();
        if reply.is_empty() {
            return Err(WorkflowError::EmptyInput {
                field: "outline response".to_string(),
            });
        }

        if is_affirmative(reply) {
            self.state = GateState::Approved;
            info!(revisions = self.revisions, "Outline approved");
            return Ok(GateDecision::Approved);
        }

        if let Some(limit) = self.max_revisions
            && self.revisions >= limit
        {
            info!(limit, "Revision limit reached, outline stays drafted");
            return Ok(GateDecision::RevisionLimitReached { limit });
        }

        self.revisions += 1;
        self.state = GateState::Revising;
        debug!(revision = self.revisions, "Outline change requested");
        Ok(GateDecision::RevisionRequested {
            change_request: reply.to_string(),
        })
    }

    /// Return to drafted once the outline stage has run again, whether or
    /// not it succeeded.
    pub fn revision_complete(&mut self) {
        if self.state == GateState::Revising {
            self.state = GateState::Drafted;
        }
    }
}
