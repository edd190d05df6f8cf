//! Workflow orchestration for draftloop
//!
//! - [`state`]: the workflow record, its transitions and the delta merge
//! - [`gate`]: outline approval and the revision loop
//! - [`orchestrator`]: stage execution on the long-lived worker pool
//! - [`handle`]: the session façade used by the CLI

pub mod gate;
pub mod handle;
pub mod orchestrator;
pub mod state;

pub use gate::{AFFIRMATIVE_WORDS, ApprovalGate, GateDecision, GateState, is_affirmative};
pub use handle::{DraftedOutline, OutlineResponse, WorkflowHandle};
pub use orchestrator::{Orchestrator, STAGE_POOL_CAPACITY};
pub use state::{StageDelta, WorkflowStage, WorkflowState};
