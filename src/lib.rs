//! draftloop - research, outline, approve, write and score
//!
//! A content workflow driven by a text generation provider:
//!
//! ```text
//! Research → Outline → (approve / revise) → Content → Judge
//! ```
//!
//! Research runs a web search and summarizes it, the outline loops on change
//! requests until approved, content is generated from the approved outline
//! only, and the judge scores research, outline and content concurrently.
//!
//! draftloop can be used in two ways:
//! - **CLI**: `draftloop run`, `draftloop judge`, `draftloop config`
//! - **Library**: drive a session with [`WorkflowHandle`]
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use draftloop::{Config, OutlineResponse, WorkflowHandle};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::builder().build()?;
//! let (mut handle, _fallback) = WorkflowHandle::from_config(&config)?;
//!
//! handle.submit_topic("Quantum Computing").await?;
//! if let OutlineResponse::Revised { outline } = handle.respond_to_outline("make it shorter").await? {
//!     println!("{}", outline.output);
//! }
//! handle.respond_to_outline("continue").await?;
//! let report = handle.submit_feedback(None).await?;
//! println!("{:.1}%", report.composite_percent());
//!
//! handle.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Public API
//!
//! - [`WorkflowHandle`] - session façade over the orchestrator and approval gate
//! - [`Orchestrator`] - stage execution on the shared worker pool
//! - [`ConcurrentJudge`] and [`EvaluationReport`] - multi-criteria evaluation
//! - [`Config`] and [`ConfigBuilder`] - configuration management
//! - [`DraftloopError`] - library error type
//! - [`ExitCode`] - CLI exit codes

pub mod cli;
pub mod report;
pub mod session;

pub use draftloop_config::{CliArgs, Config, ConfigBuilder};
pub use draftloop_judge::{ConcurrentJudge, Criterion, EvaluationReport, Grade, JudgeInput};
pub use draftloop_llm::{LlmBackend, LlmError, LlmInvocation, LlmResult};
pub use draftloop_orchestrator::{
    ApprovalGate, DraftedOutline, GateDecision, GateState, Orchestrator, OutlineResponse,
    StageDelta, WorkflowHandle, WorkflowStage, WorkflowState,
};
pub use draftloop_utils::{DraftloopError, ExitCode, StageId};
