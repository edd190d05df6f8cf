//! Pipeline stages for draftloop
//!
//! Each stage wraps a single text generation call with a task-specific
//! prompt:
//!
//! - [`ResearchStage`]: web search, then a research summary of the topic
//! - [`OutlineStage`]: structured outline, applying any pending change request
//! - [`ContentStage`]: full article generated from the approved outline

mod content;
mod outline;
mod research;

pub use content::ContentStage;
pub use outline::OutlineStage;
pub use research::ResearchStage;

pub use draftloop_stage_api::{ContextField, Stage, StageContext, StageUpdate};
