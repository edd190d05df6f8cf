//! Foundation utilities shared by every draftloop crate.
//!
//! - [`error`]: error taxonomy and user-facing reporting
//! - [`exit_codes`]: CLI exit code table
//! - [`logging`]: tracing setup and structured stage logging
//! - [`pool`]: bounded worker pool with structured shutdown
//! - [`redaction`]: secret scrubbing for error text
//! - [`types`]: shared identifiers

pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod pool;
pub mod redaction;
pub mod types;

pub use error::{DraftloopError, ErrorCategory, UserFriendlyError};
pub use exit_codes::ExitCode;
pub use pool::WorkerPool;
pub use types::StageId;
