use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::redaction::redact_error_message;

/// Library-level error type with rich context and user-friendly reporting.
///
/// `DraftloopError` is the umbrella error returned by the CLI-facing layers of
/// draftloop. Stage and judge internals never let these escape past their own
/// boundary; they degrade instead. What remains here are the failures that
/// genuinely stop a session: bad configuration, an unusable provider setup,
/// I/O on the terminal, or a worker pool that was already shut down.
///
/// # Exit Code Mapping
///
/// Use [`to_exit_code()`](Self::to_exit_code) to map errors to CLI exit codes:
///
/// | Exit Code | Error Type |
/// |-----------|------------|
/// | 2 | Configuration/CLI argument errors |
/// | 10 | Stage timeout |
/// | 70 | Text generation provider failure |
/// | 1 | Other errors |
///
/// # Example
///
/// ```rust
/// use draftloop_utils::error::{ConfigError, DraftloopError};
/// use draftloop_utils::exit_codes::ExitCode;
///
/// let err = DraftloopError::Config(ConfigError::InvalidFile("bad".to_string()));
/// assert_eq!(err.to_exit_code(), ExitCode::CLI_ARGS);
/// assert!(err.display_for_user().contains("Suggestions:"));
/// ```
#[derive(Error, Debug)]
pub enum DraftloopError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Stage execution error: {0}")]
    Stage(#[from] StageError),

    #[error("LLM backend error: {0}")]
    Llm(#[from] LlmError),

    #[error("Search provider error: {0}")]
    Search(#[from] SearchError),

    #[error("Worker pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    StageExecution,
    ProviderIntegration,
    FileSystem,
    ResourceLimits,
    Concurrency,
    Validation,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::StageExecution => write!(f, "Stage Execution"),
            Self::ProviderIntegration => write!(f, "Provider Integration"),
            Self::FileSystem => write!(f, "File System"),
            Self::ResourceLimits => write!(f, "Resource Limits"),
            Self::Concurrency => write!(f, "Concurrency"),
            Self::Validation => write!(f, "Validation"),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },

    #[error("Configuration validation failed: {error_count} errors")]
    ValidationFailed {
        errors: Vec<String>,
        error_count: usize,
    },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(msg) => format!("The configuration file is invalid: {msg}"),
            Self::InvalidValue { key, value } => {
                format!("Configuration key '{key}' has an invalid value: {value}")
            }
            Self::NotFound { path } => format!("Configuration file not found: {path}"),
            Self::ValidationFailed { errors, .. } => {
                format!("Configuration validation failed:\n  {}", errors.join("\n  "))
            }
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile(_) => {
                Some("Configuration files use TOML with [defaults], [llm], [search] and [stages] sections.".to_string())
            }
            Self::NotFound { .. } => Some(
                "draftloop looks for .draftloop/config.toml in the current directory and its parents."
                    .to_string(),
            ),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax of .draftloop/config.toml".to_string(),
                "Run 'draftloop config' to see the effective configuration".to_string(),
            ],
            Self::InvalidValue { .. } => vec![
                "Review the value in .draftloop/config.toml or the matching CLI flag".to_string(),
            ],
            Self::NotFound { .. } => vec![
                "Pass an existing file with --config".to_string(),
                "Omit --config to use discovered configuration and defaults".to_string(),
            ],
            Self::ValidationFailed { .. } => vec![
                "Fix the listed values and re-run".to_string(),
                "Run 'draftloop config' to see where each value comes from".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::ValidationFailed { .. } => ErrorCategory::Validation,
            _ => ErrorCategory::Configuration,
        }
    }
}

/// Errors that can occur during LLM backend operations.
///
/// This is the text generation collaborator's failure channel. Stage functions
/// convert it into degraded output; it only reaches the user directly when a
/// backend cannot be constructed at all.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    /// Transport-level failure (HTTP connectivity)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider authentication failure (401, 403, missing API key)
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Provider quota/rate limit exceeded (429)
    #[error("Provider quota exceeded: {0}")]
    ProviderQuota(String),

    /// Provider service outage (5xx errors)
    #[error("Provider outage: {0}")]
    ProviderOutage(String),

    /// Invocation timed out
    #[error("Timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// Budget limit exceeded
    #[error("Budget exceeded: attempted {attempted} calls, limit is {limit}")]
    BudgetExceeded { limit: u32, attempted: u32 },

    /// Configuration error
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),

    /// Unsupported feature or provider
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl UserFriendlyError for LlmError {
    fn user_message(&self) -> String {
        match self {
            Self::Transport(msg) => format!("LLM transport error: {msg}"),
            Self::ProviderAuth(msg) => format!("LLM provider authentication failed: {msg}"),
            Self::ProviderQuota(msg) => format!("LLM provider quota exceeded: {msg}"),
            Self::ProviderOutage(msg) => format!("LLM provider service outage: {msg}"),
            Self::Timeout { duration } => {
                format!("LLM invocation timed out after {duration:?}")
            }
            Self::BudgetExceeded { limit, attempted } => {
                format!("LLM budget exceeded: attempted {attempted} calls, limit is {limit}")
            }
            Self::Misconfiguration(msg) => format!("LLM configuration error: {msg}"),
            Self::Unsupported(msg) => format!("LLM feature not supported: {msg}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Transport(_) => Some(
                "Transport errors occur when the LLM provider cannot be reached.".to_string(),
            ),
            Self::ProviderAuth(_) => Some(
                "Authentication errors indicate missing or invalid API keys.".to_string(),
            ),
            Self::ProviderQuota(_) => Some(
                "Quota errors occur when rate limits or usage limits are exceeded.".to_string(),
            ),
            Self::ProviderOutage(_) => {
                Some("Provider outages are temporary service disruptions.".to_string())
            }
            Self::Timeout { .. } => Some(
                "Timeouts occur when an invocation takes longer than the configured stage timeout."
                    .to_string(),
            ),
            Self::BudgetExceeded { .. } => {
                Some("Budget limits prevent excessive LLM API calls and costs.".to_string())
            }
            Self::Misconfiguration(_) => Some(
                "Configuration errors indicate missing or invalid LLM provider settings."
                    .to_string(),
            ),
            Self::Unsupported(_) => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Transport(_) => vec![
                "Verify network connectivity".to_string(),
                "Try running with --verbose to see detailed error information".to_string(),
            ],
            Self::ProviderAuth(_) => vec![
                "Check that the required API key environment variable is set (e.g., GEMINI_API_KEY)".to_string(),
                "A .env file in the working directory is loaded at start-up".to_string(),
            ],
            Self::ProviderQuota(_) | Self::ProviderOutage(_) => vec![
                "Wait a few minutes and try again".to_string(),
                "Consider configuring llm.fallback_provider".to_string(),
            ],
            Self::Timeout { .. } => vec![
                "Increase stage_timeout in configuration or via --stage-timeout".to_string(),
            ],
            Self::BudgetExceeded { .. } => vec![
                "Increase the budget via DRAFTLOOP_OPENROUTER_BUDGET".to_string(),
            ],
            Self::Misconfiguration(_) | Self::Unsupported(_) => vec![
                "Check the [llm] section in .draftloop/config.toml".to_string(),
                "Supported providers: gemini, openrouter, anthropic".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) | Self::ProviderOutage(_) => ErrorCategory::ProviderIntegration,
            Self::ProviderAuth(_) | Self::Misconfiguration(_) | Self::Unsupported(_) => {
                ErrorCategory::Configuration
            }
            Self::ProviderQuota(_) | Self::BudgetExceeded { .. } => ErrorCategory::ResourceLimits,
            Self::Timeout { .. } => ErrorCategory::StageExecution,
        }
    }
}

/// Errors from the web search collaborator.
///
/// The research stage treats every variant the same way: it logs and carries
/// on with an empty result set.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SearchError {
    #[error("Search transport error: {0}")]
    Transport(String),

    #[error("Search provider authentication error: {0}")]
    ProviderAuth(String),

    #[error("Search provider quota exceeded: {0}")]
    ProviderQuota(String),

    #[error("Search provider outage: {0}")]
    ProviderOutage(String),

    #[error("Search timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("Search misconfiguration: {0}")]
    Misconfiguration(String),

    #[error("Malformed search response: {0}")]
    MalformedResponse(String),
}

impl UserFriendlyError for SearchError {
    fn user_message(&self) -> String {
        self.to_string()
    }

    fn context(&self) -> Option<String> {
        Some("Research continues without web results when search fails.".to_string())
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::ProviderAuth(_) | Self::Misconfiguration(_) => vec![
                "Check that SERPER_API_KEY is set".to_string(),
                "Set search.enabled = false to skip web search".to_string(),
            ],
            _ => vec!["Try again later".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::ProviderAuth(_) | Self::Misconfiguration(_) => ErrorCategory::Configuration,
            Self::ProviderQuota(_) => ErrorCategory::ResourceLimits,
            Self::MalformedResponse(_) => ErrorCategory::Validation,
            _ => ErrorCategory::ProviderIntegration,
        }
    }
}

/// Why a judge response could not be used as a criterion score.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoreError {
    /// Response was not a floating-point literal
    #[error("could not parse score from response {raw:?}")]
    Parse { raw: String },

    /// Parsed value fell outside the 0-10 scale
    #[error("score {value} is outside the 0-10 range")]
    OutOfRange { value: f64 },
}

/// Errors from the bounded worker pool.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PoolError {
    /// The pool was shut down before the task could acquire a slot
    #[error("worker pool '{pool}' is shut down")]
    Closed { pool: String },

    /// The task panicked or was aborted
    #[error("task on worker pool '{pool}' failed: {reason}")]
    TaskFailed { pool: String, reason: String },
}

impl UserFriendlyError for PoolError {
    fn user_message(&self) -> String {
        self.to_string()
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Closed { .. } => {
                Some("Work was submitted after the session released its workers.".to_string())
            }
            Self::TaskFailed { .. } => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        vec!["Re-run with --verbose and report the log if this persists".to_string()]
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Concurrency
    }
}

/// Stage execution failures.
///
/// A stage returns this from its `execute` call; the orchestrator turns it into
/// degraded output rather than propagating it.
#[derive(Error, Debug, Clone)]
pub enum StageError {
    #[error("{0}")]
    Generation(#[from] LlmError),

    #[error("stage '{stage}' timed out after {timeout_seconds}s")]
    Timeout { stage: String, timeout_seconds: u64 },

    #[error("{0}")]
    Pool(#[from] PoolError),

    #[error("stage '{stage}' is missing required input: {missing}")]
    NotReady { stage: String, missing: String },
}

impl UserFriendlyError for StageError {
    fn user_message(&self) -> String {
        match self {
            Self::Generation(err) => err.user_message(),
            Self::Pool(err) => err.user_message(),
            Self::Timeout { .. } | Self::NotReady { .. } => self.to_string(),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Generation(err) => err.context(),
            Self::Pool(err) => err.context(),
            Self::Timeout { .. } => {
                Some("Each stage is bounded by the configured stage timeout.".to_string())
            }
            Self::NotReady { .. } => {
                Some("Stages run in order: research, outline, content, judge.".to_string())
            }
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Generation(err) => err.suggestions(),
            Self::Pool(err) => err.suggestions(),
            Self::Timeout { .. } => vec![
                "Increase stage_timeout in configuration or via --stage-timeout".to_string(),
            ],
            Self::NotReady { .. } => vec!["Complete the earlier stages first".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Generation(err) => err.category(),
            Self::Pool(err) => err.category(),
            Self::Timeout { .. } | Self::NotReady { .. } => ErrorCategory::StageExecution,
        }
    }
}

/// Session calls made out of order or with unusable input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("cannot {action} while the session is {stage}")]
    InvalidTransition { stage: String, action: String },

    #[error("{field} must not be empty")]
    EmptyInput { field: String },
}

impl UserFriendlyError for DraftloopError {
    fn user_message(&self) -> String {
        match self {
            Self::Config(err) => err.user_message(),
            Self::Stage(err) => err.user_message(),
            Self::Llm(err) => err.user_message(),
            Self::Search(err) => err.user_message(),
            Self::Pool(err) => err.user_message(),
            Self::Workflow(err) => err.to_string(),
            Self::Io(err) => format!("I/O error: {err}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Config(err) => err.context(),
            Self::Stage(err) => err.context(),
            Self::Llm(err) => err.context(),
            Self::Search(err) => err.context(),
            Self::Pool(err) => err.context(),
            Self::Workflow(_) => Some(
                "A session moves topic -> outline approval -> feedback -> complete.".to_string(),
            ),
            Self::Io(_) => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(err) => err.suggestions(),
            Self::Stage(err) => err.suggestions(),
            Self::Llm(err) => err.suggestions(),
            Self::Search(err) => err.suggestions(),
            Self::Pool(err) => err.suggestions(),
            Self::Workflow(_) => vec!["Start a new session with 'draftloop run'".to_string()],
            Self::Io(_) => vec!["Check file paths and permissions".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(err) => err.category(),
            Self::Stage(err) => err.category(),
            Self::Llm(err) => err.category(),
            Self::Search(err) => err.category(),
            Self::Pool(err) => err.category(),
            Self::Workflow(_) => ErrorCategory::Validation,
            Self::Io(_) => ErrorCategory::FileSystem,
        }
    }
}

impl DraftloopError {
    /// Get a user-friendly error message with context and actionable suggestions.
    ///
    /// ```text
    /// Error: <user message>
    ///
    /// Context: <context if available>
    ///
    /// Suggestions:
    ///   • <suggestion 1>
    /// ```
    ///
    /// The result is passed through [`redact_error_message`] before returning.
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error: {}\n", self.user_message()));

        if let Some(ctx) = self.context() {
            output.push_str(&format!("\nContext: {ctx}\n"));
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in suggestions {
                output.push_str(&format!("  • {suggestion}\n"));
            }
        }

        redact_error_message(&output)
    }

    /// Map this error to the appropriate CLI exit code.
    #[must_use]
    pub fn to_exit_code(&self) -> crate::exit_codes::ExitCode {
        use crate::exit_codes::ExitCode;

        match self {
            DraftloopError::Config(_) => ExitCode::CLI_ARGS,
            DraftloopError::Stage(StageError::Timeout { .. }) => ExitCode::STAGE_TIMEOUT,
            DraftloopError::Stage(StageError::Generation(llm_err)) | DraftloopError::Llm(llm_err) => {
                match llm_err {
                    LlmError::Timeout { .. } => ExitCode::STAGE_TIMEOUT,
                    LlmError::Misconfiguration(_) | LlmError::Unsupported(_) => ExitCode::CLI_ARGS,
                    _ => ExitCode::PROVIDER_FAILURE,
                }
            }
            _ => ExitCode::INTERNAL,
        }
    }
}
