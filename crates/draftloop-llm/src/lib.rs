//! Text generation backends for draftloop
//!
//! Every provider implements [`LlmBackend`], so stages and the judge work
//! with any of them through a trait object. [`from_config_with_fallback`]
//! picks the backend named by `[llm] provider` and falls back to
//! `[llm] fallback_provider` when the primary cannot be constructed.

mod anthropic_backend;
mod budgeted_backend;
mod gemini_backend;
pub mod http_client;
mod openrouter_backend;
mod types;

pub use draftloop_config as config;

pub use budgeted_backend::BudgetedBackend;
pub use draftloop_utils::error::LlmError;
pub use types::{LlmBackend, LlmFallbackInfo, LlmInvocation, LlmResult, Message, Role};

pub(crate) use anthropic_backend::AnthropicBackend;
pub(crate) use gemini_backend::GeminiBackend;
pub(crate) use openrouter_backend::OpenRouterBackend;

use crate::config::Config;
use draftloop_utils::redaction::redact_error_message;
use tracing::{info, warn};

/// Providers accepted by [`from_config`].
pub const SUPPORTED_PROVIDERS: &[&str] = &["gemini", "openrouter", "anthropic"];

/// Construct a backend for one provider, without fallback.
///
/// # Errors
///
/// Returns `LlmError::Unsupported` if the provider is unknown.
/// Returns `LlmError::Misconfiguration` if provider-specific configuration is invalid.
fn construct_backend_for_provider(
    provider: &str,
    config: &Config,
) -> Result<Box<dyn LlmBackend>, LlmError> {
    match provider {
        "gemini" => Ok(Box::new(GeminiBackend::new_from_config(config)?)),
        "openrouter" => {
            let backend = OpenRouterBackend::new_from_config(config)?;
            let config_budget = config.llm.openrouter.as_ref().and_then(|or| or.budget);
            Ok(Box::new(BudgetedBackend::with_limit_from_config(
                Box::new(backend),
                config_budget,
            )))
        }
        "anthropic" => Ok(Box::new(AnthropicBackend::new_from_config(config)?)),
        unknown => Err(LlmError::Unsupported(format!(
            "Unknown LLM provider '{unknown}'. Supported providers: {}.",
            SUPPORTED_PROVIDERS.join(", ")
        ))),
    }
}

/// Create a backend from configuration, reporting whether the fallback was used.
///
/// If the primary provider fails to construct and a fallback is configured,
/// the fallback backend is returned together with [`LlmFallbackInfo`]. When
/// both fail the primary error is returned.
///
/// # Errors
///
/// Returns `LlmError::Unsupported` for unknown providers and
/// `LlmError::Misconfiguration` for invalid provider configuration.
pub fn from_config_with_fallback(
    config: &Config,
) -> Result<(Box<dyn LlmBackend>, Option<LlmFallbackInfo>), LlmError> {
    let provider = config.llm_provider();

    let primary_error = match construct_backend_for_provider(provider, config) {
        Ok(backend) => return Ok((backend, None)),
        Err(e) => e,
    };

    let Some(fallback_provider) = config.llm.fallback_provider.as_deref() else {
        return Err(primary_error);
    };

    let reason = redact_error_message(&primary_error.to_string());
    warn!(
        primary = provider,
        fallback = fallback_provider,
        reason = %reason,
        "Primary provider failed during construction, trying fallback"
    );

    match construct_backend_for_provider(fallback_provider, config) {
        Ok(backend) => {
            info!(provider = fallback_provider, "Using fallback provider");
            Ok((
                backend,
                Some(LlmFallbackInfo {
                    primary_provider: provider.to_string(),
                    fallback_provider: fallback_provider.to_string(),
                    reason,
                }),
            ))
        }
        Err(fallback_error) => {
            warn!(
                provider = fallback_provider,
                error = %redact_error_message(&fallback_error.to_string()),
                "Fallback provider also failed"
            );
            Err(primary_error)
        }
    }
}

/// Create a backend from configuration.
///
/// Defaults to `gemini` when no provider is configured.
///
/// # Errors
///
/// See [`from_config_with_fallback`].
pub fn from_config(config: &Config) -> Result<Box<dyn LlmBackend>, LlmError> {
    let (backend, _fallback_info) = from_config_with_fallback(config)?;
    Ok(backend)
}
