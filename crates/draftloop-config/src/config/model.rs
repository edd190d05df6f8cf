use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use draftloop_utils::types::ConfigSource;

/// Model used when neither a stage override nor `[defaults].model` is set
/// and the provider table names no model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Default per-call deadline in seconds.
pub const DEFAULT_STAGE_TIMEOUT_SECS: u64 = 600;

/// Default number of organic search results fed to research.
pub const DEFAULT_SEARCH_MAX_RESULTS: usize = 5;

/// Default text generation provider.
pub const DEFAULT_LLM_PROVIDER: &str = "gemini";

/// Configuration for draftloop sessions.
///
/// # Discovery
///
/// [`Config::discover()`] searches for `.draftloop/config.toml` upward from
/// the current directory, stopping at a repository root, then applies CLI
/// overrides on top.
///
/// # Configuration File Format
///
/// ```toml
/// [defaults]
/// model = "gemini-2.5-flash"
/// stage_timeout = 600
/// max_revisions = 5
///
/// [llm]
/// provider = "gemini"
/// fallback_provider = "openrouter"
///
/// [llm.openrouter]
/// model = "google/gemini-2.5-flash"
///
/// [search]
/// max_results = 5
///
/// [stages.content]
/// stage_timeout = 900
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Default values shared by all stages.
    pub defaults: Defaults,
    /// Text generation provider configuration.
    pub llm: LlmConfig,
    /// Web search provider configuration.
    pub search: SearchConfig,
    /// Per-stage overrides.
    pub stages: StagesConfig,
    /// Source attribution for each setting (for `draftloop config`).
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// Default configuration values
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    /// Model for every stage unless a stage overrides it. Unset means the
    /// provider's own default model.
    pub model: Option<String>,
    /// Per-call deadline in seconds.
    pub stage_timeout: Option<u64>,
    pub verbose: Option<bool>,
    /// Cap on outline change requests per session. Unset means unlimited.
    pub max_revisions: Option<u32>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            model: None,
            stage_timeout: Some(DEFAULT_STAGE_TIMEOUT_SECS),
            verbose: Some(false),
            max_revisions: None,
        }
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LlmConfig {
    pub provider: Option<String>,
    pub fallback_provider: Option<String>,
    pub gemini: Option<GeminiConfig>,
    pub openrouter: Option<OpenRouterConfig>,
    pub anthropic: Option<AnthropicConfig>,
}

/// Gemini HTTP provider configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GeminiConfig {
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// OpenRouter HTTP provider configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OpenRouterConfig {
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub budget: Option<u32>,
}

/// Anthropic HTTP provider configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AnthropicConfig {
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Web search provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    pub provider: Option<String>,
    /// When false the research stage runs without web results.
    pub enabled: Option<bool>,
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    pub max_results: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: Some("serper".to_string()),
            enabled: Some(true),
            api_key_env: None,
            base_url: None,
            max_results: Some(DEFAULT_SEARCH_MAX_RESULTS),
        }
    }
}

/// Per-stage configuration overrides
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StageConfig {
    /// Model for this stage (overrides defaults.model)
    pub model: Option<String>,
    /// Stage timeout in seconds (overrides defaults.stage_timeout)
    pub stage_timeout: Option<u64>,
}

/// Stage-specific configuration section
///
/// ```toml
/// [stages.judge]
/// model = "gemini-2.5-pro"
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StagesConfig {
    pub research: Option<StageConfig>,
    pub outline: Option<StageConfig>,
    pub content: Option<StageConfig>,
    pub judge: Option<StageConfig>,
}
