//! Configuration for draftloop.
//!
//! Precedence is CLI > config file > built-in defaults, with per-key source
//! attribution. See [`Config`].

pub mod config;

pub use config::{
    AnthropicConfig, CliArgs, Config, ConfigBuilder, ConfigSource, Defaults, GeminiConfig,
    LlmConfig, OpenRouterConfig, SearchConfig, StageConfig, StagesConfig,
};
