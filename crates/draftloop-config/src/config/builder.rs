use std::collections::HashMap;
use std::time::Duration;

use draftloop_utils::error::ConfigError;

use super::{Config, ConfigSource, Defaults, LlmConfig, SearchConfig, StagesConfig};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// Use this when embedding draftloop and you want behavior independent of
    /// the user's config files and environment.
    ///
    /// ```rust
    /// use draftloop_config::Config;
    /// use std::time::Duration;
    ///
    /// let config = Config::builder()
    ///     .model("gemini-2.5-flash")
    ///     .stage_timeout(Duration::from_secs(120))
    ///     .search_enabled(false)
    ///     .build()
    ///     .expect("valid config");
    /// assert!(!config.search_enabled());
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for programmatic configuration of draftloop.
///
/// All values set via the builder are attributed to
/// `ConfigSource::Programmatic`.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    model: Option<String>,
    stage_timeout: Option<Duration>,
    verbose: Option<bool>,
    max_revisions: Option<u32>,
    llm_provider: Option<String>,
    fallback_provider: Option<String>,
    search_enabled: Option<bool>,
    search_max_results: Option<usize>,
    stages: Option<StagesConfig>,
}

impl ConfigBuilder {
    /// Create a new `ConfigBuilder` with no values set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the model used by every stage without its own override.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the per-call deadline (must be >= 5 seconds and <= 2 hours).
    #[must_use]
    pub fn stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    /// Cap the number of outline change requests per session.
    #[must_use]
    pub fn max_revisions(mut self, max_revisions: u32) -> Self {
        self.max_revisions = Some(max_revisions);
        self
    }

    /// Set the text generation provider ("gemini", "openrouter", "anthropic").
    #[must_use]
    pub fn llm_provider(mut self, provider: impl Into<String>) -> Self {
        self.llm_provider = Some(provider.into());
        self
    }

    #[must_use]
    pub fn fallback_provider(mut self, provider: impl Into<String>) -> Self {
        self.fallback_provider = Some(provider.into());
        self
    }

    #[must_use]
    pub fn search_enabled(mut self, enabled: bool) -> Self {
        self.search_enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn search_max_results(mut self, max_results: usize) -> Self {
        self.search_max_results = Some(max_results);
        self
    }

    /// Replace the per-stage override table.
    #[must_use]
    pub fn stages(mut self, stages: StagesConfig) -> Self {
        self.stages = Some(stages);
        self
    }

    /// Build the configuration, validating every value.
    pub fn build(self) -> Result<Config, ConfigError> {
        let mut source_attribution = HashMap::new();
        let mut defaults = Defaults::default();
        let mut llm = LlmConfig::default();
        let mut search = SearchConfig::default();
        let mut stages = StagesConfig::default();

        let mut set = |key: &str| {
            source_attribution.insert(key.to_string(), ConfigSource::Programmatic);
        };

        if let Some(model) = self.model {
            defaults.model = Some(model);
            set("model");
        }
        if let Some(timeout) = self.stage_timeout {
            defaults.stage_timeout = Some(timeout.as_secs());
            set("stage_timeout");
        }
        if let Some(verbose) = self.verbose {
            defaults.verbose = Some(verbose);
            set("verbose");
        }
        if let Some(max_revisions) = self.max_revisions {
            defaults.max_revisions = Some(max_revisions);
            set("max_revisions");
        }
        if let Some(provider) = self.llm_provider {
            llm.provider = Some(provider);
            set("llm_provider");
        }
        if let Some(provider) = self.fallback_provider {
            llm.fallback_provider = Some(provider);
            set("llm_fallback_provider");
        }
        if let Some(enabled) = self.search_enabled {
            search.enabled = Some(enabled);
            set("search_enabled");
        }
        if let Some(max_results) = self.search_max_results {
            search.max_results = Some(max_results);
            set("search_max_results");
        }
        if let Some(overrides) = self.stages {
            stages = overrides;
            set("stages");
        }

        let config = Config {
            defaults,
            llm,
            search,
            stages,
            source_attribution,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use draftloop_utils::types::StageId;

    #[test]
    fn test_builder_attributes_programmatic_source() {
        let config = Config::builder()
            .model("gemini-2.5-pro")
            .max_revisions(3)
            .build()
            .unwrap();

        assert_eq!(config.model_for_stage(StageId::Content).as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(config.max_revisions(), Some(3));
        assert_eq!(
            config.source_attribution.get("model"),
            Some(&ConfigSource::Programmatic)
        );
        assert!(config.source_attribution.get("stage_timeout").is_none());
    }

    #[test]
    fn test_builder_validates() {
        let result = Config::builder()
            .stage_timeout(Duration::from_secs(1))
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let result = Config::builder().llm_provider("carrier-pigeon").build();
        assert!(result.is_err());
    }
}
