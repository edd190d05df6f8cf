//! Configuration management for draftloop
//!
//! Hierarchical configuration with discovery and precedence:
//! CLI > file > defaults. TOML files carry `[defaults]`, `[llm]`, `[search]`
//! and `[stages.<stage>]` sections.

mod builder;
mod cli_args;
mod discovery;
mod model;
mod sources;
mod validation;

pub use builder::ConfigBuilder;
pub use cli_args::CliArgs;
pub use model::*;
pub use draftloop_utils::types::ConfigSource;

use std::time::Duration;

use draftloop_utils::types::StageId;

impl Config {
    fn stage_override(&self, stage: StageId) -> Option<&StageConfig> {
        match stage {
            StageId::Research => self.stages.research.as_ref(),
            StageId::Outline => self.stages.outline.as_ref(),
            StageId::Content => self.stages.content.as_ref(),
            StageId::Judge => self.stages.judge.as_ref(),
        }
    }

    /// Get the model to use for a specific stage.
    ///
    /// Precedence (highest to lowest):
    /// 1. Stage-specific override (`[stages.<stage>].model`)
    /// 2. Global default (`[defaults].model`)
    ///
    /// `None` means the provider's configured default model.
    #[must_use]
    pub fn model_for_stage(&self, stage: StageId) -> Option<String> {
        self.stage_override(stage)
            .and_then(|sc| sc.model.clone())
            .or_else(|| self.defaults.model.clone())
    }

    /// Per-call deadline for a stage.
    ///
    /// Stage override > `[defaults].stage_timeout` > 600 seconds.
    #[must_use]
    pub fn timeout_for_stage(&self, stage: StageId) -> Duration {
        let secs = self
            .stage_override(stage)
            .and_then(|sc| sc.stage_timeout)
            .or(self.defaults.stage_timeout)
            .unwrap_or(DEFAULT_STAGE_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    /// Cap on outline change requests, if any.
    #[must_use]
    pub fn max_revisions(&self) -> Option<u32> {
        self.defaults.max_revisions
    }

    #[must_use]
    pub fn llm_provider(&self) -> &str {
        self.llm.provider.as_deref().unwrap_or(DEFAULT_LLM_PROVIDER)
    }

    #[must_use]
    pub fn search_enabled(&self) -> bool {
        self.search.enabled.unwrap_or(true)
    }

    #[must_use]
    pub fn search_max_results(&self) -> usize {
        self.search.max_results.unwrap_or(DEFAULT_SEARCH_MAX_RESULTS)
    }

    #[must_use]
    pub fn verbose(&self) -> bool {
        self.defaults.verbose.unwrap_or(false)
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Config {
    /// Create a minimal Config for testing purposes
    pub fn minimal_for_testing() -> Self {
        Config {
            defaults: Defaults::default(),
            llm: LlmConfig::default(),
            search: SearchConfig::default(),
            stages: StagesConfig::default(),
            source_attribution: std::collections::HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn create_test_config_file(dir: &Path, content: &str) -> PathBuf {
        let config_dir = dir.join(".draftloop");
        fs::create_dir_all(&config_dir).unwrap();

        let config_path = config_dir.join("config.toml");
        fs::write(&config_path, content).unwrap();

        config_path
    }

    #[test]
    fn test_default_config() {
        let defaults = Defaults::default();
        assert_eq!(defaults.stage_timeout, Some(600));
        assert_eq!(defaults.verbose, Some(false));
        assert_eq!(defaults.max_revisions, None);

        let search = SearchConfig::default();
        assert_eq!(search.max_results, Some(5));
        assert_eq!(search.provider.as_deref(), Some("serper"));
    }

    #[test]
    fn test_config_discovery_with_cli_override() {
        let temp_dir = TempDir::new().unwrap();
        create_test_config_file(
            temp_dir.path(),
            r#"
[defaults]
model = "gemini-2.5-pro"
stage_timeout = 120
max_revisions = 4

[search]
max_results = 3
"#,
        );

        let cli_args = CliArgs {
            model: Some("gemini-2.5-flash".to_string()),
            verbose: Some(true),
            ..Default::default()
        };

        let config = Config::discover_from(temp_dir.path(), &cli_args).unwrap();

        assert_eq!(config.defaults.model.as_deref(), Some("gemini-2.5-flash"));
        assert_eq!(config.defaults.verbose, Some(true));
        assert_eq!(config.defaults.stage_timeout, Some(120));
        assert_eq!(config.max_revisions(), Some(4));
        assert_eq!(config.search_max_results(), 3);

        assert_eq!(config.source_attribution.get("model"), Some(&ConfigSource::Cli));
        assert_eq!(
            config.source_attribution.get("stage_timeout"),
            Some(&ConfigSource::Config)
        );
        assert_eq!(
            config.source_attribution.get("llm_provider"),
            Some(&ConfigSource::Default)
        );
    }

    #[test]
    fn test_discovery_walks_up_to_parent() {
        let temp_dir = TempDir::new().unwrap();
        create_test_config_file(temp_dir.path(), "[llm]\nprovider = \"anthropic\"\n");
        let nested = temp_dir.path().join("drafts").join("2024");
        fs::create_dir_all(&nested).unwrap();

        let config = Config::discover_from(&nested, &CliArgs::default()).unwrap();
        assert_eq!(config.llm_provider(), "anthropic");
    }

    #[test]
    fn test_discovery_stops_at_repository_root() {
        let temp_dir = TempDir::new().unwrap();
        create_test_config_file(temp_dir.path(), "[llm]\nprovider = \"anthropic\"\n");
        let repo = temp_dir.path().join("repo");
        fs::create_dir_all(repo.join(".git")).unwrap();

        let found = Config::discover_config_file_from(&repo).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        create_test_config_file(temp_dir.path(), "[defaults\nmodel = ");
        let result = Config::discover_from(temp_dir.path(), &CliArgs::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_short_timeout() {
        let cli_args = CliArgs {
            stage_timeout: Some(1),
            ..Default::default()
        };
        let temp_dir = TempDir::new().unwrap();
        let err = Config::discover_from(temp_dir.path(), &cli_args).unwrap_err();
        assert!(err.to_string().contains("stage_timeout"));
    }

    #[test]
    fn test_stage_overrides_take_precedence() {
        let temp_dir = TempDir::new().unwrap();
        create_test_config_file(
            temp_dir.path(),
            r#"
[defaults]
model = "gemini-2.5-flash"
stage_timeout = 300

[stages.judge]
model = "gemini-2.5-pro"

[stages.content]
stage_timeout = 900
"#,
        );
        let config = Config::discover_from(temp_dir.path(), &CliArgs::default()).unwrap();

        assert_eq!(config.model_for_stage(StageId::Judge).as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(
            config.model_for_stage(StageId::Outline).as_deref(),
            Some("gemini-2.5-flash")
        );
        assert_eq!(config.timeout_for_stage(StageId::Content), Duration::from_secs(900));
        assert_eq!(config.timeout_for_stage(StageId::Research), Duration::from_secs(300));
    }

    #[test]
    fn test_minimal_config_uses_provider_default_model() {
        let config = Config::minimal_for_testing();
        assert_eq!(config.model_for_stage(StageId::Research), None);
        assert_eq!(config.timeout_for_stage(StageId::Judge), Duration::from_secs(600));
        assert!(config.search_enabled());
    }

    #[test]
    fn test_cli_can_disable_search() {
        let temp_dir = TempDir::new().unwrap();
        let cli_args = CliArgs {
            search_enabled: Some(false),
            ..Default::default()
        };
        let config = Config::discover_from(temp_dir.path(), &cli_args).unwrap();
        assert!(!config.search_enabled());
        assert_eq!(
            config.source_attribution.get("search_enabled"),
            Some(&ConfigSource::Cli)
        );
    }
}
