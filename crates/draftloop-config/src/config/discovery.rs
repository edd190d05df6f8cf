use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use super::{
    CliArgs, Config, ConfigSource, DEFAULT_LLM_PROVIDER, Defaults, LlmConfig, SearchConfig,
    StagesConfig,
};

/// Directory holding the config file, relative to the discovery root.
const CONFIG_DIR: &str = ".draftloop";

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    defaults: Option<Defaults>,
    llm: Option<LlmConfig>,
    search: Option<SearchConfig>,
    stages: Option<StagesConfig>,
}

impl Config {
    /// Discover and load configuration with precedence: CLI > file > defaults
    ///
    /// Uses the current working directory for config file discovery when no
    /// explicit path is provided in `cli_args`.
    pub fn discover(cli_args: &CliArgs) -> Result<Self> {
        let start_dir = env::current_dir().context("Failed to get current directory")?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Discover and load configuration starting from a specific directory
    ///
    /// This is the path-driven variant used by tests to avoid process-global state.
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self> {
        let mut source_attribution = HashMap::new();

        let mut defaults = Defaults::default();
        let mut llm = LlmConfig::default();
        let mut search = SearchConfig::default();
        let mut stages = StagesConfig::default();

        for key in ["stage_timeout", "verbose", "search_enabled", "search_max_results"] {
            source_attribution.insert(key.to_string(), ConfigSource::Default);
        }

        let config_path = match &cli_args.config_path {
            Some(explicit_path) => {
                if !explicit_path.exists() {
                    return Err(draftloop_utils::error::ConfigError::NotFound {
                        path: explicit_path.display().to_string(),
                    }
                    .into());
                }
                Some(explicit_path.clone())
            }
            None => Self::discover_config_file_from(start_dir)?,
        };

        if let Some(path) = &config_path {
            let file_config = Self::load_config_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;

            let config_source = ConfigSource::Config;

            if let Some(file_defaults) = file_config.defaults {
                if file_defaults.model.is_some() {
                    defaults.model = file_defaults.model;
                    source_attribution.insert("model".to_string(), config_source.clone());
                }
                if file_defaults.stage_timeout.is_some() {
                    defaults.stage_timeout = file_defaults.stage_timeout;
                    source_attribution.insert("stage_timeout".to_string(), config_source.clone());
                }
                if file_defaults.verbose.is_some() {
                    defaults.verbose = file_defaults.verbose;
                    source_attribution.insert("verbose".to_string(), config_source.clone());
                }
                if file_defaults.max_revisions.is_some() {
                    defaults.max_revisions = file_defaults.max_revisions;
                    source_attribution.insert("max_revisions".to_string(), config_source.clone());
                }
            }

            if let Some(file_llm) = file_config.llm {
                if file_llm.provider.is_some() {
                    llm.provider = file_llm.provider;
                    source_attribution.insert("llm_provider".to_string(), config_source.clone());
                }
                if file_llm.fallback_provider.is_some() {
                    llm.fallback_provider = file_llm.fallback_provider;
                    source_attribution
                        .insert("llm_fallback_provider".to_string(), config_source.clone());
                }
                if file_llm.gemini.is_some() {
                    llm.gemini = file_llm.gemini;
                    source_attribution.insert("llm_gemini".to_string(), config_source.clone());
                }
                if file_llm.openrouter.is_some() {
                    llm.openrouter = file_llm.openrouter;
                    source_attribution
                        .insert("llm_openrouter".to_string(), config_source.clone());
                }
                if file_llm.anthropic.is_some() {
                    llm.anthropic = file_llm.anthropic;
                    source_attribution.insert("llm_anthropic".to_string(), config_source.clone());
                }
            }

            if let Some(file_search) = file_config.search {
                if file_search.provider.is_some() {
                    search.provider = file_search.provider;
                    source_attribution
                        .insert("search_provider".to_string(), config_source.clone());
                }
                if file_search.enabled.is_some() {
                    search.enabled = file_search.enabled;
                    source_attribution.insert("search_enabled".to_string(), config_source.clone());
                }
                if file_search.api_key_env.is_some() {
                    search.api_key_env = file_search.api_key_env;
                }
                if file_search.base_url.is_some() {
                    search.base_url = file_search.base_url;
                }
                if file_search.max_results.is_some() {
                    search.max_results = file_search.max_results;
                    source_attribution
                        .insert("search_max_results".to_string(), config_source.clone());
                }
            }

            if let Some(file_stages) = file_config.stages {
                stages = file_stages;
                source_attribution.insert("stages".to_string(), config_source);
            }
        }

        // Apply CLI overrides (highest priority)
        if let Some(model) = &cli_args.model {
            defaults.model = Some(model.clone());
            source_attribution.insert("model".to_string(), ConfigSource::Cli);
        }
        if let Some(stage_timeout) = cli_args.stage_timeout {
            defaults.stage_timeout = Some(stage_timeout);
            source_attribution.insert("stage_timeout".to_string(), ConfigSource::Cli);
        }
        if let Some(verbose) = cli_args.verbose {
            defaults.verbose = Some(verbose);
            source_attribution.insert("verbose".to_string(), ConfigSource::Cli);
        }
        if let Some(max_revisions) = cli_args.max_revisions {
            defaults.max_revisions = Some(max_revisions);
            source_attribution.insert("max_revisions".to_string(), ConfigSource::Cli);
        }
        if let Some(enabled) = cli_args.search_enabled {
            search.enabled = Some(enabled);
            source_attribution.insert("search_enabled".to_string(), ConfigSource::Cli);
        }

        // Provider precedence: CLI > env > config > default
        if let Ok(env_provider) = env::var("DRAFTLOOP_LLM_PROVIDER")
            && !env_provider.is_empty()
        {
            llm.provider = Some(env_provider);
            source_attribution.insert("llm_provider".to_string(), ConfigSource::Cli);
        }
        if let Some(provider) = &cli_args.llm_provider {
            llm.provider = Some(provider.clone());
            source_attribution.insert("llm_provider".to_string(), ConfigSource::Cli);
        }
        if llm.provider.is_none() {
            llm.provider = Some(DEFAULT_LLM_PROVIDER.to_string());
            source_attribution.insert("llm_provider".to_string(), ConfigSource::Default);
        }

        let config = Self {
            defaults,
            llm,
            search,
            stages,
            source_attribution,
        };

        config.validate()?;

        Ok(config)
    }

    /// Discover config file by searching upward from a given directory
    ///
    /// Walks up the directory tree looking for `.draftloop/config.toml`,
    /// stopping at repository root markers (.git, .hg, .svn) or the
    /// filesystem root.
    pub fn discover_config_file_from(start_dir: &Path) -> Result<Option<PathBuf>> {
        let mut current_dir = start_dir.to_path_buf();

        loop {
            let config_path = current_dir.join(CONFIG_DIR).join("config.toml");
            if config_path.exists() {
                return Ok(Some(config_path));
            }

            if current_dir.join(".git").exists()
                || current_dir.join(".hg").exists()
                || current_dir.join(".svn").exists()
            {
                break;
            }

            match current_dir.parent() {
                Some(parent) => current_dir = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load configuration from TOML file
    fn load_config_file(path: &Path) -> Result<TomlConfig> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let config: TomlConfig = toml::from_str(&content).with_context(|| {
                    format!("Failed to parse TOML config file: {}", path.display())
                })?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TomlConfig::default()),
            Err(e) => Err(anyhow::anyhow!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            )),
        }
    }
}
