use std::path::PathBuf;

/// CLI overrides applied on top of the config file.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub model: Option<String>,
    pub stage_timeout: Option<u64>,
    pub verbose: Option<bool>,
    pub max_revisions: Option<u32>,
    pub llm_provider: Option<String>,
    /// `Some(false)` disables web search for this run.
    pub search_enabled: Option<bool>,
}
