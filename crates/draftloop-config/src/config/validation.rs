use draftloop_utils::error::ConfigError;

use super::Config;

/// Providers the LLM factory knows how to construct.
pub(crate) const SUPPORTED_PROVIDERS: [&str; 3] = ["gemini", "openrouter", "anthropic"];

impl Config {
    /// Validate configuration values
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        let timeouts = std::iter::once(("stage_timeout".to_string(), self.defaults.stage_timeout))
            .chain(
                [
                    ("research", self.stages.research.as_ref()),
                    ("outline", self.stages.outline.as_ref()),
                    ("content", self.stages.content.as_ref()),
                    ("judge", self.stages.judge.as_ref()),
                ]
                .into_iter()
                .map(|(name, sc)| {
                    (
                        format!("stages.{name}.stage_timeout"),
                        sc.and_then(|sc| sc.stage_timeout),
                    )
                }),
            );
        for (key, timeout) in timeouts {
            if let Some(secs) = timeout {
                if secs < 5 {
                    errors.push((key, "must be at least 5 seconds".to_string()));
                } else if secs > 7200 {
                    errors.push((
                        key,
                        "exceeds maximum limit of 7200 seconds (2 hours)".to_string(),
                    ));
                }
            }
        }

        if let Some(max_results) = self.search.max_results
            && !(1..=10).contains(&max_results)
        {
            errors.push((
                "search.max_results".to_string(),
                "must be between 1 and 10".to_string(),
            ));
        }

        for (key, provider) in [
            ("llm.provider", self.llm.provider.as_deref()),
            ("llm.fallback_provider", self.llm.fallback_provider.as_deref()),
        ] {
            if let Some(provider) = provider
                && !SUPPORTED_PROVIDERS.contains(&provider)
            {
                errors.push((
                    key.to_string(),
                    format!(
                        "unknown provider '{provider}' (supported: {})",
                        SUPPORTED_PROVIDERS.join(", ")
                    ),
                ));
            }
        }

        if let Some(provider) = self.search.provider.as_deref()
            && provider != "serper"
        {
            errors.push((
                "search.provider".to_string(),
                format!("unknown provider '{provider}' (supported: serper)"),
            ));
        }

        if errors.len() > 1 {
            let error_count = errors.len();
            return Err(ConfigError::ValidationFailed {
                errors: errors
                    .into_iter()
                    .map(|(key, value)| format!("{key}: {value}"))
                    .collect(),
                error_count,
            });
        }

        match errors.pop() {
            Some((key, value)) => Err(ConfigError::InvalidValue { key, value }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{StageConfig, StagesConfig};

    #[test]
    fn test_minimal_config_is_valid() {
        assert!(Config::minimal_for_testing().validate().is_ok());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let mut config = Config::minimal_for_testing();
        config.llm.provider = Some("claude-cli".to_string());
        let err = config.validate().unwrap_err();
        match err {
            ConfigError::InvalidValue { key, value } => {
                assert_eq!(key, "llm.provider");
                assert!(value.contains("claude-cli"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_multiple_errors_are_collected() {
        let mut config = Config::minimal_for_testing();
        config.search.max_results = Some(0);
        config.stages = StagesConfig {
            judge: Some(StageConfig {
                model: None,
                stage_timeout: Some(2),
            }),
            ..Default::default()
        };
        match config.validate().unwrap_err() {
            ConfigError::ValidationFailed { error_count, errors } => {
                assert_eq!(error_count, 2);
                assert!(errors.iter().any(|e| e.starts_with("stages.judge.stage_timeout")));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
