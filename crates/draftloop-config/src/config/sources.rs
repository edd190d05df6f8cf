use std::collections::BTreeMap;

use super::{Config, ConfigSource};

fn stable_source_label(source: &ConfigSource) -> &'static str {
    match source {
        ConfigSource::Cli => "cli",
        ConfigSource::Config => "config",
        ConfigSource::Programmatic => "programmatic",
        ConfigSource::Default => "default",
    }
}

fn source_label(source: Option<&ConfigSource>) -> String {
    stable_source_label(source.unwrap_or(&ConfigSource::Default)).to_string()
}

impl Config {
    /// Get effective configuration as key-value pairs with source attribution
    ///
    /// Keys are sorted so the output is stable for display.
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut config = BTreeMap::new();

        let mut add_config = |key: &str, value: Option<String>| {
            if let Some(val) = value {
                let source = source_label(self.source_attribution.get(key));
                config.insert(key.to_string(), (val, source));
            }
        };

        add_config("model", self.defaults.model.clone());
        add_config(
            "stage_timeout",
            self.defaults.stage_timeout.map(|t| t.to_string()),
        );
        add_config("verbose", self.defaults.verbose.map(|v| v.to_string()));
        add_config(
            "max_revisions",
            Some(
                self.defaults
                    .max_revisions
                    .map_or_else(|| "unlimited".to_string(), |m| m.to_string()),
            ),
        );
        add_config("llm_provider", Some(self.llm_provider().to_string()));
        add_config("llm_fallback_provider", self.llm.fallback_provider.clone());
        add_config("search_provider", self.search.provider.clone());
        add_config("search_enabled", Some(self.search_enabled().to_string()));
        add_config(
            "search_max_results",
            Some(self.search_max_results().to_string()),
        );

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_config_labels_sources() {
        let config = Config::builder().model("gemini-2.5-flash").build().unwrap();
        let effective = config.effective_config();

        assert_eq!(
            effective.get("model"),
            Some(&("gemini-2.5-flash".to_string(), "programmatic".to_string()))
        );
        assert_eq!(
            effective.get("max_revisions"),
            Some(&("unlimited".to_string(), "default".to_string()))
        );
        assert_eq!(
            effective.get("search_max_results").map(|(v, _)| v.as_str()),
            Some("5")
        );
    }
}
