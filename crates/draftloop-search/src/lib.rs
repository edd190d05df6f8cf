//! Web search for the research stage
//!
//! [`SearchProvider`] is the seam the research stage depends on. The only
//! shipped implementation is [`SerperProvider`], which calls the Serper.dev
//! Google search API.

mod serper;

pub use draftloop_utils::error::SearchError;
pub use serper::SerperProvider;

use async_trait::async_trait;
use draftloop_config::Config;
use draftloop_llm::LlmError;
use serde::{Deserialize, Serialize};

/// One organic search result. Providers may omit either field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: Option<String>,
    pub snippet: Option<String>,
    pub link: Option<String>,
}

/// Ranked organic results, best first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub organic: Vec<SearchHit>,
}

impl SearchResults {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.organic.is_empty()
    }
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<SearchResults, SearchError>;
}

/// Build the configured search provider.
///
/// Returns `Ok(None)` when search is disabled, in which case research runs
/// without web results.
///
/// # Errors
///
/// Returns `SearchError::Misconfiguration` for an unknown provider or a
/// missing API key.
pub fn from_config(config: &Config) -> Result<Option<Box<dyn SearchProvider>>, SearchError> {
    if !config.search_enabled() {
        return Ok(None);
    }

    match config.search.provider.as_deref().unwrap_or("serper") {
        "serper" => Ok(Some(Box::new(SerperProvider::new_from_config(config)?))),
        other => Err(SearchError::Misconfiguration(format!(
            "Unknown search provider '{other}'. Supported providers: serper."
        ))),
    }
}

/// Map errors from the shared HTTP client onto the search taxonomy.
pub(crate) fn from_transport_error(error: LlmError) -> SearchError {
    match error {
        LlmError::ProviderAuth(msg) => SearchError::ProviderAuth(msg),
        LlmError::ProviderQuota(msg) => SearchError::ProviderQuota(msg),
        LlmError::ProviderOutage(msg) => SearchError::ProviderOutage(msg),
        LlmError::Timeout { duration } => SearchError::Timeout { duration },
        LlmError::Misconfiguration(msg) | LlmError::Unsupported(msg) => {
            SearchError::Misconfiguration(msg)
        }
        other => SearchError::Transport(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_disabled_search_yields_no_provider() {
        let mut config = Config::minimal_for_testing();
        config.search.enabled = Some(false);
        assert!(from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_unknown_provider_is_misconfiguration() {
        let mut config = Config::minimal_for_testing();
        config.search.provider = Some("bing".to_string());
        match from_config(&config) {
            Err(SearchError::Misconfiguration(msg)) => assert!(msg.contains("bing")),
            _ => panic!("Expected Misconfiguration for unknown provider"),
        }
    }

    #[test]
    fn test_transport_error_mapping() {
        assert!(matches!(
            from_transport_error(LlmError::ProviderAuth("401".into())),
            SearchError::ProviderAuth(_)
        ));
        assert!(matches!(
            from_transport_error(LlmError::Timeout {
                duration: Duration::from_secs(3)
            }),
            SearchError::Timeout { .. }
        ));
        assert!(matches!(
            from_transport_error(LlmError::BudgetExceeded {
                limit: 1,
                attempted: 2
            }),
            SearchError::Transport(_)
        ));
    }

    #[test]
    fn test_results_deserialize_without_organic() {
        let results: SearchResults = serde_json::from_str("{}").unwrap();
        assert!(results.is_empty());
    }
}
