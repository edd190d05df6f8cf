//! Serper.dev search provider

use crate::{SearchError, SearchHit, SearchProvider, SearchResults, from_transport_error};
use async_trait::async_trait;
use draftloop_llm::http_client::HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://google.serper.dev/search";

const DEFAULT_API_KEY_ENV: &str = "SERPER_API_KEY";

/// Search requests are short; a slow search should not hold up research.
const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct SerperProvider {
    client: HttpClient,
    base_url: String,
    api_key: String,
}

impl SerperProvider {
    /// # Errors
    ///
    /// Returns `SearchError::Misconfiguration` if the HTTP client cannot be
    /// constructed.
    pub fn new(api_key: String, base_url: Option<String>) -> Result<Self, SearchError> {
        Ok(Self {
            client: HttpClient::new().map_err(from_transport_error)?,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
        })
    }

    /// # Errors
    ///
    /// Returns `SearchError::Misconfiguration` if the API key environment
    /// variable is not set.
    pub fn new_from_config(config: &draftloop_config::Config) -> Result<Self, SearchError> {
        let api_key_env = config
            .search
            .api_key_env
            .as_deref()
            .unwrap_or(DEFAULT_API_KEY_ENV);

        let api_key = std::env::var(api_key_env).map_err(|_| {
            SearchError::Misconfiguration(format!(
                "Serper API key not found in environment variable '{api_key_env}'. \
                 Set it, or disable web search with [search] enabled = false."
            ))
        })?;

        Self::new(api_key, config.search.base_url.clone())
    }
}

#[derive(Debug, Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperOrganic>,
}

#[derive(Debug, Deserialize)]
struct SerperOrganic {
    title: Option<String>,
    snippet: Option<String>,
    link: Option<String>,
}

impl From<SerperResponse> for SearchResults {
    fn from(response: SerperResponse) -> Self {
        Self {
            organic: response
                .organic
                .into_iter()
                .map(|hit| SearchHit {
                    title: hit.title,
                    snippet: hit.snippet,
                    link: hit.link,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl SearchProvider for SerperProvider {
    async fn search(&self, query: &str) -> Result<SearchResults, SearchError> {
        debug!(provider = "serper", query, "Running web search");

        let request = self
            .client
            .post(&self.base_url)
            .header("X-API-KEY", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&SerperRequest { q: query });

        let response = self
            .client
            .execute_with_retry(request, SEARCH_TIMEOUT, "serper")
            .await
            .map_err(from_transport_error)?;

        let body: SerperResponse = response
            .json()
            .await
            .map_err(|e| SearchError::MalformedResponse(e.to_string()))?;

        let results = SearchResults::from(body);
        debug!(
            provider = "serper",
            hits = results.organic.len(),
            "Web search completed"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_conversion_keeps_rank_and_missing_fields() {
        let raw = r#"{
            "searchParameters": {"q": "quantum computing"},
            "organic": [
                {"title": "Quantum computing - Wikipedia", "link": "https://en.wikipedia.org/wiki/Quantum_computing", "snippet": "A quantum computer is...", "position": 1},
                {"link": "https://example.com", "position": 2}
            ]
        }"#;
        let parsed: SerperResponse = serde_json::from_str(raw).unwrap();
        let results = SearchResults::from(parsed);

        assert_eq!(results.organic.len(), 2);
        assert_eq!(
            results.organic[0].title.as_deref(),
            Some("Quantum computing - Wikipedia")
        );
        assert_eq!(results.organic[1].title, None);
        assert_eq!(results.organic[1].snippet, None);
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(SerperRequest { q: "rust async" }).unwrap();
        assert_eq!(body, serde_json::json!({"q": "rust async"}));
    }

    #[test]
    fn test_missing_api_key_is_misconfiguration() {
        let mut config = draftloop_config::Config::minimal_for_testing();
        config.search.api_key_env = Some("DRAFTLOOP_TEST_SERPER_KEY_UNSET".to_string());
        unsafe {
            std::env::remove_var("DRAFTLOOP_TEST_SERPER_KEY_UNSET");
        }

        match SerperProvider::new_from_config(&config) {
            Err(SearchError::Misconfiguration(msg)) => {
                assert!(msg.contains("DRAFTLOOP_TEST_SERPER_KEY_UNSET"));
            }
            _ => panic!("Expected Misconfiguration for missing Serper key"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let provider =
            SerperProvider::new("key".to_string(), Some("http://127.0.0.1:9/search".into()))
                .unwrap();
        let result = provider.search("anything").await;
        assert!(matches!(
            result,
            Err(SearchError::Transport(_)) | Err(SearchError::Timeout { .. })
        ));
    }
}
