//! Shared HTTP client infrastructure for HTTP-based providers
//!
//! A single `reqwest::Client` is configured once per backend and reused for
//! every request, with timeout and retry policies. The search provider reuses
//! it too and maps the resulting [`LlmError`] onto its own error type.

use crate::LlmError;
use draftloop_utils::redaction::redact_error_message;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default maximum HTTP timeout (5 minutes)
const DEFAULT_MAX_HTTP_TIMEOUT: Duration = Duration::from_secs(300);

/// Default connect timeout (30 seconds)
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum number of retry attempts for 5xx and network failures
const MAX_RETRIES: u32 = 2;

/// Backoff unit; attempt N waits N units.
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Shared HTTP client for providers.
///
/// - Connection reuse
/// - Per-request timeout capped at a global maximum
/// - Retry with linear backoff on 5xx and network errors
/// - TLS via rustls
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Arc<Client>,
    max_timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the client cannot be constructed
    pub fn new() -> Result<Self, LlmError> {
        Self::with_max_timeout(DEFAULT_MAX_HTTP_TIMEOUT)
    }

    /// Create a new HTTP client with a custom maximum timeout
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the client cannot be constructed
    pub fn with_max_timeout(max_timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| LlmError::Misconfiguration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client: Arc::new(client),
            max_timeout,
        })
    }

    /// Start a POST request on the shared client.
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }

    /// Execute an HTTP request with timeout and retry policy
    ///
    /// - Per-request timeout: `min(request_timeout, max_timeout)`
    /// - Up to 2 retries for 5xx and network failures, backing off 1s then 2s
    /// - No retries for 4xx errors
    ///
    /// # Errors
    ///
    /// - `LlmError::ProviderAuth` for 401/403
    /// - `LlmError::ProviderQuota` for 429
    /// - `LlmError::ProviderOutage` for 5xx (after retries)
    /// - `LlmError::Timeout` for timeouts
    /// - `LlmError::Transport` for network errors (after retries)
    pub async fn execute_with_retry(
        &self,
        request_builder: RequestBuilder,
        request_timeout: Duration,
        provider_name: &str,
    ) -> Result<Response, LlmError> {
        let effective_timeout = request_timeout.min(self.max_timeout);

        let mut attempt = 0;

        loop {
            attempt += 1;

            let request = request_builder
                .try_clone()
                .ok_or_else(|| LlmError::Transport("Failed to clone request for retry".to_string()))?
                .timeout(effective_timeout)
                .build()
                .map_err(|e| LlmError::Transport(format!("Failed to build request: {e}")))?;

            debug!(
                provider = provider_name,
                attempt = attempt,
                timeout_secs = effective_timeout.as_secs(),
                "Executing HTTP request"
            );

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_client_error() {
                        return Err(map_client_error(status, provider_name));
                    }

                    if status.is_server_error() {
                        if attempt <= MAX_RETRIES {
                            warn!(
                                provider = provider_name,
                                attempt = attempt,
                                status = status.as_u16(),
                                "Server error, will retry"
                            );
                            tokio::time::sleep(INITIAL_BACKOFF * attempt).await;
                            continue;
                        }

                        return Err(LlmError::ProviderOutage(format!(
                            "{provider_name} returned server error: {status}"
                        )));
                    }

                    return Ok(response);
                }
                Err(e) => {
                    if e.is_timeout() {
                        return Err(LlmError::Timeout {
                            duration: effective_timeout,
                        });
                    }

                    let message = redact_error_message(&e.to_string());

                    if attempt <= MAX_RETRIES {
                        warn!(
                            provider = provider_name,
                            attempt = attempt,
                            error = %message,
                            "Network error, will retry"
                        );
                        tokio::time::sleep(INITIAL_BACKOFF * attempt).await;
                        continue;
                    }

                    return Err(LlmError::Transport(format!(
                        "{provider_name} request failed: {message}"
                    )));
                }
            }
        }
    }
}

/// Map HTTP client error status codes to LlmError variants
///
/// - 401/403 → `LlmError::ProviderAuth`
/// - 429 → `LlmError::ProviderQuota`
/// - Other 4xx → `LlmError::Transport`
fn map_client_error(status: StatusCode, provider_name: &str) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            LlmError::ProviderAuth(format!("{provider_name} authentication failed: {status}"))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            LlmError::ProviderQuota(format!("{provider_name} rate limit exceeded: {status}"))
        }
        _ => LlmError::Transport(format!("{provider_name} returned client error: {status}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_construction() {
        let client = HttpClient::new();
        assert!(client.is_ok(), "Should construct HTTP client successfully");
    }

    #[test]
    fn test_http_client_with_custom_timeout() {
        let custom_timeout = Duration::from_secs(60);
        let client = HttpClient::with_max_timeout(custom_timeout).unwrap();
        assert_eq!(client.max_timeout, custom_timeout);
    }

    #[test]
    fn test_map_auth_errors() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            match map_client_error(status, "test-provider") {
                LlmError::ProviderAuth(msg) => {
                    assert!(msg.contains("test-provider"));
                    assert!(msg.contains(status.as_str()));
                }
                other => panic!("Expected ProviderAuth for {status}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_map_429_to_provider_quota() {
        match map_client_error(StatusCode::TOO_MANY_REQUESTS, "test-provider") {
            LlmError::ProviderQuota(msg) => {
                assert!(msg.contains("429"));
                assert!(msg.contains("rate limit"));
            }
            other => panic!("Expected ProviderQuota for 429, got {other:?}"),
        }
    }

    #[test]
    fn test_map_other_4xx_to_transport() {
        for status in [
            StatusCode::BAD_REQUEST,
            StatusCode::NOT_FOUND,
            StatusCode::UNPROCESSABLE_ENTITY,
        ] {
            match map_client_error(status, "test-provider") {
                LlmError::Transport(msg) => {
                    assert!(msg.contains(status.as_str()));
                    assert!(msg.contains("client error"));
                }
                other => panic!("Expected Transport for {status}, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_unreachable_host_reports_transport_error() {
        let client = HttpClient::with_max_timeout(Duration::from_secs(2)).unwrap();
        // Port 9 (discard) on localhost is closed in test environments.
        let request = client.post("http://127.0.0.1:9/unreachable");
        let result = client
            .execute_with_retry(request, Duration::from_secs(2), "test-provider")
            .await;
        assert!(matches!(
            result,
            Err(LlmError::Transport(_)) | Err(LlmError::Timeout { .. })
        ));
    }
}
