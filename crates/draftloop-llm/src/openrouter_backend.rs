//! OpenRouter HTTP backend implementation
//!
//! OpenRouter exposes many models through an OpenAI-compatible chat
//! completions API.

use crate::LlmError;
use crate::http_client::HttpClient;
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Sent as `X-Title` so requests are attributed in the OpenRouter dashboard
const APP_TITLE: &str = "draftloop";

#[derive(Clone)]
pub(crate) struct OpenRouterBackend {
    client: Arc<HttpClient>,
    base_url: String,
    api_key: String,
    default_model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenRouterBackend {
    /// Create a new OpenRouter backend from configuration
    ///
    /// OpenRouter has no sensible default model, so `[llm.openrouter] model`
    /// is required.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if:
    /// - The API key environment variable is not set
    /// - No model is configured
    /// - The HTTP client cannot be constructed
    pub fn new_from_config(config: &draftloop_config::Config) -> Result<Self, LlmError> {
        let section = config.llm.openrouter.as_ref();

        let api_key_env = section
            .and_then(|or| or.api_key_env.as_deref())
            .unwrap_or("OPENROUTER_API_KEY");

        let api_key = std::env::var(api_key_env).map_err(|_| {
            LlmError::Misconfiguration(format!(
                "OpenRouter API key not found in environment variable '{api_key_env}'. \
                 Please set this variable or configure a different api_key_env in [llm.openrouter]."
            ))
        })?;

        let default_model = section.and_then(|or| or.model.clone()).ok_or_else(|| {
            LlmError::Misconfiguration(
                "OpenRouter model not specified in configuration. \
                 Please set [llm.openrouter] model = \"model-name\"."
                    .to_string(),
            )
        })?;

        Ok(Self {
            client: Arc::new(HttpClient::new()?),
            base_url: section
                .and_then(|or| or.base_url.clone())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            default_model,
            max_tokens: section.and_then(|or| or.max_tokens).unwrap_or(4096),
            temperature: section.and_then(|or| or.temperature).unwrap_or(0.7),
        })
    }

    fn resolve_model(&self, inv: &LlmInvocation) -> String {
        if inv.model.is_empty() {
            self.default_model.clone()
        } else {
            inv.model.clone()
        }
    }

    fn convert_messages(messages: &[Message]) -> Vec<ChatMessage> {
        messages
            .iter()
            .map(|msg| ChatMessage {
                role: match msg.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                }
                .to_string(),
                content: msg.content.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl LlmBackend for OpenRouterBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let model = self.resolve_model(&inv);
        let max_tokens = inv
            .metadata
            .get("max_tokens")
            .and_then(|v| v.as_u64())
            .map_or(self.max_tokens, |v| v as u32);
        let temperature = inv
            .metadata
            .get("temperature")
            .and_then(|v| v.as_f64())
            .map_or(self.temperature, |v| v as f32);

        debug!(
            provider = "openrouter",
            model = %model,
            stage = %inv.stage_id,
            max_tokens,
            temperature,
            "Invoking OpenRouter backend"
        );

        let request_body = ChatRequest {
            model: model.clone(),
            messages: Self::convert_messages(&inv.messages),
            max_tokens,
            temperature,
            stream: false,
        };

        let request = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("X-Title", APP_TITLE)
            .header("Content-Type", "application/json")
            .json(&request_body);

        let response = self
            .client
            .execute_with_retry(request, inv.timeout, "openrouter")
            .await?;

        let response_body: ChatResponse = response.json().await.map_err(|e| {
            LlmError::Transport(format!("Failed to parse OpenRouter response: {e}"))
        })?;

        let content = response_body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                LlmError::Transport("OpenRouter response missing content in choices[0]".to_string())
            })?;

        let mut result = LlmResult::new(content, "openrouter", model)
            .with_timeout_seconds(inv.timeout.as_secs());
        if let Some(usage) = response_body.usage {
            result = result.with_tokens(usage.prompt_tokens, usage.completion_tokens);
        }

        Ok(result)
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_env::env_guard;

    #[test]
    fn test_convert_messages_keeps_order_and_roles() {
        let converted = OpenRouterBackend::convert_messages(&[
            Message::system("sys"),
            Message::user("question"),
            Message::assistant("answer"),
        ]);
        let roles: Vec<&str> = converted.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant"]);
        assert_eq!(converted[1].content, "question");
    }

    #[test]
    fn test_response_parsing_with_usage() {
        let raw = r#"{
            "choices": [{"message": {"role": "assistant", "content": "7"}}],
            "usage": {"prompt_tokens": 40, "completion_tokens": 1}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("7"));
        assert_eq!(parsed.usage.unwrap().prompt_tokens, 40);
    }

    #[test]
    fn test_new_from_config_requires_model() {
        let test_env_var = "OPENROUTER_API_KEY_TEST_NO_MODEL";
        let _guard = env_guard();
        unsafe {
            std::env::set_var(test_env_var, "test-key");
        }

        let mut config = draftloop_config::Config::minimal_for_testing();
        config.llm.openrouter = Some(draftloop_config::OpenRouterConfig {
            api_key_env: Some(test_env_var.to_string()),
            ..Default::default()
        });

        match OpenRouterBackend::new_from_config(&config) {
            Err(LlmError::Misconfiguration(msg)) => assert!(msg.contains("model")),
            _ => panic!("Expected Misconfiguration error for missing model"),
        }

        unsafe {
            std::env::remove_var(test_env_var);
        }
    }

    #[test]
    fn test_new_from_config_with_model() {
        let test_env_var = "OPENROUTER_API_KEY_TEST_WITH_MODEL";
        let _guard = env_guard();
        unsafe {
            std::env::set_var(test_env_var, "test-key");
        }

        let mut config = draftloop_config::Config::minimal_for_testing();
        config.llm.openrouter = Some(draftloop_config::OpenRouterConfig {
            api_key_env: Some(test_env_var.to_string()),
            model: Some("google/gemini-2.5-flash".to_string()),
            temperature: Some(0.1),
            ..Default::default()
        });

        let backend = OpenRouterBackend::new_from_config(&config).unwrap();
        assert_eq!(backend.default_model, "google/gemini-2.5-flash");
        assert_eq!(backend.base_url, DEFAULT_BASE_URL);
        assert!((backend.temperature - 0.1).abs() < f32::EPSILON);

        unsafe {
            std::env::remove_var(test_env_var);
        }
    }
}
