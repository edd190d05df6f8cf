//! Anthropic Messages API backend

use crate::LlmError;
use crate::http_client::HttpClient;
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";

/// Value of the required `anthropic-version` header
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Clone)]
pub(crate) struct AnthropicBackend {
    client: Arc<HttpClient>,
    base_url: String,
    api_key: String,
    default_model: String,
    max_tokens: u32,
    temperature: f32,
}

impl AnthropicBackend {
    /// Create a new Anthropic backend from configuration
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if:
    /// - The API key environment variable is not set
    /// - No model is configured in `[llm.anthropic]`
    /// - The HTTP client cannot be constructed
    pub fn new_from_config(config: &draftloop_config::Config) -> Result<Self, LlmError> {
        let section = config.llm.anthropic.as_ref();

        let api_key_env = section
            .and_then(|a| a.api_key_env.as_deref())
            .unwrap_or("ANTHROPIC_API_KEY");

        let api_key = std::env::var(api_key_env).map_err(|_| {
            LlmError::Misconfiguration(format!(
                "Anthropic API key not found in environment variable '{api_key_env}'. \
                 Please set this variable or configure a different api_key_env in [llm.anthropic]."
            ))
        })?;

        let default_model = section.and_then(|a| a.model.clone()).ok_or_else(|| {
            LlmError::Misconfiguration(
                "Anthropic model not specified in configuration. \
                 Please set [llm.anthropic] model = \"model-name\"."
                    .to_string(),
            )
        })?;

        Ok(Self {
            client: Arc::new(HttpClient::new()?),
            base_url: section
                .and_then(|a| a.base_url.clone())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            default_model,
            max_tokens: section.and_then(|a| a.max_tokens).unwrap_or(4096),
            temperature: section.and_then(|a| a.temperature).unwrap_or(0.7),
        })
    }

    /// Split out system messages, which the Messages API takes as a
    /// top-level field. Multiple system messages are joined with a blank line.
    fn convert_messages(messages: &[Message]) -> (Option<String>, Vec<AnthropicMessage>) {
        let mut system_parts: Vec<&str> = Vec::new();
        let mut converted = Vec::new();

        for msg in messages {
            match msg.role {
                Role::System => system_parts.push(&msg.content),
                Role::User => converted.push(AnthropicMessage {
                    role: "user".to_string(),
                    content: msg.content.clone(),
                }),
                Role::Assistant => converted.push(AnthropicMessage {
                    role: "assistant".to_string(),
                    content: msg.content.clone(),
                }),
            }
        }

        let system = (!system_parts.is_empty()).then(|| system_parts.join("\n\n"));
        (system, converted)
    }
}

#[async_trait]
impl LlmBackend for AnthropicBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let model = if inv.model.is_empty() {
            self.default_model.clone()
        } else {
            inv.model.clone()
        };
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
            provider = "anthropic",
            model = %model,
            stage = %inv.stage_id,
            max_tokens,
            temperature,
            "Invoking Anthropic backend"
        );

        let (system, messages) = Self::convert_messages(&inv.messages);
        let request_body = AnthropicRequest {
            model: model.clone(),
            system,
            messages,
            max_tokens,
            temperature,
        };

        let request = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&request_body);

        let response = self
            .client
            .execute_with_retry(request, inv.timeout, "anthropic")
            .await?;

        let response_body: AnthropicResponse = response.json().await.map_err(|e| {
            LlmError::Transport(format!("Failed to parse Anthropic response: {e}"))
        })?;

        let content: String = response_body
            .content
            .iter()
            .filter(|block| block.content_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect();

        if content.is_empty() {
            return Err(LlmError::Transport(
                "Anthropic response contained no text blocks".to_string(),
            ));
        }

        let mut result = LlmResult::new(content, "anthropic", model)
            .with_timeout_seconds(inv.timeout.as_secs());
        if let Some(usage) = response_body.usage {
            result = result.with_tokens(usage.input_tokens, usage.output_tokens);
        }

        Ok(result)
    }
}

#[derive(Debug, Clone, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct AnthropicRequest {
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_env::env_guard;

    #[test]
    fn test_convert_messages_separates_system() {
        let (system, messages) = AnthropicBackend::convert_messages(&[
            Message::system("You are an editor."),
            Message::system("Answer with a number."),
            Message::user("Rate this."),
        ]);
        assert_eq!(
            system.as_deref(),
            Some("You are an editor.\n\nAnswer with a number.")
        );
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
    }

    #[test]
    fn test_convert_messages_no_system() {
        let (system, messages) = AnthropicBackend::convert_messages(&[Message::user("hi")]);
        assert!(system.is_none());
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn test_response_skips_non_text_blocks() {
        let raw = r#"{
            "content": [
                {"type": "thinking", "text": null},
                {"type": "text", "text": "9"}
            ],
            "usage": {"input_tokens": 10, "output_tokens": 1}
        }"#;
        let parsed: AnthropicResponse = serde_json::from_str(raw).unwrap();
        let text: String = parsed
            .content
            .iter()
            .filter(|b| b.content_type == "text")
            .filter_map(|b| b.text.as_deref())
            .collect();
        assert_eq!(text, "9");
    }

    #[test]
    fn test_new_from_config_missing_api_key() {
        let test_env_var = "ANTHROPIC_API_KEY_TEST_MISSING";
        let _guard = env_guard();
        unsafe {
            std::env::remove_var(test_env_var);
        }

        let mut config = draftloop_config::Config::minimal_for_testing();
        config.llm.anthropic = Some(draftloop_config::AnthropicConfig {
            api_key_env: Some(test_env_var.to_string()),
            model: Some("claude-sonnet-4-5".to_string()),
            ..Default::default()
        });

        match AnthropicBackend::new_from_config(&config) {
            Err(LlmError::Misconfiguration(msg)) => assert!(msg.contains(test_env_var)),
            _ => panic!("Expected Misconfiguration error for missing API key"),
        }
    }
}
