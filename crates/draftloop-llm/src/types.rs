//! Core types for the text generation abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::LlmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// One request to a text generation provider.
///
/// An empty `model` means "use the backend's configured default".
#[derive(Debug, Clone)]
pub struct LlmInvocation {
    /// Workflow topic, for log correlation only.
    pub topic: String,
    /// Stage or criterion issuing the call, for log correlation only.
    pub stage_id: String,
    pub model: String,
    pub timeout: Duration,
    pub messages: Vec<Message>,
    /// Per-call parameter overrides (`max_tokens`, `temperature`).
    pub metadata: HashMap<String, serde_json::Value>,
}

impl LlmInvocation {
    #[must_use]
    pub fn new(
        topic: impl Into<String>,
        stage_id: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
        messages: Vec<Message>,
    ) -> Self {
        Self {
            topic: topic.into(),
            stage_id: stage_id.into(),
            model: model.into(),
            timeout,
            messages,
            metadata: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Content of the last user message, if any.
    #[must_use]
    pub fn prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResult {
    pub raw_response: String,
    pub provider: String,
    pub model_used: String,
    pub tokens_input: Option<u64>,
    pub tokens_output: Option<u64>,
    pub timed_out: Option<bool>,
    pub timeout_seconds: Option<u64>,
    pub extensions: HashMap<String, serde_json::Value>,
}

impl LlmResult {
    #[must_use]
    pub fn new(
        raw_response: impl Into<String>,
        provider: impl Into<String>,
        model_used: impl Into<String>,
    ) -> Self {
        Self {
            raw_response: raw_response.into(),
            provider: provider.into(),
            model_used: model_used.into(),
            tokens_input: None,
            tokens_output: None,
            timed_out: None,
            timeout_seconds: None,
            extensions: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_tokens(mut self, input: u64, output: u64) -> Self {
        self.tokens_input = Some(input);
        self.tokens_output = Some(output);
        self
    }

    #[must_use]
    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timed_out = Some(false);
        self.timeout_seconds = Some(seconds);
        self
    }

    #[must_use]
    pub fn with_extension(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }
}

/// Recorded when the primary provider could not be constructed and the
/// configured fallback was used instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmFallbackInfo {
    pub primary_provider: String,
    pub fallback_provider: String,
    pub reason: String,
}

/// A text generation provider: prompt in, text out, or a typed failure.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_prompt_is_last_user_message() {
        let inv = LlmInvocation::new(
            "Quantum Computing",
            "outline",
            "",
            Duration::from_secs(30),
            vec![
                Message::system("You are an editor."),
                Message::user("first"),
                Message::assistant("reply"),
                Message::user("second"),
            ],
        );
        assert_eq!(inv.prompt(), Some("second"));
    }

    #[test]
    fn test_invocation_metadata_override() {
        let inv = LlmInvocation::new("t", "judge", "m", Duration::from_secs(1), vec![])
            .with_metadata("temperature", serde_json::json!(0.0));
        assert_eq!(inv.metadata["temperature"], serde_json::json!(0.0));
        assert_eq!(inv.prompt(), None);
    }

    #[test]
    fn test_result_builder() {
        let result = LlmResult::new("8.5", "gemini", "gemini-2.5-flash")
            .with_tokens(10, 2)
            .with_timeout_seconds(30);
        assert_eq!(result.tokens_input, Some(10));
        assert_eq!(result.timed_out, Some(false));
        assert_eq!(result.timeout_seconds, Some(30));
    }
}
