//! Gemini HTTP backend implementation
//!
//! Calls the Generative Language API `generateContent` endpoint. This is the
//! default provider.

use crate::LlmError;
use crate::http_client::HttpClient;
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};
use async_trait::async_trait;
use draftloop_config::config::DEFAULT_GEMINI_MODEL;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Default Gemini API endpoint (model name and method are appended)
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini backend configuration
#[derive(Clone)]
pub(crate) struct GeminiBackend {
    client: Arc<HttpClient>,
    base_url: String,
    api_key: String,
    default_model: String,
    default_params: HttpParams,
}

/// HTTP request parameters
#[derive(Debug, Clone)]
pub(crate) struct HttpParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for HttpParams {
    fn default() -> Self {
        Self {
            max_tokens: 8192,
            temperature: 0.7,
        }
    }
}

impl GeminiBackend {
    /// Create a new Gemini backend
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the HTTP client cannot be constructed
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        default_model: String,
        default_params: HttpParams,
    ) -> Result<Self, LlmError> {
        let client = HttpClient::new()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key,
            default_model,
            default_params,
        })
    }

    /// Create a new Gemini backend from configuration
    ///
    /// Unlike the other HTTP providers a model is optional here; it defaults
    /// to `gemini-2.5-flash`.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if:
    /// - The API key environment variable is not set
    /// - The HTTP client cannot be constructed
    pub fn new_from_config(config: &draftloop_config::Config) -> Result<Self, LlmError> {
        let gemini = config.llm.gemini.as_ref();

        let api_key_env = gemini
            .and_then(|g| g.api_key_env.as_deref())
            .unwrap_or("GEMINI_API_KEY");

        let api_key = std::env::var(api_key_env).map_err(|_| {
            LlmError::Misconfiguration(format!(
                "Gemini API key not found in environment variable '{api_key_env}'. \
                 Please set this variable or configure a different api_key_env in [llm.gemini]."
            ))
        })?;

        let base_url = gemini.and_then(|g| g.base_url.clone());

        let default_model = gemini
            .and_then(|g| g.model.clone())
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());

        let fallback = HttpParams::default();
        let default_params = HttpParams {
            max_tokens: gemini
                .and_then(|g| g.max_tokens)
                .unwrap_or(fallback.max_tokens),
            temperature: gemini
                .and_then(|g| g.temperature)
                .unwrap_or(fallback.temperature),
        };

        Self::new(api_key, base_url, default_model, default_params)
    }

    /// Resolve parameters for this invocation
    ///
    /// 1. `inv.model` overrides `default_model`
    /// 2. `inv.metadata["max_tokens"]` overrides `default_params.max_tokens`
    /// 3. `inv.metadata["temperature"]` overrides `default_params.temperature`
    fn resolve_params(&self, inv: &LlmInvocation) -> (String, HttpParams) {
        let model = if inv.model.is_empty() {
            self.default_model.clone()
        } else {
            inv.model.clone()
        };

        let max_tokens = inv
            .metadata
            .get("max_tokens")
            .and_then(|v| v.as_u64())
            .map(|v| v as u32)
            .unwrap_or(self.default_params.max_tokens);

        let temperature = inv
            .metadata
            .get("temperature")
            .and_then(|v| v.as_f64())
            .map(|v| v as f32)
            .unwrap_or(self.default_params.temperature);

        (
            model,
            HttpParams {
                max_tokens,
                temperature,
            },
        )
    }

    /// Split messages into Gemini's `systemInstruction` and `contents`.
    ///
    /// Gemini names the assistant role `model`.
    fn convert_messages(messages: &[Message]) -> (Option<GeminiContent>, Vec<GeminiContent>) {
        let mut system_parts = Vec::new();
        let mut contents = Vec::new();

        for msg in messages {
            let part = GeminiPart {
                text: Some(msg.content.clone()),
            };
            match msg.role {
                Role::System => system_parts.push(part),
                Role::User => contents.push(GeminiContent {
                    role: Some("user".to_string()),
                    parts: vec![part],
                }),
                Role::Assistant => contents.push(GeminiContent {
                    role: Some("model".to_string()),
                    parts: vec![part],
                }),
            }
        }

        let system = (!system_parts.is_empty()).then(|| GeminiContent {
            role: None,
            parts: system_parts,
        });

        (system, contents)
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let (model, params) = self.resolve_params(&inv);

        debug!(
            provider = "gemini",
            model = %model,
            stage = %inv.stage_id,
            max_tokens = params.max_tokens,
            temperature = params.temperature,
            timeout_secs = inv.timeout.as_secs(),
            "Invoking Gemini backend"
        );

        let (system_instruction, contents) = Self::convert_messages(&inv.messages);

        let request_body = GeminiRequest {
            contents,
            system_instruction,
            generation_config: GenerationConfig {
                max_output_tokens: params.max_tokens,
                temperature: params.temperature,
            },
        };

        let request = self
            .client
            .post(&self.endpoint(&model))
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request_body);

        let response = self
            .client
            .execute_with_retry(request, inv.timeout, "gemini")
            .await?;

        let response_body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Transport(format!("Failed to parse Gemini response: {e}")))?;

        let candidate = response_body.candidates.first().ok_or_else(|| {
            LlmError::Transport("Gemini response missing candidates[0]".to_string())
        })?;

        let content = candidate
            .content
            .as_ref()
            .map(|c| {
                c.parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default();

        if content.is_empty() {
            return Err(LlmError::Transport(format!(
                "Gemini response missing text content (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        let mut result =
            LlmResult::new(content, "gemini", model).with_timeout_seconds(inv.timeout.as_secs());

        if let Some(usage) = response_body.usage_metadata {
            result.tokens_input = usage.prompt_token_count;
            result.tokens_output = usage.candidates_token_count;
        }

        debug!(
            provider = "gemini",
            tokens_input = ?result.tokens_input,
            tokens_output = ?result.tokens_output,
            "Gemini invocation completed"
        );

        Ok(result)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
}
