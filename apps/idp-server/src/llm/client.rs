//! OpenAI-compatible chat completions client.
//!
//! Talks to any endpoint implementing `POST /chat/completions` (Groq by
//! default) with deterministic decoding and JSON-object output.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use super::parser::{conform_to_schema, decode_object, StructuredParser};
use super::prompt::{render_system_prompt, render_user_prompt};
use super::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, LlmError, ResponseFormat,
};
use crate::config::LlmConfig;
use crate::schema::TargetSchema;

/// Structured parser backed by a chat completions API
pub struct ChatCompletionsParser {
    config: LlmConfig,
    client: Client,
}

impl ChatCompletionsParser {
    /// Create a new parser with the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Connection(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Get the config.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn build_request(&self, text: &str, schema: &TargetSchema) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(render_system_prompt(schema)),
                ChatMessage::user(render_user_prompt(text)),
            ],
            temperature: 0.0,
            response_format: ResponseFormat::json_object(),
        }
    }
}

#[async_trait]
impl StructuredParser for ChatCompletionsParser {
    async fn is_available(&self) -> bool {
        if self.config.api_key.is_empty() {
            return false;
        }

        match self
            .client
            .get(self.endpoint("models"))
            .bearer_auth(&self.config.api_key)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn parse_document(&self, text: &str, schema: &TargetSchema) -> Result<Value, LlmError> {
        if text.trim().is_empty() {
            return Err(LlmError::EmptyInput);
        }

        let request = self.build_request(text, schema);
        debug!(model = %self.config.model, fields = schema.len(), "Sending request to LLM");

        let resp = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }

        let completion: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("completion has no content".to_string()))?;

        let object = conform_to_schema(decode_object(&content)?, schema);
        info!(keys = object.len(), "LLM parsing completed");

        Ok(Value::Object(object))
    }
}
