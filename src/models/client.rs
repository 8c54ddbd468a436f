//! Chat model client
//!
//! [`ChatModel`] is the seam every pipeline component calls through.
//! [`OpenAiCompatClient`] talks to LM Studio or OpenAI over HTTP, picking the
//! endpoint and key from the model's `api_type`. [`TimedModel`] puts a hard
//! deadline on each call so a hung server becomes an ordinary call failure.

use crate::config::{ApiTable, ApiType, BotConfig, ModelConfig};
use crate::errors::{AssistantError, Result};
use crate::models::types::{ChatCompletionRequest, ChatCompletionResponse};
use crate::types::ChatMessage;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Opaque text-completion service
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send a message list and return the model's reply text
    async fn complete(&self, messages: &[ChatMessage], config: &ModelConfig) -> Result<String>;
}

/// HTTP client for OpenAI-compatible chat completion endpoints
pub struct OpenAiCompatClient {
    client: Client,
    endpoints: ApiTable,
    keys: ApiTable,
}

impl OpenAiCompatClient {
    /// Create a client from the resolved configuration
    pub fn from_config(config: &BotConfig) -> Result<Self> {
        // Outer guard only; the per-call deadline lives in TimedModel
        let request_timeout = Duration::from_secs(config.settings.request_timeout_secs + 5);
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(AssistantError::HttpError)?;

        Ok(Self {
            client,
            endpoints: config.api_endpoints.clone(),
            keys: config.api_keys.clone(),
        })
    }

    fn completions_url(&self, api_type: ApiType) -> Result<String> {
        let base = self.endpoints.get(api_type).ok_or_else(|| {
            AssistantError::ConfigError(format!("no endpoint for {}", api_type.as_str()))
        })?;
        Ok(format!("{}/chat/completions", base.trim_end_matches('/')))
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatClient {
    async fn complete(&self, messages: &[ChatMessage], config: &ModelConfig) -> Result<String> {
        let url = self.completions_url(config.api_type)?;

        debug!(
            model = %config.name,
            temperature = config.temperature,
            max_tokens = config.max_tokens,
            "calling model"
        );

        let request = ChatCompletionRequest {
            model: &config.name,
            messages,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            stream: false,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = self.keys.get(config.api_type) {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AssistantError::CallFailure(format!("failed to send request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AssistantError::CallFailure(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::CallFailure(format!("failed to parse response: {}", e)))?;

        let answer = body
            .first_content()
            .ok_or_else(|| AssistantError::CallFailure("response has no content".to_string()))?;

        debug!(model = %config.name, chars = answer.chars().count(), "model replied");
        Ok(answer)
    }
}

/// A chat model with a per-call deadline
#[derive(Clone)]
pub struct TimedModel {
    inner: Arc<dyn ChatModel>,
    timeout: Duration,
}

impl TimedModel {
    pub fn new(inner: Arc<dyn ChatModel>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// Call the model; expiry is reported as [`AssistantError::Timeout`]
    pub async fn call(&self, messages: &[ChatMessage], config: &ModelConfig) -> Result<String> {
        match tokio::time::timeout(self.timeout, self.inner.complete(messages, config)).await {
            Ok(result) => result,
            Err(_) => Err(AssistantError::Timeout {
                duration_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFile;

    struct SlowModel;

    #[async_trait]
    impl ChatModel for SlowModel {
        async fn complete(&self, _: &[ChatMessage], _: &ModelConfig) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("late".to_string())
        }
    }

    struct EchoModel;

    #[async_trait]
    impl ChatModel for EchoModel {
        async fn complete(&self, messages: &[ChatMessage], _: &ModelConfig) -> Result<String> {
            Ok(messages.last().map(|m| m.content.clone()).unwrap_or_default())
        }
    }

    fn model_config() -> ModelConfig {
        ModelConfig {
            api_type: ApiType::LmStudio,
            name: "m".to_string(),
            temperature: 0.0,
            max_tokens: 10,
        }
    }

    #[tokio::test]
    async fn test_timeout_becomes_call_failure() {
        let model = TimedModel::new(Arc::new(SlowModel), Duration::from_millis(20));
        let err = model
            .call(&[ChatMessage::user("hi")], &model_config())
            .await
            .unwrap_err();
        assert!(matches!(err, AssistantError::Timeout { duration_ms: 20 }));
    }

    #[tokio::test]
    async fn test_fast_call_passes_through() {
        let model = TimedModel::new(Arc::new(EchoModel), Duration::from_secs(1));
        let reply = model
            .call(&[ChatMessage::user("hello")], &model_config())
            .await
            .unwrap();
        assert_eq!(reply, "hello");
    }

    #[test]
    fn test_completions_url() {
        let config = BotConfig::resolve(ConfigFile::default()).unwrap();
        let client = OpenAiCompatClient::from_config(&config).unwrap();
        assert_eq!(
            client.completions_url(ApiType::LmStudio).unwrap(),
            "http://127.0.0.1:1234/v1/chat/completions"
        );
    }

    #[tokio::test]
    #[ignore] // Requires LM Studio running
    async fn test_complete_integration() {
        let config = BotConfig::resolve(ConfigFile::default()).unwrap();
        let client = OpenAiCompatClient::from_config(&config).unwrap();
        let reply = client
            .complete(&[ChatMessage::user("Cześć!")], &model_config())
            .await;
        assert!(reply.is_ok());
    }
}
