use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

use crate::errors::{AppError, AppResult};

/// One chat completion: an optional system message followed by a single user prompt.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            temperature: 0.3,
            max_tokens: 2000,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Returns the text of the first completion choice.
    async fn complete(&self, request: CompletionRequest) -> AppResult<String>;
}

pub struct OpenAiModel {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiModel {
    pub fn new(api_key: &SecretString, model: &str) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key.expose_secret().to_string());
        Self {
            client: Client::with_config(config),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    async fn complete(&self, request: CompletionRequest) -> AppResult<String> {
        let mut messages = Vec::new();
        if let Some(system) = &request.system {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": request.prompt }));

        log::debug!("Sending completion request to {}", self.model);
        let response: serde_json::Value = self
            .client
            .chat()
            .create_byot(json!({
                "model": self.model,
                "messages": messages,
                "temperature": request.temperature,
                "max_tokens": request.max_tokens,
            }))
            .await?;

        response["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::ExtractionError("completion response carried no message content".into())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_request_defaults() {
        let request = CompletionRequest::new("hello")
            .with_system("be brief")
            .with_max_tokens(100);

        assert_eq!(request.temperature, 0.3);
        assert_eq!(request.max_tokens, 100);
        assert_eq!(request.system.as_deref(), Some("be brief"));
    }

    #[tokio::test]
    async fn test_mock_model_returns_canned_reply() {
        let mut model = MockLanguageModel::new();
        model
            .expect_complete()
            .withf(|request| request.prompt == "ping")
            .times(1)
            .returning(|_| Ok("pong".to_string()));

        let reply = model.complete(CompletionRequest::new("ping")).await.unwrap();
        assert_eq!(reply, "pong");
    }
}
