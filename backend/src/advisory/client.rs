use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::AdvisoryError;
use crate::config::AdvisoryConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// Body of an OpenAI-compatible chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Text-generation backend. Returns the generated text of the first choice.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String, AdvisoryError>;
}

pub struct HttpChatClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpChatClient {
    pub fn new(config: &AdvisoryConfig) -> Result<Self, AdvisoryError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("leafdoc/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AdvisoryError::Transport(e.to_string()))?;
        if config.api_key.is_none() {
            log::warn!("API_KEY not set; advisories will be replaced by the fallback message");
        }
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }

    async fn send(&self, request: &ChatRequest) -> Result<String, AdvisoryError> {
        let api_key = self.api_key.as_deref().ok_or(AdvisoryError::MissingApiKey)?;

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| AdvisoryError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AdvisoryError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let body: ChatResponse = resp
            .json()
            .await
            .map_err(|e| AdvisoryError::Transport(e.to_string()))?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(AdvisoryError::EmptyResponse)
    }
}

#[async_trait]
impl ChatClient for HttpChatClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, AdvisoryError> {
        self.send(request).await
    }
}
