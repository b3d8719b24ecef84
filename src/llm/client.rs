use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::message::Message;

/// A chat model that turns a conversation into one completion.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Returns the completion text. Generation halts before any of `stop`.
    async fn complete(&self, messages: &[Message], stop: &[String]) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    stop: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatClient {
    http: Client,
    config: LlmConfig,
}

impl ChatClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }
}

#[async_trait]
impl ChatModel for ChatClient {
    #[tracing::instrument(skip_all, fields(model = %self.config.model, messages = messages.len()))]
    async fn complete(&self, messages: &[Message], stop: &[String]) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            stop,
        };

        let started = Instant::now();
        let response = self
            .http
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "chat completion failed");
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let content = parse_completion(&body)?;
        tracing::info!(
            latency_ms = started.elapsed().as_millis() as u64,
            response_len = content.len(),
            "chat completion received"
        );
        Ok(content)
    }
}

fn parse_completion(body: &str) -> Result<String> {
    let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| Error::Api {
        status: 200,
        body: format!("unparseable response ({}): {}", e, body),
    })?;

    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or(Error::EmptyResponse)
}
