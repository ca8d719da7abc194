//! ChatApiClient - OpenAI-style chat completions over HTTP.
//!
//! Implements the completion capability against a chat-completions REST
//! endpoint. Every call is bounded by the configured timeout; a timed-out
//! call maps to `CompletionTimeout` so the engine treats the turn as not
//! having happened.

use crate::config::CompletionConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use sensei_core::completion::{CompletionClient, PromptContext};
use sensei_core::error::{Result, SenseiError};
use sensei_core::session::ChatRole;
use serde::{Deserialize, Serialize};

/// Completion client talking to an OpenAI-compatible HTTP API.
#[derive(Clone)]
pub struct ChatApiClient {
    client: Client,
    config: CompletionConfig,
}

impl ChatApiClient {
    /// Creates a new client from the given configuration.
    pub fn new(config: CompletionConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Creates a client configured from environment variables.
    pub fn try_from_env() -> Result<Self> {
        Ok(Self::new(CompletionConfig::try_from_env()?))
    }

    fn build_messages(&self, ctx: &PromptContext) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(ctx.history.len() + 1);

        if !ctx.system.trim().is_empty() {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: ctx.system.clone(),
            });
        }

        for entry in &ctx.history {
            messages.push(ChatMessage {
                role: match entry.role {
                    ChatRole::User => "user".to_string(),
                    ChatRole::Assistant => "assistant".to_string(),
                },
                content: entry.content.clone(),
            });
        }

        messages
    }

    async fn send_request(&self, body: &ChatCompletionRequest) -> Result<String> {
        let response = self
            .client
            .post(&self.config.base_url)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                SenseiError::completion_unavailable(format!("completion request failed: {err}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|err| {
            SenseiError::completion_unavailable(format!("failed to parse completion: {err}"))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                SenseiError::completion_unavailable("completion response contained no choices")
            })
    }
}

#[async_trait]
impl CompletionClient for ChatApiClient {
    async fn complete(&self, ctx: &PromptContext) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: self.build_messages(ctx),
        };

        match tokio::time::timeout(self.config.timeout, self.send_request(&request)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.config.timeout.as_secs(),
                    "completion call timed out"
                );
                Err(SenseiError::CompletionTimeout {
                    seconds: self.config.timeout.as_secs(),
                })
            }
        }
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn map_http_error(status: StatusCode, body: String) -> SenseiError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);

    SenseiError::completion_unavailable(format!("completion API returned {status}: {message}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensei_core::session::ChatEntry;

    #[test]
    fn test_build_messages_maps_roles() {
        let client = ChatApiClient::new(CompletionConfig::new("test-key"));
        let ctx = PromptContext::new(
            "You are a tutor.",
            vec![ChatEntry::user("hi"), ChatEntry::assistant("hello")],
        );

        let messages = client.build_messages(&ctx);

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[2].role, "assistant");
    }

    #[test]
    fn test_empty_system_prompt_is_omitted() {
        let client = ChatApiClient::new(CompletionConfig::new("test-key"));
        let ctx = PromptContext::new("  ", vec![ChatEntry::user("hi")]);

        let messages = client.build_messages(&ctx);

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
    }
}
