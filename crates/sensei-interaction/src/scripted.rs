//! Scripted completion client for tests and offline development.

use async_trait::async_trait;
use sensei_core::completion::{CompletionClient, PromptContext};
use sensei_core::error::{Result, SenseiError};
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// A reply the scripted client can produce.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Return this text as the completion.
    Text(String),
    /// Fail this call as if the upstream service were down.
    Unavailable,
}

/// Completion client that pops canned replies from a queue.
///
/// An exhausted queue behaves like an unavailable upstream, which is also
/// how engine tests simulate completion failures mid-conversation.
#[derive(Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<ScriptedReply>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a client preloaded with text replies.
    pub fn with_replies(replies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|text| ScriptedReply::Text(text.into()))
                    .collect(),
            ),
        }
    }

    /// Queues one more reply.
    pub async fn push(&self, reply: ScriptedReply) {
        self.replies.lock().await.push_back(reply);
    }

    /// Queues a text reply.
    pub async fn push_text(&self, text: impl Into<String>) {
        self.push(ScriptedReply::Text(text.into())).await;
    }

    /// Queues a simulated upstream failure.
    pub async fn push_failure(&self) {
        self.push(ScriptedReply::Unavailable).await;
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, _ctx: &PromptContext) -> Result<String> {
        match self.replies.lock().await.pop_front() {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Unavailable) => Err(SenseiError::completion_unavailable(
                "scripted upstream failure",
            )),
            None => Err(SenseiError::completion_unavailable("script exhausted")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_in_order() {
        let client = ScriptedClient::with_replies(["first", "second"]);
        let ctx = PromptContext::default();

        assert_eq!(client.complete(&ctx).await.unwrap(), "first");
        assert_eq!(client.complete(&ctx).await.unwrap(), "second");
    }

    #[tokio::test]
    async fn test_exhausted_script_is_unavailable() {
        let client = ScriptedClient::new();
        let err = client.complete(&PromptContext::default()).await.unwrap_err();
        assert!(err.is_completion());
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let client = ScriptedClient::new();
        client.push_failure().await;
        client.push_text("after the outage").await;

        let ctx = PromptContext::default();
        assert!(client.complete(&ctx).await.unwrap_err().is_completion());
        assert_eq!(client.complete(&ctx).await.unwrap(), "after the outage");
    }
}
