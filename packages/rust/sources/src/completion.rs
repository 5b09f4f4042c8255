//! Single-turn text completions from a chat model.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::debug;

use leadpipe_http::Client;
use leadpipe_shared::{LeadPipeError, Result};

/// Turns one prompt into one free-text completion.
pub trait CompletionSource: Send + Sync {
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

/// Chat-completions client. The wrapped [`Client`]'s limiter is the global
/// budget for model calls across all enrichment tasks.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    model: String,
}

impl OpenAiClient {
    pub fn new(client: Client, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

impl CompletionSource for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response: ChatResponse = self
            .client
            .post_json(&["chat", "completions"], &request)
            .await
            .map_err(|e| LeadPipeError::context("create chat completion", e))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LeadPipeError::enrichment("chat completion returned no choices"))?;

        debug!(chars = choice.message.content.len(), "completion received");
        Ok(choice.message.content)
    }
}
