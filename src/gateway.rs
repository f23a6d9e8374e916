use reqwest::Client;
use std::future::Future;
use std::pin::Pin;

use crate::config::Settings;
use crate::error::Result;
use crate::history::Message;
use crate::providers;

/// A full outgoing turn: prior history plus the pending user message. The
/// system prompt is not carried here; the provider attaches it on the wire.
pub struct ChatRequest {
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatResponse {
    pub content: String,
}

pub type ChatFuture<'a> = Pin<Box<dyn Future<Output = Result<ChatResponse>> + 'a>>;

/// Seam over the model call so turn logic can be exercised against stubs.
pub trait ModelGateway {
    fn complete<'a>(&'a self, request: ChatRequest) -> ChatFuture<'a>;
}

pub struct OllamaGateway<'a> {
    client: &'a Client,
    settings: &'a Settings,
}

impl<'a> OllamaGateway<'a> {
    pub fn new(client: &'a Client, settings: &'a Settings) -> Self {
        Self { client, settings }
    }
}

impl ModelGateway for OllamaGateway<'_> {
    fn complete<'a>(&'a self, request: ChatRequest) -> ChatFuture<'a> {
        Box::pin(async move {
            let content =
                providers::ollama::chat(self.client, self.settings, &request.messages).await?;
            Ok(ChatResponse { content })
        })
    }
}
