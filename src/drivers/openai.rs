//! Plain chat-only adapter.

use async_trait::async_trait;

use super::ChatEndpoint;
use crate::client::types::ChunkStream;
use crate::client::LlmClient;
use crate::registry::ProviderConfig;
use crate::types::{ChatCompletionRequest, ChatCompletionResponse, StreamChunk};
use crate::Result;

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    chat: ChatEndpoint,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(chat: ChatEndpoint, base_url: impl Into<String>) -> Self {
        Self {
            chat,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat_completion(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        self.chat.chat(&self.base_url, request).await
    }

    async fn chat_completion_stream(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChunkStream<StreamChunk>> {
        self.chat.chat_stream(&self.base_url, request).await
    }

    fn capabilities(&self) -> &ProviderConfig {
        self.chat.config()
    }
}
