//! Adapter for the reasoning family: chat, thinking mode, assistant prefix
//! completion and fill-in-middle.
//!
//! FIM and prefix completion live on the beta base URL. A chat request whose
//! messages carry a prefix flag is sent there as well.

use async_trait::async_trait;
use tracing::info;

use super::{endpoint, ChatEndpoint};
use crate::client::types::ChunkStream;
use crate::client::{FimClient, LlmClient};
use crate::pipeline;
use crate::registry::ProviderConfig;
use crate::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, FimCompletionRequest,
    FimCompletionResponse, FimText, StreamChunk,
};
use crate::Result;

#[derive(Debug, Clone)]
pub struct DeepSeekClient {
    chat: ChatEndpoint,
    base_url: String,
    beta_base_url: String,
}

impl DeepSeekClient {
    pub fn new(chat: ChatEndpoint, base_url: impl Into<String>, beta_base_url: impl Into<String>) -> Self {
        Self {
            chat,
            base_url: base_url.into(),
            beta_base_url: beta_base_url.into(),
        }
    }

    pub fn beta_base_url(&self) -> &str {
        &self.beta_base_url
    }

    fn chat_base(&self, request: &ChatCompletionRequest) -> &str {
        if request.messages.iter().any(ChatMessage::is_prefix) {
            &self.beta_base_url
        } else {
            &self.base_url
        }
    }

    fn fim_body(&self, request: &FimCompletionRequest, stream: bool) -> (String, FimCompletionRequest) {
        let url = endpoint(&self.beta_base_url, "completions");
        info!(
            provider = %self.chat.config().name,
            model = %request.model,
            endpoint = %url,
            stream,
            "dispatching FIM completion"
        );
        (
            url,
            FimCompletionRequest {
                stream,
                ..request.clone()
            },
        )
    }
}

#[async_trait]
impl LlmClient for DeepSeekClient {
    async fn chat_completion(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        self.chat.chat(self.chat_base(request), request).await
    }

    async fn chat_completion_stream(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChunkStream<StreamChunk>> {
        self.chat.chat_stream(self.chat_base(request), request).await
    }

    fn capabilities(&self) -> &ProviderConfig {
        self.chat.config()
    }

    fn as_fim(&self) -> Option<&dyn FimClient> {
        Some(self)
    }
}

#[async_trait]
impl FimClient for DeepSeekClient {
    async fn fim_completion(&self, request: &FimCompletionRequest) -> Result<FimCompletionResponse> {
        let (url, body) = self.fim_body(request, false);
        self.chat.transport().post_json(&url, &body).await
    }

    async fn fim_completion_stream(
        &self,
        request: &FimCompletionRequest,
    ) -> Result<ChunkStream<FimText>> {
        let (url, body) = self.fim_body(request, true);
        let bytes = self.chat.transport().post_stream(&url, &body).await?;
        Ok(ChunkStream::new(pipeline::fim_stream(bytes)))
    }
}
