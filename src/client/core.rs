use async_trait::async_trait;

use crate::client::types::{CancelHandle, ChunkStream};
use crate::registry::ProviderConfig;
use crate::types::{
    ChatCompletionRequest, ChatCompletionResponse, FimCompletionRequest, FimCompletionResponse,
    FimText, StreamChunk,
};
use crate::{Error, Result};

/// Chat completion contract every provider adapter implements.
///
/// The `stream` flag of the request is ignored; each method sets it for the
/// call it makes.
#[async_trait]
pub trait LlmClient: Send + Sync + std::fmt::Debug {
    async fn chat_completion(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse>;

    async fn chat_completion_stream(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChunkStream<StreamChunk>>;

    async fn chat_completion_stream_with_cancel(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<(ChunkStream<StreamChunk>, CancelHandle)> {
        Ok(self.chat_completion_stream(request).await?.with_cancel())
    }

    fn capabilities(&self) -> &ProviderConfig;

    /// Fill-in-middle support, if the adapter has it.
    fn as_fim(&self) -> Option<&dyn FimClient> {
        None
    }
}

#[async_trait]
pub trait FimClient: Send + Sync {
    async fn fim_completion(&self, request: &FimCompletionRequest) -> Result<FimCompletionResponse>;

    /// Yields only non-empty text pieces.
    async fn fim_completion_stream(
        &self,
        request: &FimCompletionRequest,
    ) -> Result<ChunkStream<FimText>>;

    async fn fim_completion_stream_with_cancel(
        &self,
        request: &FimCompletionRequest,
    ) -> Result<(ChunkStream<FimText>, CancelHandle)> {
        Ok(self.fim_completion_stream(request).await?.with_cancel())
    }
}

fn require_fim(client: &dyn LlmClient) -> Result<&dyn FimClient> {
    client
        .as_fim()
        .ok_or_else(|| Error::unsupported("FIM completion", client.capabilities().name.clone()))
}

/// FIM through a type-erased client; `Unsupported` when the adapter lacks it.
pub async fn fim_completion(
    client: &dyn LlmClient,
    request: &FimCompletionRequest,
) -> Result<FimCompletionResponse> {
    require_fim(client)?.fim_completion(request).await
}

pub async fn fim_completion_stream(
    client: &dyn LlmClient,
    request: &FimCompletionRequest,
) -> Result<ChunkStream<FimText>> {
    require_fim(client)?.fim_completion_stream(request).await
}
