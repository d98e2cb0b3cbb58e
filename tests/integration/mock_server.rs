//! Mock HTTP server setup for integration tests

use flowwrite::{ClientBuilder, LlmClient, ProviderType};
use mockito::{Matcher, Mock, Server, ServerGuard};
use std::time::Duration;

pub const API_KEY: &str = "sk-test";

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self { server, base_url }
    }

    pub fn builder(&self, provider: ProviderType) -> ClientBuilder {
        ClientBuilder::new(provider)
            .api_key(API_KEY)
            .base_url(&self.base_url)
            .timeout(Duration::from_secs(5))
    }

    /// Reasoning/FIM adapter; its beta routes share the mock's base URL.
    pub fn deepseek_client(&self) -> Box<dyn LlmClient> {
        self.builder(ProviderType::DeepSeek).build().unwrap()
    }

    pub fn openai_client(&self) -> Box<dyn LlmClient> {
        self.builder(ProviderType::OpenAi).build().unwrap()
    }

    /// Successful SSE response; each chunk becomes one `data:` event.
    pub async fn mock_sse_stream(&mut self, path: &str, chunks: &[&str]) -> Mock {
        let body = chunks
            .iter()
            .map(|chunk| {
                if chunk.starts_with("data: ") {
                    format!("{}\n\n", chunk)
                } else {
                    format!("data: {}\n\n", chunk)
                }
            })
            .collect::<String>();

        self.server
            .mock("POST", path)
            .match_header("authorization", format!("Bearer {}", API_KEY).as_str())
            .match_body(Matcher::PartialJson(serde_json::json!({"stream": true})))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await
    }

    /// JSON response for a non-streaming call.
    pub async fn mock_json_response(&mut self, path: &str, status: u16, body: &str) -> Mock {
        self.server
            .mock("POST", path)
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(serde_json::json!({"stream": false})))
            .with_status(status as usize)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// Any-body error response, used for both streaming and blocking calls.
    pub async fn mock_error_response(&mut self, path: &str, status: u16, body: &str) -> Mock {
        self.server
            .mock("POST", path)
            .with_status(status as usize)
            .with_body(body)
            .create_async()
            .await
    }
}

pub fn chat_chunk(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-1",
        "object": "chat.completion.chunk",
        "created": 1700000000,
        "model": "deepseek-chat",
        "choices": [{"index": 0, "delta": {"content": content}, "finish_reason": null}]
    })
    .to_string()
}
