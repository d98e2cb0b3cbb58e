//! Integration tests for streaming responses

use crate::mock_server::{chat_chunk, MockServerFixture};
use flowwrite::client::fim_completion_stream;
use flowwrite::types::{build_chat_request, FimCompletionRequest, FinishReason, StreamAccumulator};
use flowwrite::{ChatMessage, ProviderType};
use futures::StreamExt;
use std::io::Write;
use std::time::Duration;

#[tokio::test]
async fn test_sse_streaming_response() {
    let mut fixture = MockServerFixture::new().await;
    let first = chat_chunk("Hello");
    let second = chat_chunk(" World");
    let mock = fixture
        .mock_sse_stream(
            "/chat/completions",
            &[
                r#"{"choices":[{"index":0,"delta":{"role":"assistant"}}]}"#,
                &first,
                "data: {not json",
                &second,
                r#"{"choices":[{"index":0,"delta":{},"finish_reason":"stop"}],"usage":{"prompt_tokens":5,"completion_tokens":2,"total_tokens":7}}"#,
                "data: [DONE]",
            ],
        )
        .await;

    let client = fixture.deepseek_client();
    let request = build_chat_request(vec![ChatMessage::user("Say hello")], "deepseek-chat");
    let mut stream = client.chat_completion_stream(&request).await.unwrap();

    let mut acc = StreamAccumulator::new();
    let mut count = 0;
    while let Some(chunk) = stream.next().await {
        acc.push(&chunk.unwrap());
        count += 1;
    }
    mock.assert_async().await;

    // The malformed line is dropped, [DONE] produces nothing.
    assert_eq!(count, 4);
    let done = acc.finish();
    assert_eq!(done.content, "Hello World");
    assert_eq!(done.finish_reason, Some(FinishReason::Stop));
    assert_eq!(done.usage.map(|u| u.total_tokens), Some(7));
}

#[tokio::test]
async fn test_openai_adapter_streams_from_base_url() {
    let mut fixture = MockServerFixture::new().await;
    let chunk = chat_chunk("hi");
    let mock = fixture
        .mock_sse_stream("/chat/completions", &[&chunk, "data: [DONE]"])
        .await;

    let client = fixture.openai_client();
    let request = build_chat_request(vec![ChatMessage::user("hi")], "gpt-4o");
    let texts: Vec<String> = client
        .chat_completion_stream(&request)
        .await
        .unwrap()
        .map(|c| c.unwrap().content_delta().unwrap_or_default().to_string())
        .collect()
        .await;

    mock.assert_async().await;
    assert_eq!(texts, vec!["hi"]);
}

#[tokio::test]
async fn test_cancel_stops_delivery() {
    let mut fixture = MockServerFixture::new().await;
    let chunks: Vec<String> = (0..5).map(|i| chat_chunk(&i.to_string())).collect();
    let refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
    let _mock = fixture.mock_sse_stream("/chat/completions", &refs).await;

    let client = fixture.deepseek_client();
    let request = build_chat_request(vec![ChatMessage::user("count")], "deepseek-chat");
    let (mut stream, cancel) = client
        .chat_completion_stream_with_cancel(&request)
        .await
        .unwrap();

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.content_delta(), Some("0"));
    cancel.cancel();
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_prefix_completion_uses_beta_url() {
    let mut fixture = MockServerFixture::new().await;
    let chunk = chat_chunk("fn main() {}");
    let mock = fixture
        .mock_sse_stream("/beta/chat/completions", &[&chunk, "data: [DONE]"])
        .await;

    let client = fixture
        .builder(ProviderType::DeepSeek)
        .beta_base_url(format!("{}/beta", fixture.base_url))
        .build()
        .unwrap();
    let request = build_chat_request(
        vec![
            ChatMessage::user("Write a Rust main"),
            ChatMessage::assistant_prefix("```rust\n"),
        ],
        "deepseek-chat",
    );
    let items: Vec<_> = client
        .chat_completion_stream(&request)
        .await
        .unwrap()
        .collect()
        .await;

    mock.assert_async().await;
    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn test_fim_stream_yields_text_only() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_sse_stream(
            "/completions",
            &[
                r#"{"id":"c1","choices":[{"index":0,"text":"    return "}]}"#,
                r#"{"id":"c1","choices":[{"index":0,"text":""}]}"#,
                r#"{"id":"c1","choices":[{"index":0,"text":"a + b","finish_reason":"stop"}]}"#,
                "data: [DONE]",
            ],
        )
        .await;

    let client = fixture.deepseek_client();
    let request = FimCompletionRequest::new("deepseek-chat", "def add(a, b):\n").suffix("\n");
    let texts: Vec<String> = fim_completion_stream(client.as_ref(), &request)
        .await
        .unwrap()
        .map(|t| t.unwrap().text)
        .collect()
        .await;

    mock.assert_async().await;
    assert_eq!(texts, vec!["    return ", "a + b"]);
}

#[tokio::test]
async fn test_slow_active_stream_outlives_timeout() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture
        .server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_chunked_body(|w| {
            for i in 0..8 {
                w.write_all(format!("data: {}\n\n", chat_chunk(&i.to_string())).as_bytes())?;
                std::thread::sleep(Duration::from_millis(200));
            }
            w.write_all(b"data: [DONE]\n\n")
        })
        .create_async()
        .await;

    // Total duration is well past the timeout; every gap is below it.
    let client = fixture
        .builder(ProviderType::DeepSeek)
        .timeout(Duration::from_millis(700))
        .build()
        .unwrap();
    let request = build_chat_request(vec![ChatMessage::user("count")], "deepseek-chat");
    let items: Vec<_> = client
        .chat_completion_stream(&request)
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(items.len(), 8);
    assert!(items.iter().all(|i| i.is_ok()));
}
