//! Integration tests for error mapping and blocking calls

use crate::mock_server::MockServerFixture;
use flowwrite::client::fim_completion;
use flowwrite::types::{build_chat_request, extract_content, FimCompletionRequest};
use flowwrite::{ChatMessage, Error, ProviderType};
use futures::StreamExt;
use std::io::Write;
use std::time::{Duration, Instant};

const COMPLETION: &str = r#"{
    "id": "chatcmpl-9",
    "object": "chat.completion",
    "created": 1700000000,
    "model": "deepseek-chat",
    "choices": [{"index": 0, "message": {"role": "assistant", "content": "Paris"}, "finish_reason": "stop"}],
    "usage": {"prompt_tokens": 9, "completion_tokens": 1, "total_tokens": 10, "prompt_cache_hit_tokens": 0, "prompt_cache_miss_tokens": 9}
}"#;

#[tokio::test]
async fn test_blocking_chat_completion() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json_response("/chat/completions", 200, COMPLETION)
        .await;

    let client = fixture.deepseek_client();
    let request = build_chat_request(
        vec![ChatMessage::user("Capital of France?")],
        "deepseek-chat",
    )
    .stream(true);
    let response = client.chat_completion(&request).await.unwrap();

    // The adapter overrides the caller's stream flag.
    mock.assert_async().await;
    assert_eq!(extract_content(&response), "Paris");
    assert_eq!(response.usage.unwrap().prompt_cache_miss_tokens, Some(9));
}

#[tokio::test]
async fn test_provider_error_message_is_surfaced() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_error_response(
            "/chat/completions",
            401,
            r#"{"error":{"message":"Authentication Fails (no such user)","type":"authentication_error"}}"#,
        )
        .await;

    let client = fixture.deepseek_client();
    let request = build_chat_request(vec![ChatMessage::user("hi")], "deepseek-chat");
    let err = client.chat_completion(&request).await.unwrap_err();
    match err {
        Error::Provider { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Authentication Fails (no such user)");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unstructured_error_uses_status_line() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_error_response("/chat/completions", 502, "<html>bad gateway</html>")
        .await;

    let client = fixture.openai_client();
    let request = build_chat_request(vec![ChatMessage::user("hi")], "gpt-4o");
    let err = client.chat_completion_stream(&request).await.unwrap_err();
    assert_eq!(err.status(), Some(502));
    assert!(matches!(err, Error::Provider { ref message, .. } if message == "502 Bad Gateway"));
}

#[tokio::test]
async fn test_fim_blocking_completion() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json_response(
            "/completions",
            200,
            r#"{"id":"f1","object":"text_completion","created":1,"model":"deepseek-chat",
                "choices":[{"index":0,"text":"a + b","finish_reason":"stop"}]}"#,
        )
        .await;

    let client = fixture.deepseek_client();
    let request = FimCompletionRequest::new("deepseek-chat", "def add(a, b):\n    return ");
    let response = fim_completion(client.as_ref(), &request).await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.text(), "a + b");
}

#[tokio::test]
async fn test_fim_on_chat_only_provider_is_unsupported() {
    let fixture = MockServerFixture::new().await;
    let client = fixture.openai_client();
    let request = FimCompletionRequest::new("gpt-4o", "fn main() {");
    let err = fim_completion(client.as_ref(), &request).await.unwrap_err();
    assert!(matches!(err, Error::Unsupported { ref provider, .. } if provider == "OpenAI"));
}

#[tokio::test]
async fn test_idle_stream_closes_like_cancel() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture
        .server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_chunked_body(|w| {
            w.write_all(b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"slow\"}}]}\n\n")?;
            std::thread::sleep(Duration::from_secs(3));
            w.write_all(b"data: [DONE]\n\n")
        })
        .create_async()
        .await;

    let client = fixture
        .builder(ProviderType::DeepSeek)
        .timeout(Duration::from_millis(500))
        .build()
        .unwrap();
    let request = build_chat_request(vec![ChatMessage::user("hi")], "deepseek-chat");

    let started = Instant::now();
    let items: Vec<_> = client
        .chat_completion_stream(&request)
        .await
        .unwrap()
        .collect()
        .await;

    // No error item: the stream simply ends, as after a cancel.
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].as_ref().unwrap().content_delta(), Some("slow"));
}

#[tokio::test]
async fn test_json_call_is_bounded_by_timeout() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture
        .server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_chunked_body(|w| {
            std::thread::sleep(Duration::from_secs(3));
            w.write_all(COMPLETION.as_bytes())
        })
        .create_async()
        .await;

    let client = fixture
        .builder(ProviderType::DeepSeek)
        .timeout(Duration::from_millis(500))
        .build()
        .unwrap();
    let request = build_chat_request(vec![ChatMessage::user("hi")], "deepseek-chat");
    let err = client.chat_completion(&request).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}
