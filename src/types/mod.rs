//! Wire types for OpenAI-compatible chat and FIM completions.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`message`] | Chat messages and roles |
//! | [`request`] | Chat and FIM request bodies |
//! | [`response`] | Responses, stream chunks and accumulation |

pub mod message;
pub mod request;
pub mod response;

pub use message::{ChatMessage, MessageRole};
pub use request::{
    build_chat_request, ChatCompletionRequest, FimCompletionRequest, ResponseFormat,
    ResponseFormatType, ThinkingConfig, ThinkingType,
};
pub use response::{
    extract_content, extract_reasoning_content, extract_usage, AccumulatedResponse,
    ChatCompletionResponse, Choice, FimChoice, FimCompletionResponse, FimText, FinishReason,
    ResponseMessage, StreamAccumulator, StreamChoice, StreamChunk, StreamDelta, Usage,
};
