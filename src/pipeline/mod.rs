//! Streaming response pipeline.
//!
//! ```text
//! Raw Bytes → decode_sse → JSON events → map_chat_chunks / map_fim_texts → typed items
//! ```
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`decode`] | Line-oriented `data:` event decoder |
//! | [`event_map`] | JSON events to [`StreamChunk`](crate::types::StreamChunk) or [`FimText`](crate::types::FimText) |

pub mod decode;
pub mod event_map;


pub use decode::{decode_sse, SseLineDecoder};
pub use event_map::{fim_text, map_chat_chunks, map_fim_texts};

use bytes::Bytes;

use crate::types::{FimText, StreamChunk};
use crate::BoxStream;

/// Bytes of a chat completion stream to typed chunks.
pub fn chat_stream(input: BoxStream<'static, Bytes>) -> BoxStream<'static, StreamChunk> {
    map_chat_chunks(decode_sse(input))
}

/// Bytes of a FIM completion stream to non-empty text pieces.
pub fn fim_stream(input: BoxStream<'static, Bytes>) -> BoxStream<'static, FimText> {
    map_fim_texts(decode_sse(input))
}
