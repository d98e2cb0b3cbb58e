//! Event mapping (JSON Value -> typed chunks)

use futures::{future, StreamExt};
use serde_json::Value;
use tracing::debug;

use crate::types::{FimText, StreamChunk};
use crate::BoxStream;

/// Typed chat chunks. Events that do not fit the chunk shape are skipped.
pub fn map_chat_chunks(input: BoxStream<'static, Value>) -> BoxStream<'static, StreamChunk> {
    let stream = input.filter_map(|item| {
        future::ready(match item {
            Ok(v) => match serde_json::from_value::<StreamChunk>(v) {
                Ok(chunk) => Some(Ok(chunk)),
                Err(e) => {
                    debug!(error = %e, "skipping event that is not a chat chunk");
                    None
                }
            },
            Err(e) => Some(Err(e)),
        })
    });
    Box::pin(stream)
}

/// Text of a FIM event, `None` when the first choice carries no text.
pub fn fim_text(event: &Value) -> Option<FimText> {
    let text = event.pointer("/choices/0/text")?.as_str()?;
    if text.is_empty() {
        return None;
    }
    Some(FimText {
        text: text.to_string(),
    })
}

pub fn map_fim_texts(input: BoxStream<'static, Value>) -> BoxStream<'static, FimText> {
    let stream = input.filter_map(|item| {
        future::ready(match item {
            Ok(v) => fim_text(&v).map(Ok),
            Err(e) => Some(Err(e)),
        })
    });
    Box::pin(stream)
}
