//! Streaming decoder (Bytes -> JSON Value) for `data:`-prefixed event lines.
//!
//! Lines are split on raw bytes, so a multi-byte character cut in half by the
//! network is reassembled before any text decoding happens. Output does not
//! depend on where chunk boundaries fall.

use std::collections::VecDeque;

use bytes::Bytes;
use futures::{stream, StreamExt};
use serde_json::Value;
use tracing::debug;

use crate::BoxStream;

const DATA_PREFIX: &str = "data: ";
const DONE_SIGNAL: &str = "[DONE]";

/// Synchronous line decoder. Feed it bytes as they arrive; it returns the JSON
/// payloads of every line completed by the push.
#[derive(Debug, Default)]
pub struct SseLineDecoder {
    buf: Vec<u8>,
}

impl SseLineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) -> Vec<Value> {
        self.buf.extend_from_slice(bytes);

        let mut out = Vec::new();
        let mut start = 0;
        while let Some(pos) = self.buf[start..].iter().position(|b| *b == b'\n') {
            let end = start + pos;
            if let Some(v) = parse_line(&self.buf[start..end]) {
                out.push(v);
            }
            start = end + 1;
        }
        self.buf.drain(..start);
        out
    }

    /// Bytes held back waiting for a newline.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

fn parse_line(raw: &[u8]) -> Option<Value> {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let payload = line.strip_prefix(DATA_PREFIX)?;
    if payload == DONE_SIGNAL {
        return None;
    }

    match serde_json::from_str(payload) {
        Ok(v) => Some(v),
        Err(e) => {
            debug!(error = %e, line = %line, "dropping malformed stream event");
            None
        }
    }
}

/// Decode a byte stream into JSON events.
///
/// A transport error is passed through once and ends the stream. A trailing
/// fragment without a newline is discarded at end of input.
pub fn decode_sse(input: BoxStream<'static, Bytes>) -> BoxStream<'static, Value> {
    let state = (input, SseLineDecoder::new(), VecDeque::new(), false);
    let stream = stream::unfold(
        state,
        |(mut input, mut decoder, mut ready, failed)| async move {
            loop {
                if let Some(v) = ready.pop_front() {
                    return Some((Ok(v), (input, decoder, ready, failed)));
                }
                if failed {
                    return None;
                }

                match input.next().await {
                    Some(Ok(bytes)) => ready.extend(decoder.push(&bytes)),
                    Some(Err(e)) => return Some((Err(e), (input, decoder, ready, true))),
                    None => {
                        if decoder.pending() > 0 {
                            debug!(
                                bytes = decoder.pending(),
                                "discarding unterminated line at end of stream"
                            );
                        }
                        return None;
                    }
                }
            }
        },
    );

    Box::pin(stream)
}
