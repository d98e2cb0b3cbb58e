use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::{BoxStream, Result};

/// Stops a [`ChunkStream`] from another task. Cloning shares the same signal.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    /// After this returns the stream yields no further items and drops no
    /// more buffered bytes into the parser.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Pull-based stream of completion items. Finite, consumed once.
///
/// Dropping it closes the underlying connection.
pub struct ChunkStream<T> {
    inner: BoxStream<'static, T>,
    cancel: CancelHandle,
}

impl<T: Send + 'static> ChunkStream<T> {
    pub fn new(inner: BoxStream<'static, T>) -> Self {
        let token = CancellationToken::new();
        let inner = Box::pin(inner.take_until(token.clone().cancelled_owned()));
        Self {
            inner,
            cancel: CancelHandle { token },
        }
    }
}

impl<T> ChunkStream<T> {
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn with_cancel(self) -> (Self, CancelHandle) {
        let handle = self.cancel_handle();
        (self, handle)
    }
}

impl<T> Stream for ChunkStream<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl<T> std::fmt::Debug for ChunkStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStream")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
