//! Completion handles for submitted commands.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::{WriterError, WriterResult};

/// Completion handle for one submitted command.
///
/// Resolves to the action's outcome once the writer thread has executed it.
/// Use [`WriteHandle::wait`] from synchronous code or `.await` the handle
/// from async code. Dropping the handle does not cancel the command.
#[must_use = "dropping a WriteHandle discards the outcome of the command"]
#[derive(Debug)]
pub struct WriteHandle<T> {
    rx: oneshot::Receiver<WriterResult<T>>,
}

impl<T> WriteHandle<T> {
    pub(crate) fn new(rx: oneshot::Receiver<WriterResult<T>>) -> Self {
        Self { rx }
    }

    /// Block the current thread until the command has run.
    ///
    /// Must not be called from within an async runtime.
    ///
    /// # Errors
    ///
    /// Returns the action's error, [`WriterError::ActionPanicked`] if it
    /// panicked, or [`WriterError::Cancelled`] if it never ran.
    pub fn wait(self) -> WriterResult<T> {
        self.rx
            .blocking_recv()
            .unwrap_or(Err(WriterError::Cancelled))
    }
}

impl<T> Future for WriteHandle<T> {
    type Output = WriterResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(WriterError::Cancelled)))
    }
}
