//! Request context carrying cancellation for collaborator calls.

use std::future::Future;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Returned when the request context was cancelled before a call completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("request context cancelled")]
pub struct Cancelled;

/// Per-call context handed to stores, fallback strategies and permission
/// evaluators.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Child context; cancelling the parent cancels the child, not vice versa.
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drives `future` to completion unless the context is cancelled first.
    pub async fn run<F>(&self, future: F) -> Result<F::Output, Cancelled>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Cancelled),
            output = future => Ok(output),
        }
    }
}
