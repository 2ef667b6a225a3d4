//! Cancellation context handed to every CRUD call.
//!
//! Cancelling the context aborts the *next* statement dispatch. Statements
//! already sent to Snowflake run to completion, so a cancelled operation can
//! leave partial state behind that the next reconcile corrects.

use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Returned when an operation notices its context was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled before the next statement was dispatched")]
pub struct Cancelled;

/// Per-operation context.
#[derive(Debug, Clone)]
pub struct Context {
    token: CancellationToken,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// A fresh, active context.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Wrap an existing token, e.g. one shared by every resource of a run.
    pub fn with_token(token: CancellationToken) -> Self {
        Self { token }
    }

    /// A context cancelled together with this one, but cancellable on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.token.cancel()
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Fail with [`Cancelled`] once cancellation was requested. Called before
    /// every statement dispatch.
    pub fn ensure_active(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}
