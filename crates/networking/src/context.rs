//! Execution context
//!
//! A [`Context`] bounds a call with an optional deadline and a cancellation
//! token. Contexts form a tree: a derived context is cancelled with its
//! parent and never outlives the parent's deadline.
//!
//! ```
//! use networking::{Context, ContextError};
//! use std::time::Duration;
//!
//! let parent = Context::background();
//! let child = parent.with_timeout(Duration::from_secs(5));
//! assert!(child.deadline().is_some());
//!
//! parent.cancel();
//! assert_eq!(child.err(), Some(ContextError::Cancelled));
//! ```

use crate::{ContextError, Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellable, deadline-bearing execution context
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    token: CancellationToken,
}

impl Context {
    /// A root context with no deadline
    pub fn background() -> Self {
        Self::default()
    }

    /// A root context driven by an existing cancellation token
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            deadline: None,
            token,
        }
    }

    /// Derive a context that is cancelled with this one and keeps its deadline
    pub fn child(&self) -> Self {
        Self {
            deadline: self.deadline,
            token: self.token.child_token(),
        }
    }

    /// Derive a context that expires at `deadline`, or at this context's
    /// deadline if that is earlier
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        };
        Self {
            deadline: Some(deadline),
            token: self.token.child_token(),
        }
    }

    /// Derive a context that expires `timeout` from now
    ///
    /// A timeout too large to represent leaves the deadline unchanged.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.child(),
        }
    }

    /// Cancel this context and every context derived from it
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The instant this context expires, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why this context is done, or `None` while it is still live
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            Some(ContextError::Cancelled)
        } else if self.deadline.is_some_and(|d| d <= Instant::now()) {
            Some(ContextError::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Wait until the context is cancelled or its deadline passes
    pub async fn done(&self) -> ContextError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.token.cancelled() => ContextError::Cancelled,
                _ = tokio::time::sleep_until(deadline) => ContextError::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                ContextError::Cancelled
            }
        }
    }

    /// Drive `work` until it finishes or the context is done
    ///
    /// If `work` fails after the context is already done, the context error
    /// is reported in place of the work's own error.
    pub(crate) async fn run<T, F>(&self, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            reason = self.done() => Err(reason.into()),
            result = work => result.map_err(|err| match (self.err(), err) {
                (_, err @ Error::Context(_)) => err,
                (Some(reason), _) => reason.into(),
                (None, err) => err,
            }),
        }
    }
}
