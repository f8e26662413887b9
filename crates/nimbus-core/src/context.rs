//! Per-call cancellation and deadline propagation.

use crate::error::ApiError;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a [`RequestContext`] finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoneReason {
    /// The cancellation token fired
    Canceled,
    /// The deadline passed
    DeadlineExceeded,
}

impl DoneReason {
    /// Structured error for an operation cut short by this reason.
    #[must_use]
    pub fn into_error(self, operation: &str) -> ApiError {
        match self {
            Self::Canceled => ApiError::canceled(format!("{operation} canceled")),
            Self::DeadlineExceeded => ApiError::timeout(format!("{operation} deadline exceeded")),
        }
    }
}

/// Cancellation signal plus optional deadline carried through a call.
///
/// Clones share the same cancellation token, so canceling any clone cancels
/// every in-flight operation that observes it.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Create a context with no deadline and a fresh cancellation token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the deadline to `timeout` from now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Set an absolute deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Observe an externally owned cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Impose `timeout` only when no deadline is set yet.
    #[must_use]
    pub fn with_default_timeout(&self, timeout: Duration) -> Self {
        match self.deadline {
            Some(_) => self.clone(),
            None => self.clone().with_timeout(timeout),
        }
    }

    /// Cancel this context and every clone of it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// True once [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The cancellation token observed by this context.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// The absolute deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, if any.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Non-blocking check; cancellation wins over an elapsed deadline.
    #[must_use]
    pub fn check(&self) -> Option<DoneReason> {
        if self.token.is_cancelled() {
            Some(DoneReason::Canceled)
        } else if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            Some(DoneReason::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Resolve when the context is canceled or its deadline passes.
    ///
    /// Never resolves for a context without a deadline that is never canceled.
    pub async fn done(&self) -> DoneReason {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                () = self.token.cancelled() => DoneReason::Canceled,
                () = tokio::time::sleep_until(deadline) => DoneReason::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                DoneReason::Canceled
            }
        }
    }
}
