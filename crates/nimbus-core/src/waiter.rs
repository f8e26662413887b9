//! Polling until an asynchronous condition holds.
//!
//! A [`Waiter`] invokes a caller-supplied check right away and then on a
//! growing interval until the check reports completion, fails, the waiter's
//! own `max_wait` elapses, or the [`RequestContext`] is canceled. Errors from
//! the check end the wait immediately; retrying transient failures is the
//! check's own business.

use crate::backoff::BackoffStrategy;
use crate::context::RequestContext;
use crate::{Error, Result};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::debug;

/// Pacing and deadline for a [`Waiter`].
///
/// Structurally similar to the HTTP [`BackoffStrategy`] but configured
/// separately: this paces re-checking a not-yet-ready condition rather than
/// retrying a failed call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaiterConfig {
    /// Delay after the first unsuccessful check
    pub interval: Duration,
    /// Total time budget measured from the start of the wait
    pub max_wait: Duration,
    /// Growth factor applied to the interval after each check
    pub backoff_multiplier: f64,
    /// Upper bound on the interval
    pub backoff_cap: Duration,
}

impl WaiterConfig {
    /// Poll every `interval` for at most `max_wait`.
    #[must_use]
    pub const fn new(interval: Duration, max_wait: Duration) -> Self {
        Self {
            interval,
            max_wait,
            backoff_multiplier: 1.0,
            backoff_cap: interval,
        }
    }

    /// Grow the interval by `multiplier` after each check.
    #[must_use]
    pub const fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Never sleep longer than `cap` between checks.
    #[must_use]
    pub const fn with_backoff_cap(mut self, cap: Duration) -> Self {
        self.backoff_cap = cap;
        self
    }

    /// Delay schedule derived from this configuration.
    ///
    /// The multiplier is raised to at least 1.0 and the cap to at least the
    /// interval. No jitter is applied.
    #[must_use]
    pub fn pacing(&self) -> BackoffStrategy {
        BackoffStrategy::no_retry()
            .with_initial_interval(self.interval)
            .with_max_interval(self.backoff_cap.max(self.interval))
            .with_multiplier(self.backoff_multiplier)
    }
}

/// Polls a check until it succeeds, fails, times out or is canceled.
#[derive(Debug, Clone, Copy)]
pub struct Waiter {
    config: WaiterConfig,
}

impl Waiter {
    /// Create a waiter.
    #[must_use]
    pub const fn new(config: WaiterConfig) -> Self {
        Self { config }
    }

    /// The waiter's configuration.
    #[must_use]
    pub const fn config(&self) -> &WaiterConfig {
        &self.config
    }

    /// Run `check` until it returns `Ok(true)`.
    ///
    /// `check` receives a clone of `ctx` and must not have side effects beyond
    /// reading remote state. The first check happens immediately.
    ///
    /// # Errors
    ///
    /// See [`poll`](Self::poll).
    pub async fn wait<F, Fut>(&self, ctx: &RequestContext, mut check: F) -> Result<()>
    where
        F: FnMut(RequestContext) -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        self.poll(ctx, move |ctx| {
            let ready = check(ctx);
            async move { Ok(ready.await?.then_some(())) }
        })
        .await
    }

    /// Run `fetch` until it yields a value.
    ///
    /// `Ok(None)` means "not yet"; the value of the first `Ok(Some(_))` is
    /// returned.
    ///
    /// # Errors
    ///
    /// - the first error returned by `fetch`, verbatim;
    /// - [`Error::WaitTimeout`] once `max_wait` has elapsed;
    /// - a `canceled` (or `timeout`, for a context deadline) [`Error::Api`]
    ///   when `ctx` finishes first, without waiting for the current sleep.
    pub async fn poll<T, F, Fut>(&self, ctx: &RequestContext, mut fetch: F) -> Result<T>
    where
        F: FnMut(RequestContext) -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        let started = Instant::now();
        let deadline = started + self.config.max_wait;
        let pacing = self.config.pacing();
        let mut tick: u32 = 0;

        loop {
            let outcome = tokio::select! {
                biased;
                reason = ctx.done() => return Err(reason.into_error("wait").into()),
                outcome = fetch(ctx.clone()) => outcome?,
                () = sleep_until(deadline) => return Err(timed_out(started)),
            };

            if let Some(value) = outcome {
                debug!(checks = tick + 1, elapsed = ?started.elapsed(), "condition met");
                return Ok(value);
            }

            let delay = pacing.duration(tick);
            debug!(check = tick + 1, delay = ?delay, "condition not met yet");

            tokio::select! {
                biased;
                reason = ctx.done() => return Err(reason.into_error("wait").into()),
                () = sleep_until(deadline) => return Err(timed_out(started)),
                () = sleep(delay) => {}
            }

            tick = tick.saturating_add(1);
        }
    }
}

/// Decide whether a polled resource has reached `target`.
///
/// Returns `Ok(true)` on the target status and `Ok(false)` while the resource
/// is still transitioning. A `failed` status other than the target ends the
/// wait with [`Error::UnexpectedState`].
///
/// # Errors
///
/// Returns [`Error::UnexpectedState`] as described above.
pub fn reached_status<S>(
    resource: impl Display,
    current: &S,
    target: &S,
    failed: bool,
) -> Result<bool>
where
    S: PartialEq + Display,
{
    if current == target {
        Ok(true)
    } else if failed {
        Err(Error::UnexpectedState {
            resource: resource.to_string(),
            state: current.to_string(),
            target: target.to_string(),
        })
    } else {
        Ok(false)
    }
}

/// Shorthand for `Waiter::new(*config).wait(ctx, check)`.
///
/// # Errors
///
/// See [`Waiter::wait`].
pub async fn wait_until<F, Fut>(
    ctx: &RequestContext,
    config: &WaiterConfig,
    check: F,
) -> Result<()>
where
    F: FnMut(RequestContext) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    Waiter::new(*config).wait(ctx, check).await
}

fn timed_out(started: Instant) -> Error {
    Error::WaitTimeout {
        waited: started.elapsed(),
    }
}
