//! # Completion handles.
//!
//! [`Completion`] is the result of [`suspend`](crate::SuspendController::suspend)
//! and [`resume`](crate::SuspendController::resume): a cloneable future over a
//! phase run that was already spawned. Dropping a `Completion` does not stop the
//! run; awaiting any clone yields the same result.
//!
//! [`ActiveSuspend`] pairs the completion of one suspend attempt with the
//! advisory cancellation token of that attempt.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use suspendvisor::Completion;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let done = Completion::ready();
//! assert!(done.is_done());
//! assert!(done.clone().with_timeout(Duration::from_millis(10)).await.is_ok());
//! # }
//! ```

use std::fmt;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio_util::sync::CancellationToken;

use crate::error::SuspendError;

/// Result every waiter of a [`Completion`] receives.
pub type Outcome = Result<(), SuspendError>;

/// Shared, cloneable handle to the outcome of a suspend or resume run.
#[derive(Clone)]
#[must_use = "a completion reports whether the run succeeded"]
pub struct Completion {
    inner: Shared<BoxFuture<'static, Outcome>>,
}

impl Completion {
    /// An already successful completion.
    pub fn ready() -> Self {
        Self::from_outcome(Ok(()))
    }

    /// An already resolved completion.
    pub(crate) fn from_outcome(outcome: Outcome) -> Self {
        let inner = futures::future::ready(outcome).boxed().shared();
        // `Shared::peek` only sees an output once some clone has been polled.
        let _ = inner.clone().now_or_never();
        Self { inner }
    }

    /// Spawns `run` on the current tokio runtime and returns its handle.
    ///
    /// The run makes progress whether or not anybody polls the handle.
    pub(crate) fn spawn<F>(run: F) -> Self
    where
        F: Future<Output = Outcome> + Send + 'static,
    {
        let inner = run.boxed().shared();
        tokio::spawn(inner.clone());
        Self { inner }
    }

    /// True once the outcome is available.
    pub fn is_done(&self) -> bool {
        self.inner.peek().is_some()
    }

    /// The outcome, if already available.
    pub fn outcome(&self) -> Option<Outcome> {
        self.inner.peek().cloned()
    }

    /// Waits at most `timeout` for the outcome.
    ///
    /// Elapsed time maps to [`SuspendError::Timeout`]; the run itself keeps going.
    pub async fn with_timeout(self, timeout: Duration) -> Outcome {
        match tokio::time::timeout(timeout, self).await {
            Ok(outcome) => outcome,
            Err(_elapsed) => Err(SuspendError::Timeout { timeout }),
        }
    }
}

impl Future for Completion {
    type Output = Outcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().inner.poll_unpin(cx)
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("outcome", &self.inner.peek())
            .finish()
    }
}

/// The current (or most recently finished) suspend attempt.
///
/// Replaced only when a new attempt starts (`Running → PreSuspend`).
/// Awaiting it awaits the attempt's [`Completion`].
#[derive(Clone, Debug)]
pub struct ActiveSuspend {
    completion: Completion,
    token: CancellationToken,
}

impl ActiveSuspend {
    pub(crate) fn new(completion: Completion, token: CancellationToken) -> Self {
        Self { completion, token }
    }

    /// A finished, successful attempt (used before the first real suspend).
    pub(crate) fn completed() -> Self {
        Self::new(Completion::ready(), CancellationToken::new())
    }

    /// Handle to the attempt's outcome.
    pub fn completion(&self) -> Completion {
        self.completion.clone()
    }

    /// Requests cancellation of the attempt (advisory).
    ///
    /// Groups not yet started will not start; activities already running see
    /// their token cancelled but are not interrupted.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// True if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl IntoFuture for ActiveSuspend {
    type Output = Outcome;
    type IntoFuture = Completion;

    fn into_future(self) -> Self::IntoFuture {
        self.completion
    }
}
