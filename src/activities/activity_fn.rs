//! # Closure-backed activity (`ActivityFn`)
//!
//! [`ActivityFn`] wraps up to three closures, one per phase. Each closure
//! *creates* a fresh future per call, so no state is shared between phase calls
//! unless the closure captures it explicitly (use `Arc<...>` inside).
//!
//! Hooks that are not set succeed immediately.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use suspendvisor::{Activity, ActivityError, ActivityFn, ActivityRef, SuspendContext};
//!
//! let a: ActivityRef = ActivityFn::builder("acceptor")
//!     .on_suspend(|_ctx: SuspendContext, _cancel: CancellationToken| async move {
//!         // stop accepting...
//!         Ok::<_, ActivityError>(())
//!     })
//!     .arc();
//!
//! assert_eq!(a.name(), "acceptor");
//! ```

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use tokio_util::sync::CancellationToken;

use crate::activities::{Activity, ResumeContext, SuspendContext};
use crate::error::ActivityError;

type Hook<C> = Arc<
    dyn Fn(C, CancellationToken) -> BoxFuture<'static, Result<(), ActivityError>> + Send + Sync,
>;

fn hook<C, F, Fut>(f: F) -> Hook<C>
where
    C: 'static,
    F: Fn(C, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ActivityError>> + Send + 'static,
{
    Arc::new(move |ctx: C, cancel: CancellationToken| f(ctx, cancel).boxed())
}

/// Closure-backed activity implementation.
pub struct ActivityFn {
    name: Cow<'static, str>,
    prepare: Option<Hook<SuspendContext>>,
    suspend: Option<Hook<SuspendContext>>,
    resume: Option<Hook<ResumeContext>>,
}

impl ActivityFn {
    /// Starts building an activity with the given name.
    pub fn builder(name: impl Into<Cow<'static, str>>) -> ActivityFnBuilder {
        ActivityFnBuilder {
            inner: ActivityFn {
                name: name.into(),
                prepare: None,
                suspend: None,
                resume: None,
            },
        }
    }
}

impl fmt::Debug for ActivityFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityFn")
            .field("name", &self.name)
            .field("prepare", &self.prepare.is_some())
            .field("suspend", &self.suspend.is_some())
            .field("resume", &self.resume.is_some())
            .finish()
    }
}

/// Builder for [`ActivityFn`].
pub struct ActivityFnBuilder {
    inner: ActivityFn,
}

impl ActivityFnBuilder {
    /// Sets the prepare hook.
    pub fn on_prepare<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(SuspendContext, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ActivityError>> + Send + 'static,
    {
        self.inner.prepare = Some(hook(f));
        self
    }

    /// Sets the suspend hook.
    pub fn on_suspend<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(SuspendContext, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ActivityError>> + Send + 'static,
    {
        self.inner.suspend = Some(hook(f));
        self
    }

    /// Sets the resume hook.
    pub fn on_resume<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(ResumeContext, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ActivityError>> + Send + 'static,
    {
        self.inner.resume = Some(hook(f));
        self
    }

    /// Finishes the activity.
    pub fn build(self) -> ActivityFn {
        self.inner
    }

    /// Finishes the activity and returns it as a shared handle.
    pub fn arc(self) -> Arc<ActivityFn> {
        Arc::new(self.inner)
    }
}

#[async_trait]
impl Activity for ActivityFn {
    fn name(&self) -> &str {
        &self.name
    }

    async fn prepare(
        &self,
        ctx: &SuspendContext,
        cancel: CancellationToken,
    ) -> Result<(), ActivityError> {
        match &self.prepare {
            Some(f) => f(*ctx, cancel).await,
            None => Ok(()),
        }
    }

    async fn suspend(
        &self,
        ctx: &SuspendContext,
        cancel: CancellationToken,
    ) -> Result<(), ActivityError> {
        match &self.suspend {
            Some(f) => f(*ctx, cancel).await,
            None => Ok(()),
        }
    }

    async fn resume(
        &self,
        ctx: &ResumeContext,
        cancel: CancellationToken,
    ) -> Result<(), ActivityError> {
        match &self.resume {
            Some(f) => f(*ctx, cancel).await,
            None => Ok(()),
        }
    }
}
