//! # Activity abstraction.
//!
//! This module defines the [`Activity`] trait: the unit of work the
//! [`SuspendController`](crate::SuspendController) drives through its phases.
//! The common handle type is [`ActivityRef`], an `Arc<dyn Activity>` suitable for
//! sharing across the runtime.
//!
//! Every phase method receives the phase context and a [`CancellationToken`].
//! The token is advisory: it is cancelled when the controller stops waiting for
//! the call (a sibling failed, or a resume superseded the suspend). Activities
//! may finish their work anyway.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::activities::{ResumeContext, SuspendContext};
use crate::error::ActivityError;

/// Shared handle to an activity.
///
/// Identity is the `Arc` allocation: two distinct activities never collide
/// even if they compare equal by value.
pub type ActivityRef = Arc<dyn Activity>;

/// # Participant in graceful suspend/resume.
///
/// An activity guards some piece of server work (request admission, a
/// connector, a deployment scanner, ...). On suspend it is first asked to
/// [`prepare`](Activity::prepare), then to [`suspend`](Activity::suspend); on
/// resume it is asked to [`resume`](Activity::resume).
///
/// A panic inside a phase method is treated exactly like returning
/// [`ActivityError::Panicked`].
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use suspendvisor::{Activity, ActivityError, ResumeContext, SuspendContext};
///
/// struct Gate;
///
/// #[async_trait]
/// impl Activity for Gate {
///     fn name(&self) -> &str { "gate" }
///
///     async fn suspend(&self, _ctx: &SuspendContext, _cancel: CancellationToken) -> Result<(), ActivityError> {
///         // stop admitting requests, wait for in-flight ones...
///         Ok(())
///     }
///
///     async fn resume(&self, _ctx: &ResumeContext, _cancel: CancellationToken) -> Result<(), ActivityError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Activity: Send + Sync + 'static {
    /// Human-readable name (for logs/events).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// First suspend phase. Runs for every activity before any `suspend` call.
    ///
    /// Failing here aborts the whole suspend attempt.
    async fn prepare(
        &self,
        _ctx: &SuspendContext,
        _cancel: CancellationToken,
    ) -> Result<(), ActivityError> {
        Ok(())
    }

    /// Second suspend phase: quiesce the guarded work.
    async fn suspend(
        &self,
        ctx: &SuspendContext,
        cancel: CancellationToken,
    ) -> Result<(), ActivityError>;

    /// Single resume phase: restart the guarded work.
    async fn resume(
        &self,
        ctx: &ResumeContext,
        cancel: CancellationToken,
    ) -> Result<(), ActivityError>;
}
