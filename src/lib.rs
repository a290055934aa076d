//! # suspendvisor
//!
//! **Suspendvisor** coordinates graceful suspend and resume of a running server.
//!
//! Components that must quiesce before the server stops taking work (listeners,
//! request gates, schedulers, pools) register as **activities** under a
//! **priority** level. Suspending drives every activity through `prepare` and
//! then `suspend`, lowest priority first; resuming calls `resume` in the
//! reverse order. Within one priority level, activities run concurrently.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  Activity A  │   │  Activity B  │   │  Activity C  │
//!     │ (priority 0) │   │ (priority 0) │   │ (priority 9) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  SuspendController                                                │
//! │  - State (Running / PreSuspend / Suspending / Suspended)          │
//! │  - Registry (identity index + one group per priority)             │
//! │  - ActiveSuspend (completion + cancellation of current attempt)   │
//! │  - SubscriberSet (fans out to listeners) and Bus (raw broadcast)  │
//! └──────┬─────────────────────────────────────────────────┬──────────┘
//!        │ phase runs                                      │ events
//!        ▼                                                 ▼
//!  group 0 ─► group 1 ─► ... ─► group 9          SuspendStarted, SuspendComplete,
//!  (members concurrent, barrier between groups)  SuspendCancelled, ResumeComplete, ...
//! ```
//!
//! ### Lifecycle
//! ```text
//!            suspend()                prepare ok               suspend ok
//! Running ─────────────► PreSuspend ────────────► Suspending ────────────► Suspended
//!    ▲                        │                        │                        │
//!    └────────────────────────┴──── resume() ok ───────┴────────────────────────┘
//!
//! - prepare failure:  state stays PreSuspend, completion = Aborted
//! - suspend failure:  state stays Suspending, completion = SuspendFailed
//! - resume failure:   state unchanged, completion = ResumeFailed
//! - reset():          any state ─► Suspended
//! ```
//!
//! ## Features
//! | Area              | Description                                                    | Key types / traits                             |
//! |-------------------|----------------------------------------------------------------|------------------------------------------------|
//! | **Activities**    | Components taking part in suspend/resume.                      | [`Activity`], [`ActivityFn`], [`ActivityRef`]  |
//! | **Ordering**      | Priority groups, `FIRST` suspends first and resumes last.      | [`Priority`]                                   |
//! | **Control**       | Suspend, resume, late registration, advisory cancellation.     | [`SuspendController`], [`ActiveSuspend`]       |
//! | **Completion**    | Shared outcome handles with caller-side timeouts.              | [`Completion`]                                 |
//! | **Listeners**     | Hook into suspend lifecycle events.                            | [`Subscribe`], [`Event`]                       |
//! | **Errors**        | Typed errors for activities, runs and registration.            | [`ActivityError`], [`SuspendError`]            |
//! | **Configuration** | Bus and queue sizing, initial state.                           | [`ControllerConfig`]                           |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use suspendvisor::{
//!     ActivityError, ActivityFn, ActivityRef, ControllerConfig, Priority, ResumeContext,
//!     State, SuspendContext, SuspendController,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Build listeners (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn suspendvisor::Subscribe>> = vec![Arc::new(suspendvisor::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn suspendvisor::Subscribe>> = Vec::new();
//!
//!     let controller = SuspendController::builder(ControllerConfig::default())
//!         .with_subscribers(subs)
//!         .build();
//!
//!     // Stop accepting requests first, flush caches last.
//!     let acceptor: ActivityRef = ActivityFn::builder("acceptor")
//!         .on_suspend(|_ctx: SuspendContext, _cancel: CancellationToken| async {
//!             println!("acceptor paused");
//!             Ok::<_, ActivityError>(())
//!         })
//!         .on_resume(|_ctx: ResumeContext, _cancel: CancellationToken| async {
//!             println!("acceptor open");
//!             Ok::<_, ActivityError>(())
//!         })
//!         .arc();
//!     let cache: ActivityRef = ActivityFn::builder("cache").arc();
//!
//!     controller.register_activity(acceptor, Priority::FIRST).await?;
//!     controller.register_activity(cache, Priority::LAST).await?;
//!
//!     controller.resume(ResumeContext::new().with_starting(true)).await?;
//!     controller.suspend(SuspendContext::new().with_stopping(true)).await?;
//!     assert_eq!(controller.state(), State::Suspended);
//!
//!     controller.close_listeners().await;
//!     Ok(())
//! }
//! ```
mod activities;
mod core;
mod error;
mod events;
mod subscribers;

// ---- Public re-exports ----

pub use activities::{
    Activity, ActivityFn, ActivityFnBuilder, ActivityRef, Priority, ResumeContext, SuspendContext,
};
pub use crate::core::{
    ActiveSuspend, Completion, ControllerBuilder, ControllerConfig, Outcome, Phase, State,
    SuspendController,
};
pub use error::{ActivityError, RegisterError, SuspendError};
pub use events::{Bus, Event, EventKind};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
