//! # SuspendController: graceful suspend/resume of registered activities.
//!
//! The [`SuspendController`] owns the activity registry, the state cell, the
//! current [`ActiveSuspend`] and the listener fan-out. It composes phase runs:
//! prepare then suspend (ascending priority) for suspending, resume (descending
//! priority) for resuming.
//!
//! ## Suspend path
//! ```text
//! suspend(ctx)
//!   ├─ CAS Running → PreSuspend ── fails ──► return current ActiveSuspend completion
//!   ├─ emit SuspendStarted
//!   └─ spawn:
//!        run_phase(FIRST..=LAST, prepare)
//!          ├─ Err ──► warn, SuspendFailed, Aborted      (state stays PreSuspend)
//!          └─ Ok  ──► CAS PreSuspend → Suspending
//!                     run_phase(FIRST..=LAST, suspend)
//!                       ├─ Err ──► warn, SuspendFailed, SuspendFailed  (state stays Suspending)
//!                       └─ Ok  ──► CAS Suspending → Suspended, emit SuspendComplete
//! ```
//!
//! ## Resume path
//! ```text
//! resume(ctx)
//!   ├─ state == Running ──► ready completion (no phase calls)
//!   ├─ ActiveSuspend.cancel()   (advisory; the attempt stops starting groups)
//!   ├─ emit SuspendCancelled
//!   └─ spawn:
//!        run_phase(LAST..=FIRST, resume)
//!          ├─ Err ──► warn, ResumeFailed   (state unchanged)
//!          └─ Ok  ──► state = Running, emit ResumeComplete
//! ```
//!
//! ## Rules
//! - At most one suspend attempt is in flight; concurrent `suspend()` calls share it.
//! - A failed phase is never rolled back; callers re-issue `suspend`/`resume`.
//! - Every state write of a run happens under the attempt lock and only if no
//!   newer attempt (or `reset`) replaced the one the run belongs to.
//! - A superseded run resolves with [`SuspendError::Canceled`] and changes nothing.
//! - Activities registered while not `Running` are suspended on the spot.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use suspendvisor::{
//!     ActivityError, ActivityFn, ActivityRef, ControllerConfig, Priority, ResumeContext,
//!     State, SuspendContext, SuspendController,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let controller = SuspendController::builder(ControllerConfig::default()).build();
//!
//!     let gate: ActivityRef = ActivityFn::builder("gate")
//!         .on_suspend(|_ctx: SuspendContext, _cancel: CancellationToken| async {
//!             Ok::<_, ActivityError>(())
//!         })
//!         .arc();
//!     controller.register_activity(gate, Priority::FIRST).await?;
//!
//!     // Servers boot suspended.
//!     controller.resume(ResumeContext::new().with_starting(true)).await?;
//!     assert_eq!(controller.state(), State::Running);
//!
//!     controller.suspend(SuspendContext::new()).await?;
//!     assert_eq!(controller.state(), State::Suspended);
//!     Ok(())
//! }
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::activities::{ActivityRef, Priority, ResumeContext, SuspendContext};
use crate::core::{
    builder::ControllerBuilder,
    completion::{ActiveSuspend, Completion, Outcome},
    config::ControllerConfig,
    phase::{Phase, PhaseFailure, panic_info, run_phase},
    registry::Registry,
    state::{State, StateCell},
};
use crate::error::{ActivityError, RegisterError, SuspendError};
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Current suspend attempt and the context it was issued with.
///
/// `generation` grows with every new attempt and every `reset()`; a phase run
/// remembers the generation it started under and may only write the state
/// while it is still current.
struct Attempt {
    active: ActiveSuspend,
    context: SuspendContext,
    generation: u64,
}

impl Attempt {
    fn initial(generation: u64) -> Self {
        Self {
            active: ActiveSuspend::completed(),
            context: SuspendContext::new().with_starting(true),
            generation,
        }
    }
}

/// Coordinates suspend/resume of registered activities.
pub struct SuspendController {
    cfg: ControllerConfig,
    state: StateCell,
    registry: Registry,
    /// Guards the `Running → PreSuspend` transition together with the
    /// `ActiveSuspend` swap, so concurrent callers never see a stale attempt.
    attempt: Mutex<Attempt>,
    subs: SubscriberSet,
    bus: Bus,
}

impl SuspendController {
    /// Starts building a controller.
    pub fn builder(cfg: ControllerConfig) -> ControllerBuilder {
        ControllerBuilder::new(cfg)
    }

    pub(crate) fn new_internal(cfg: ControllerConfig, subs: SubscriberSet, bus: Bus) -> Self {
        Self {
            state: StateCell::new(cfg.initial_state()),
            registry: Registry::new(),
            attempt: Mutex::new(Attempt::initial(0)),
            subs,
            bus,
            cfg,
        }
    }

    /// The configuration this controller was built with.
    pub fn config(&self) -> &ControllerConfig {
        &self.cfg
    }

    /// Current state.
    pub fn state(&self) -> State {
        self.state.get()
    }

    /// The current (or most recently finished) suspend attempt.
    pub fn active_suspend(&self) -> ActiveSuspend {
        self.attempt.lock().active.clone()
    }

    /// Starts suspending, or joins the attempt already in flight.
    ///
    /// Only a `Running` controller starts a new attempt. In any other state the
    /// current [`ActiveSuspend`] completion is returned and no phase call is made.
    ///
    /// Must be called from within a tokio runtime.
    pub fn suspend(self: &Arc<Self>, ctx: SuspendContext) -> Completion {
        let mut attempt = self.attempt.lock();
        if let Err(current) = self.state.transition(State::Running, State::PreSuspend) {
            debug!(state = %current, "suspend requested while not running; joining current attempt");
            return attempt.active.completion();
        }

        info!(
            starting = ctx.is_starting(),
            stopping = ctx.is_stopping(),
            activities = self.registry.len(),
            "suspend started"
        );
        self.emit(Event::new(EventKind::SuspendStarted));

        attempt.generation += 1;
        let generation = attempt.generation;
        let token = CancellationToken::new();
        let me = Arc::clone(self);
        let run_token = token.clone();
        let completion =
            Completion::spawn(async move { me.drive_suspend(ctx, generation, run_token).await });

        attempt.active = ActiveSuspend::new(completion.clone(), token);
        attempt.context = ctx;
        completion
    }

    /// Resumes every registered activity, last priority first.
    ///
    /// A no-op (already successful completion) when `Running`. Otherwise the
    /// current suspend attempt is cancelled before the resume run starts.
    ///
    /// The run only sets `Running` if no new suspend attempt started and no
    /// `reset()` happened while it ran; otherwise it resolves with
    /// [`SuspendError::Canceled`] and leaves the state alone.
    ///
    /// Must be called from within a tokio runtime.
    pub fn resume(self: &Arc<Self>, ctx: ResumeContext) -> Completion {
        let from = self.state.get();
        if from == State::Running {
            debug!("resume requested while running; nothing to do");
            return Completion::ready();
        }

        let generation = {
            let attempt = self.attempt.lock();
            attempt.active.cancel();
            attempt.generation
        };
        info!(starting = ctx.is_starting(), from = %from, "resume started");
        self.emit(Event::new(EventKind::SuspendCancelled));

        let me = Arc::clone(self);
        Completion::spawn(async move { me.drive_resume(ctx, generation).await })
    }

    /// Registers `activity` under `priority`.
    ///
    /// Registering an already tracked activity is a no-op. If the controller is
    /// not `Running`, the activity's `suspend` is called (with the context of the
    /// latest suspend attempt) before this returns; the activity stays registered
    /// even if that call fails.
    pub async fn register_activity(
        &self,
        activity: ActivityRef,
        priority: Priority,
    ) -> Result<(), RegisterError> {
        if !self.registry.insert(&activity, priority) {
            debug!(activity = activity.name(), "activity already registered");
            return Ok(());
        }

        debug!(
            activity = activity.name(),
            priority = priority.level(),
            "activity registered"
        );
        self.emit(
            Event::new(EventKind::ActivityRegistered)
                .with_activity(activity.name())
                .with_priority(priority),
        );

        let state = self.state.get();
        if state == State::Running {
            return Ok(());
        }

        let ctx = self.attempt.lock().context;
        debug!(activity = activity.name(), state = %state, "late registration; suspending activity");
        let outcome = AssertUnwindSafe(activity.suspend(&ctx, CancellationToken::new()))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                Err(ActivityError::Panicked {
                    info: panic_info(payload),
                })
            });

        outcome.map_err(|source| {
            warn!(activity = activity.name(), error = %source, "late registration suspend failed");
            RegisterError::LateSuspend {
                activity: activity.name().to_string(),
                source,
            }
        })
    }

    /// Registers `activity` under a raw priority level.
    ///
    /// Levels outside `[Priority::FIRST, Priority::LAST]` are rejected before
    /// anything is registered.
    pub async fn register_activity_at(
        &self,
        activity: ActivityRef,
        level: u8,
    ) -> Result<(), RegisterError> {
        let priority = Priority::new(level)?;
        self.register_activity(activity, priority).await
    }

    /// Registers `activity` under [`Priority::DEFAULT`].
    pub async fn register_default(&self, activity: ActivityRef) -> Result<(), RegisterError> {
        self.register_activity(activity, Priority::DEFAULT).await
    }

    /// Unregisters `activity`. Returns `false` if it was not registered.
    ///
    /// No phase method is called; phase runs already in flight keep the
    /// membership they snapshotted.
    pub fn unregister_activity(&self, activity: &ActivityRef) -> bool {
        let Some(priority) = self.registry.remove(activity) else {
            return false;
        };

        debug!(
            activity = activity.name(),
            priority = priority.level(),
            "activity unregistered"
        );
        self.emit(
            Event::new(EventKind::ActivityUnregistered)
                .with_activity(activity.name())
                .with_priority(priority),
        );
        true
    }

    /// Priority of a registered activity.
    pub fn priority_of(&self, activity: &ActivityRef) -> Option<Priority> {
        self.registry.priority_of(activity)
    }

    /// Number of registered activities.
    pub fn activity_count(&self) -> usize {
        self.registry.len()
    }

    /// Adds a listener. Returns `false` if it was already present.
    pub fn add_listener(&self, listener: Arc<dyn Subscribe>) -> bool {
        self.subs.add(listener)
    }

    /// Removes a listener. Returns `false` if it was not present.
    pub fn remove_listener(&self, listener: &Arc<dyn Subscribe>) -> bool {
        self.subs.remove(listener)
    }

    /// Removes every listener and waits until queued events are delivered.
    pub async fn close_listeners(&self) {
        self.subs.close().await;
    }

    /// Raw stream of every event emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Forces `Suspended`, whatever the current state.
    ///
    /// Any in-flight attempt is cancelled and replaced by a finished one; the
    /// remembered suspend context goes back to its boot-time default. Suspend
    /// and resume runs still in flight can no longer change the state.
    pub fn reset(&self) {
        let mut attempt = self.attempt.lock();
        let from = self.state.get();
        self.state.set(State::Suspended);
        attempt.active.cancel();
        *attempt = Attempt::initial(attempt.generation + 1);
        info!(from = %from, "controller reset");
    }

    /// Moves `from → to` on behalf of the suspend attempt `generation`.
    ///
    /// Fails with [`SuspendError::Canceled`] if the attempt was cancelled or
    /// superseded, or if the state is no longer `from`.
    fn advance(
        &self,
        generation: u64,
        token: &CancellationToken,
        from: State,
        to: State,
    ) -> Result<(), SuspendError> {
        let attempt = self.attempt.lock();
        if attempt.generation != generation || token.is_cancelled() {
            debug!(from = %from, to = %to, "suspend attempt cancelled or superseded");
            return Err(SuspendError::Canceled);
        }
        self.state.transition(from, to).map_err(|current| {
            debug!(state = %current, from = %from, to = %to, "suspend superseded");
            SuspendError::Canceled
        })
    }

    async fn drive_suspend(
        self: Arc<Self>,
        ctx: SuspendContext,
        generation: u64,
        token: CancellationToken,
    ) -> Outcome {
        run_phase(self.registry.groups(), Phase::Prepare, &token, move |a, cancel| {
            async move { a.prepare(&ctx, cancel).await }.boxed()
        })
        .await
        .map_err(|failure| self.phase_failed(Phase::Prepare, failure))?;

        self.advance(generation, &token, State::PreSuspend, State::Suspending)?;

        run_phase(self.registry.groups(), Phase::Suspend, &token, move |a, cancel| {
            async move { a.suspend(&ctx, cancel).await }.boxed()
        })
        .await
        .map_err(|failure| self.phase_failed(Phase::Suspend, failure))?;

        self.advance(generation, &token, State::Suspending, State::Suspended)?;

        info!("server suspended");
        self.emit(Event::new(EventKind::SuspendComplete));
        Ok(())
    }

    async fn drive_resume(self: Arc<Self>, ctx: ResumeContext, generation: u64) -> Outcome {
        let token = CancellationToken::new();
        run_phase(self.registry.groups().rev(), Phase::Resume, &token, move |a, cancel| {
            async move { a.resume(&ctx, cancel).await }.boxed()
        })
        .await
        .map_err(|failure| self.phase_failed(Phase::Resume, failure))?;

        let superseded = {
            let attempt = self.attempt.lock();
            let stale = attempt.generation != generation;
            if !stale {
                self.state.set(State::Running);
            }
            stale
        };
        if superseded {
            debug!("resume superseded by a newer suspend attempt or reset");
            return Err(SuspendError::Canceled);
        }

        info!("server resumed");
        self.emit(Event::new(EventKind::ResumeComplete));
        Ok(())
    }

    /// Logs a stopped phase run and converts it into the caller-facing error.
    fn phase_failed(&self, phase: Phase, failure: PhaseFailure) -> SuspendError {
        let PhaseFailure::Failed {
            activity,
            priority,
            error,
        } = failure
        else {
            debug!(phase = phase.as_label(), "phase run cancelled");
            return SuspendError::Canceled;
        };

        warn!(
            phase = phase.as_label(),
            activity = %activity,
            priority = priority.level(),
            error = %error,
            "phase failed"
        );
        let kind = match phase {
            Phase::Prepare | Phase::Suspend => EventKind::SuspendFailed,
            Phase::Resume => EventKind::ResumeFailed,
        };
        self.emit(
            Event::new(kind)
                .with_activity(activity)
                .with_priority(priority)
                .with_phase(phase)
                .with_reason(error.to_string()),
        );

        match phase {
            Phase::Prepare => SuspendError::Aborted { source: error },
            Phase::Suspend => SuspendError::SuspendFailed { source: error },
            Phase::Resume => SuspendError::ResumeFailed { source: error },
        }
    }

    fn emit(&self, ev: Event) {
        self.subs.emit(&ev);
        self.bus.publish(ev);
    }
}
