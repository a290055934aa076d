//! # Events emitted by the suspend controller.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Suspend lifecycle**: started, cancelled, complete, failed; resume complete/failed
//! - **Registration**: activity registered / unregistered
//! - **Subscriber health**: panicked, overflow
//!
//! The [`Event`] struct carries metadata such as timestamps, activity name,
//! priority, phase and reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use suspendvisor::{Event, EventKind, Phase};
//!
//! let ev = Event::new(EventKind::SuspendFailed)
//!     .with_activity("acceptor")
//!     .with_phase(Phase::Prepare)
//!     .with_reason("busy");
//!
//! assert_eq!(ev.kind, EventKind::SuspendFailed);
//! assert_eq!(ev.activity.as_deref(), Some("acceptor"));
//! assert_eq!(ev.reason.as_deref(), Some("busy"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::activities::Priority;
use crate::core::Phase;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of controller events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Suspend lifecycle ===
    /// A new suspend attempt started (`Running → PreSuspend`).
    ///
    /// Sets:
    /// - `at`, `seq`
    SuspendStarted,

    /// A resume started while the controller was not running; any in-flight
    /// suspend attempt was asked to cancel.
    ///
    /// Sets:
    /// - `at`, `seq`
    SuspendCancelled,

    /// The suspend attempt finished; the server is quiesced (`Suspended`).
    ///
    /// Sets:
    /// - `at`, `seq`
    SuspendComplete,

    /// The suspend attempt failed in its prepare or suspend phase.
    ///
    /// Sets:
    /// - `phase`: `Prepare` or `Suspend`
    /// - `activity`: failing activity name
    /// - `priority`: its group
    /// - `reason`: failure message
    /// - `at`, `seq`
    SuspendFailed,

    /// The resume run finished; the server is `Running`.
    ///
    /// Sets:
    /// - `at`, `seq`
    ResumeComplete,

    /// The resume run failed.
    ///
    /// Sets:
    /// - `phase`: `Resume`
    /// - `activity`, `priority`, `reason`
    /// - `at`, `seq`
    ResumeFailed,

    // === Registration ===
    /// An activity was added to its priority group.
    ///
    /// Sets:
    /// - `activity`, `priority`
    /// - `at`, `seq`
    ActivityRegistered,

    /// An activity was removed from its priority group.
    ///
    /// Sets:
    /// - `activity`, `priority`
    /// - `at`, `seq`
    ActivityUnregistered,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `activity`: subscriber name
    /// - `reason`: panic info
    /// - `at`, `seq`
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `activity`: subscriber name
    /// - `reason`: `full` or `closed`
    /// - `at`, `seq`
    SubscriberOverflow,
}

/// Controller event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Activity (or subscriber) name, if applicable.
    pub activity: Option<Arc<str>>,
    /// Priority group, if applicable.
    pub priority: Option<Priority>,
    /// Phase, if applicable.
    pub phase: Option<Phase>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            activity: None,
            priority: None,
            phase: None,
            reason: None,
        }
    }

    /// Attaches an activity name.
    #[inline]
    pub fn with_activity(mut self, name: impl Into<Arc<str>>) -> Self {
        self.activity = Some(name.into());
        self
    }

    /// Attaches a priority group.
    #[inline]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Attaches a phase.
    #[inline]
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_activity(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_activity(subscriber)
            .with_reason(info)
    }

    /// True for events describing subscriber health rather than suspend state.
    #[inline]
    pub fn is_subscriber_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}
