//! # Controller state and its atomic cell.
//!
//! ```text
//!            suspend()                prepare ok              suspend ok
//!  Running ────────────► PreSuspend ────────────► Suspending ────────────► Suspended
//!     ▲                      │                        │                       │
//!     └──────────────────────┴────────── resume() ────┴───────────────────────┘
//! ```
//!
//! ## Rules
//! - Only `Running → PreSuspend` opens a new suspend attempt (single winner via CAS).
//! - A failed phase leaves the state where it was (no automatic rollback).
//! - `reset()` stores `Suspended` unconditionally.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Suspend state of the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum State {
    /// Fully active, serving.
    Running = 0,
    /// Prepare phase in flight.
    PreSuspend = 1,
    /// Suspend phase in flight.
    Suspending = 2,
    /// Fully quiesced.
    Suspended = 3,
}

impl State {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            State::Running => "running",
            State::PreSuspend => "pre_suspend",
            State::Suspending => "suspending",
            State::Suspended => "suspended",
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => State::Running,
            1 => State::PreSuspend,
            2 => State::Suspending,
            _ => State::Suspended,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Lock-free holder of the controller-wide [`State`].
pub(crate) struct StateCell {
    raw: AtomicU8,
}

impl StateCell {
    pub(crate) fn new(initial: State) -> Self {
        Self {
            raw: AtomicU8::new(initial as u8),
        }
    }

    #[inline]
    pub(crate) fn get(&self) -> State {
        State::from_u8(self.raw.load(Ordering::Acquire))
    }

    #[inline]
    pub(crate) fn set(&self, state: State) {
        self.raw.store(state as u8, Ordering::Release);
    }

    /// Moves `from → to` only if the current state is `from`.
    ///
    /// Returns the observed state on failure.
    #[inline]
    pub(crate) fn transition(&self, from: State, to: State) -> Result<(), State> {
        self.raw
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(State::from_u8)
    }
}
