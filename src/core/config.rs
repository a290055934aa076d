//! # Controller configuration.
//!
//! Provides [`ControllerConfig`], the centralized settings for a
//! [`SuspendController`](crate::SuspendController).
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1
//! - `subscriber_queue_capacity = 0` → each subscriber's own [`queue_capacity`](crate::Subscribe::queue_capacity)

use crate::core::state::State;

/// Configuration for the suspend controller.
///
/// ## Field semantics
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
/// - `subscriber_queue_capacity`: Per-subscriber queue override (`0` = subscriber decides)
/// - `initial_state`: State the controller starts in (and the state `reset()` does **not** use)
///
/// ## Notes
/// All fields are public for flexibility. Prefer using helper accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct ControllerConfig {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Raw receivers from [`SuspendController::subscribe`](crate::SuspendController::subscribe)
    /// that lag behind more than `bus_capacity` events receive `Lagged` and skip
    /// older items.
    pub bus_capacity: usize,

    /// Queue capacity applied to every subscriber.
    ///
    /// - `0` = use [`Subscribe::queue_capacity`](crate::Subscribe::queue_capacity)
    /// - `n > 0` = force `n` for all subscribers
    pub subscriber_queue_capacity: usize,

    /// State of a freshly built controller.
    ///
    /// Servers boot suspended and resume once ready, so the default is
    /// [`State::Suspended`]. Embedders without a gated startup may pick
    /// [`State::Running`]. Intermediate states are normalized to `Suspended`.
    pub initial_state: State,
}

impl ControllerConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the per-subscriber queue override as an `Option`.
    ///
    /// - `None` → subscriber decides
    /// - `Some(n)` → forced capacity
    #[inline]
    pub fn subscriber_queue_override(&self) -> Option<usize> {
        if self.subscriber_queue_capacity == 0 {
            None
        } else {
            Some(self.subscriber_queue_capacity)
        }
    }

    /// Returns the initial state, normalized to `Running` or `Suspended`.
    #[inline]
    pub fn initial_state(&self) -> State {
        match self.initial_state {
            State::Running => State::Running,
            _ => State::Suspended,
        }
    }
}

impl Default for ControllerConfig {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `subscriber_queue_capacity = 0` (subscriber decides)
    /// - `initial_state = State::Suspended`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            subscriber_queue_capacity: 0,
            initial_state: State::Suspended,
        }
    }
}
