//! # Listener trait
//!
//! `Subscribe` is the extension point for observing suspend transitions. Each
//! listener is driven by a dedicated worker loop fed by a bounded queue owned by
//! the [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow (I/O, retries); they do **not** block the
//!   controller nor other listeners.
//! - Each listener **declares** its preferred queue capacity via
//!   [`Subscribe::queue_capacity`]. If a queue overflows, events for that
//!   listener are **dropped** (warn + `SubscriberOverflow`).

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event listeners.
///
/// Called from a listener-dedicated worker task. Implementations should avoid
/// blocking the async runtime.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this listener.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/events).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this listener's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
