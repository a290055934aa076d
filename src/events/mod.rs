//! Controller events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the suspend controller and the
//! subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `SuspendController` (suspend/resume transitions, registration),
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: `SubscriberSet` (fans out to listeners) and raw receivers
//!   from [`SuspendController::subscribe`](crate::SuspendController::subscribe).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
