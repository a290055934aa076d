//! # Listeners of controller events.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`] that
//! fans events out to every registered listener.
//!
//! ## Architecture
//! ```text
//! SuspendController ── emit(Event) ──► SubscriberSet ──► [queue L1] ─► worker ─► L1.on_event()
//!        │                                          ├──► [queue L2] ─► worker ─► L2.on_event()
//!        │                                          └──► [queue LN] ─► worker ─► LN.on_event()
//!        └────── publish(Event) ──► Bus ──► raw receivers
//! ```
//!
//! ## Implementing custom listeners
//! ```no_run
//! use suspendvisor::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct Drain;
//!
//! #[async_trait]
//! impl Subscribe for Drain {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::SuspendComplete {
//!             // tell the load balancer we are out...
//!         }
//!     }
//! }
//! ```

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod log;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
