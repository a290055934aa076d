//! # Non-blocking event fan-out to a dynamic set of listeners.
//!
//! Provides [`SubscriberSet`], which distributes events to every listener without
//! blocking the emitter, while listeners are added and removed concurrently.
//!
//! ## Architecture
//! ```text
//! emit(event)
//!     │   (load current channel list; never blocks on add/remove)
//!     ├──► [queue 1] ──► worker 1 ──► listener1.on_event()
//!     │    (bounded)         └──────► panic → SubscriberPanicked (bus)
//!     ├──► [queue 2] ──► worker 2 ──► listener2.on_event()
//!     └──► [queue N] ──► worker N ──► listenerN.on_event()
//! ```
//!
//! ## Rules
//! - **Copy-on-write list**: `add`/`remove` swap in a new channel list.
//! - **Identity**: a listener is the `Arc` allocation; adding it twice is a no-op.
//! - **Removal**: drops the listener's queue sender; its worker drains and exits.
//! - **Overflow**: event dropped for that listener only, `SubscriberOverflow` on the bus.
//! - **Per-listener FIFO**; no ordering across listeners.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use arc_swap::ArcSwap;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::warn;

use crate::core::panic_info;
use crate::events::{Bus, Event};
use crate::subscribers::Subscribe;

/// Per-listener queue and worker.
struct SubscriberChannel {
    sub: Arc<dyn Subscribe>,
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

#[inline]
fn same_subscriber(a: &Arc<dyn Subscribe>, b: &Arc<dyn Subscribe>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Fan-out coordinator for event listeners.
///
/// Requires a tokio runtime: each listener gets a spawned worker.
pub struct SubscriberSet {
    channels: ArcSwap<Vec<Arc<SubscriberChannel>>>,
    bus: Bus,
    queue_override: Option<usize>,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker per listener.
    ///
    /// `queue_override` forces every listener's queue capacity; `None` lets
    /// each listener choose via [`Subscribe::queue_capacity`].
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus, queue_override: Option<usize>) -> Self {
        let set = Self {
            channels: ArcSwap::from_pointee(Vec::new()),
            bus,
            queue_override,
        };
        for sub in subs {
            set.add(sub);
        }
        set
    }

    /// Adds a listener. Returns `false` if it was already present.
    pub fn add(&self, sub: Arc<dyn Subscribe>) -> bool {
        if self.contains(&sub) {
            return false;
        }

        let channel = Arc::new(self.spawn_channel(sub));
        let mut added = false;
        self.channels.rcu(|current| {
            let mut next = Vec::clone(current);
            added = !next.iter().any(|c| same_subscriber(&c.sub, &channel.sub));
            if added {
                next.push(Arc::clone(&channel));
            }
            next
        });
        added
    }

    /// Removes a listener. Returns `false` if it was not present.
    ///
    /// Events already queued for it are still delivered.
    pub fn remove(&self, sub: &Arc<dyn Subscribe>) -> bool {
        let previous = self.channels.rcu(|current| {
            current
                .iter()
                .filter(|c| !same_subscriber(&c.sub, sub))
                .cloned()
                .collect::<Vec<_>>()
        });
        previous.iter().any(|c| same_subscriber(&c.sub, sub))
    }

    /// True if `sub` is currently registered.
    pub fn contains(&self, sub: &Arc<dyn Subscribe>) -> bool {
        self.channels
            .load()
            .iter()
            .any(|c| same_subscriber(&c.sub, sub))
    }

    /// Fan-out one event to all listeners (non-blocking).
    ///
    /// If a listener's queue is **full** or **closed**, the event is dropped for it,
    /// a warning is logged and `SubscriberOverflow` is published on the bus.
    pub fn emit(&self, event: &Event) {
        let channels = self.channels.load();
        if channels.is_empty() {
            return;
        }

        let ev = Arc::new(event.clone());
        for channel in channels.iter() {
            let reason = match channel.sender.try_send(Arc::clone(&ev)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            warn!(subscriber = channel.name, reason, seq = ev.seq, "event dropped");
            self.bus
                .publish(Event::subscriber_overflow(channel.name, reason));
        }
    }

    /// Removes every listener and waits until their queues are drained.
    pub async fn close(&self) {
        let previous = self.channels.swap(Arc::new(Vec::new()));
        let workers: Vec<JoinHandle<()>> = previous
            .iter()
            .filter_map(|c| c.worker.lock().take())
            .collect();
        drop(previous);

        for worker in workers {
            let _ = worker.await;
        }
    }

    /// True if there are no listeners.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.load().is_empty()
    }

    /// Number of listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.load().len()
    }

    fn spawn_channel(&self, sub: Arc<dyn Subscribe>) -> SubscriberChannel {
        let cap = self
            .queue_override
            .unwrap_or_else(|| sub.queue_capacity())
            .max(1);
        let name = sub.name();
        let (tx, mut rx) = mpsc::channel::<Arc<Event>>(cap);
        let s = Arc::clone(&sub);
        let bus = self.bus.clone();

        let handle = tokio::spawn(async move {
            while let Some(ev) = rx.recv().await {
                let fut = s.on_event(ev.as_ref());
                if let Err(payload) = AssertUnwindSafe(fut).catch_unwind().await {
                    let info = panic_info(payload);
                    warn!(subscriber = s.name(), info = %info, "subscriber panicked");
                    bus.publish(Event::subscriber_panicked(s.name(), info));
                }
            }
        });

        SubscriberChannel {
            sub,
            name,
            sender: tx,
            worker: Mutex::new(Some(handle)),
        }
    }
}
