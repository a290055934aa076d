//! # LogWriter: tracing-backed event printer
//!
//! A minimal listener that renders incoming [`Event`]s as `tracing` records
//! under the `suspendvisor::events` target.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO suspendvisor::events: suspend started seq=4
//! WARN suspendvisor::events: suspend failed seq=5 phase="prepare" activity="acceptor" priority=0 reason="busy"
//! INFO suspendvisor::events: suspend cancelled seq=6
//! INFO suspendvisor::events: resume complete seq=7
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

const TARGET: &str = "suspendvisor::events";

/// Event writer listener.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let phase = e.phase.map(|p| p.as_label());
        let priority = e.priority.map(|p| p.level());
        let activity = e.activity.as_deref();
        let reason = e.reason.as_deref();

        match e.kind {
            EventKind::SuspendStarted => {
                info!(target: TARGET, seq = e.seq, "suspend started");
            }
            EventKind::SuspendCancelled => {
                info!(target: TARGET, seq = e.seq, "suspend cancelled");
            }
            EventKind::SuspendComplete => {
                info!(target: TARGET, seq = e.seq, "suspend complete");
            }
            EventKind::SuspendFailed => {
                warn!(target: TARGET, seq = e.seq, ?phase, ?activity, ?priority, ?reason, "suspend failed");
            }
            EventKind::ResumeComplete => {
                info!(target: TARGET, seq = e.seq, "resume complete");
            }
            EventKind::ResumeFailed => {
                warn!(target: TARGET, seq = e.seq, ?activity, ?priority, ?reason, "resume failed");
            }
            EventKind::ActivityRegistered => {
                debug!(target: TARGET, seq = e.seq, ?activity, ?priority, "activity registered");
            }
            EventKind::ActivityUnregistered => {
                debug!(target: TARGET, seq = e.seq, ?activity, ?priority, "activity unregistered");
            }
            EventKind::SubscriberOverflow => {
                warn!(target: TARGET, seq = e.seq, subscriber = ?activity, ?reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                warn!(target: TARGET, seq = e.seq, subscriber = ?activity, ?reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
