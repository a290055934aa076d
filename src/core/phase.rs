//! # Phase executor: ordered groups, concurrent members.
//!
//! Runs one [`Phase`] over a sequence of [`ActivityGroup`]s.
//!
//! ```text
//! for group in groups (in the given order):
//!   ├─► snapshot members            (later register/unregister not observed)
//!   ├─► empty? ──► next group       (no token, no spawn)
//!   ├─► group_token = run_token.child_token()
//!   ├─► for member: child = group_token.child_token()
//!   │               spawn(call(member, child))
//!   └─► barrier:
//!         all Ok           ──► next group
//!         first Err/panic  ──► group_token.cancel(), return Failed
//!         run_token fired  ──► group_token.cancel(), return Canceled
//! ```
//!
//! ## Rules
//! - A later group never starts before every member of the previous group completed.
//! - Members of one group have no relative ordering.
//! - Tokens are created **before** the member call is spawned.
//! - Cancellation is advisory: abandoned calls keep running detached, they are
//!   only no longer awaited.
//! - A panic in a member call counts as that member failing.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::activities::{ActivityRef, Priority};
use crate::error::ActivityError;

/// Named step applied to every member of a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// First suspend step.
    Prepare,
    /// Second suspend step.
    Suspend,
    /// The only resume step.
    Resume,
}

impl Phase {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            Phase::Prepare => "prepare",
            Phase::Suspend => "suspend",
            Phase::Resume => "resume",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Members of one priority level.
///
/// Copy-on-write: mutations swap in a new vector, a phase run iterates the
/// vector it loaded.
pub(crate) struct ActivityGroup {
    priority: Priority,
    members: ArcSwap<Vec<ActivityRef>>,
}

impl ActivityGroup {
    pub(crate) fn new(priority: Priority) -> Self {
        Self {
            priority,
            members: ArcSwap::from_pointee(Vec::new()),
        }
    }

    #[inline]
    pub(crate) fn priority(&self) -> Priority {
        self.priority
    }

    /// Current members, immune to concurrent mutation.
    #[inline]
    pub(crate) fn snapshot(&self) -> Arc<Vec<ActivityRef>> {
        self.members.load_full()
    }

    pub(crate) fn push(&self, activity: &ActivityRef) {
        self.members.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(Arc::clone(activity));
            next
        });
    }

    pub(crate) fn remove(&self, activity: &ActivityRef) {
        self.members.rcu(|current| {
            current
                .iter()
                .filter(|m| !same_activity(m, activity))
                .cloned()
                .collect::<Vec<_>>()
        });
    }
}

/// Identity comparison (allocation address, vtable ignored).
#[inline]
pub(crate) fn same_activity(a: &ActivityRef, b: &ActivityRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Why a phase run stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PhaseFailure {
    /// The run token was cancelled.
    Canceled,
    /// A member failed (or panicked).
    Failed {
        activity: String,
        priority: Priority,
        error: ActivityError,
    },
}

/// Future returned by a phase call.
pub(crate) type PhaseCall = BoxFuture<'static, Result<(), ActivityError>>;

/// Runs `call` over `groups` in iteration order.
///
/// `call` must only build the future; any work (including a synchronous panic)
/// happens when the returned future is polled inside its spawned task.
pub(crate) async fn run_phase<'a, I, F>(
    groups: I,
    phase: Phase,
    token: &CancellationToken,
    call: F,
) -> Result<(), PhaseFailure>
where
    I: IntoIterator<Item = &'a ActivityGroup>,
    F: Fn(ActivityRef, CancellationToken) -> PhaseCall,
{
    for group in groups {
        if token.is_cancelled() {
            return Err(PhaseFailure::Canceled);
        }

        let members = group.snapshot();
        if members.is_empty() {
            continue;
        }

        debug!(
            phase = phase.as_label(),
            priority = group.priority().level(),
            members = members.len(),
            "running group"
        );
        run_group(&members, group.priority(), token, &call).await?;
    }
    Ok(())
}

/// Fans out over one group snapshot and waits for the barrier.
async fn run_group<F>(
    members: &[ActivityRef],
    priority: Priority,
    token: &CancellationToken,
    call: &F,
) -> Result<(), PhaseFailure>
where
    F: Fn(ActivityRef, CancellationToken) -> PhaseCall,
{
    let group_token = token.child_token();
    let mut pending = FuturesUnordered::new();

    for activity in members {
        let child = group_token.child_token();
        let name = activity.name().to_string();
        let handle = tokio::spawn(call(Arc::clone(activity), child));
        pending.push(async move { (name, handle.await) });
    }

    let outcome = loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break Err(PhaseFailure::Canceled),
            next = pending.next() => match next {
                None => break Ok(()),
                Some((_, Ok(Ok(())))) => continue,
                Some((activity, Ok(Err(error)))) => {
                    break Err(PhaseFailure::Failed { activity, priority, error });
                }
                Some((activity, Err(join))) => {
                    let info = if join.is_panic() {
                        panic_info(join.into_panic())
                    } else {
                        "task aborted".to_string()
                    };
                    break Err(PhaseFailure::Failed {
                        activity,
                        priority,
                        error: ActivityError::Panicked { info },
                    });
                }
            },
        }
    };

    if outcome.is_err() {
        group_token.cancel();
    }
    outcome
}

/// Renders a panic payload as text.
pub(crate) fn panic_info(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
