//! # Activity registry: priority index + activity groups.
//!
//! ```text
//! index:  DashMap<ActivityKey, Priority>     (identity → group, never iterated by phase runs)
//! groups: [ActivityGroup; Priority::LEVELS]  (copy-on-write member lists, snapshot per run)
//! ```
//!
//! ## Rules
//! - An activity is in at most one group at a time.
//! - Registering a tracked activity again is a no-op (its priority is not changed).
//! - Index and group are updated while holding the index entry, so a concurrent
//!   register/unregister of the same activity cannot interleave between them.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::activities::{ActivityRef, Priority};
use crate::core::phase::ActivityGroup;

/// Identity key of an activity (address of its `Arc` allocation).
///
/// Stable while the activity is registered: the group holds a strong reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct ActivityKey(usize);

impl ActivityKey {
    fn of(activity: &ActivityRef) -> Self {
        Self(Arc::as_ptr(activity) as *const () as usize)
    }
}

/// Registered activities, by identity and by priority.
pub(crate) struct Registry {
    index: DashMap<ActivityKey, Priority>,
    groups: Vec<ActivityGroup>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            index: DashMap::new(),
            groups: Priority::all().map(ActivityGroup::new).collect(),
        }
    }

    /// Tracks `activity` under `priority`.
    ///
    /// Returns `false` if the activity was already tracked (nothing changes).
    pub(crate) fn insert(&self, activity: &ActivityRef, priority: Priority) -> bool {
        match self.index.entry(ActivityKey::of(activity)) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                self.groups[priority.index()].push(activity);
                slot.insert(priority);
                true
            }
        }
    }

    /// Forgets `activity`.
    ///
    /// Returns the priority it was tracked under, if any.
    pub(crate) fn remove(&self, activity: &ActivityRef) -> Option<Priority> {
        match self.index.entry(ActivityKey::of(activity)) {
            Entry::Vacant(_) => None,
            Entry::Occupied(slot) => {
                let priority = *slot.get();
                self.groups[priority.index()].remove(activity);
                slot.remove();
                Some(priority)
            }
        }
    }

    /// Priority of a tracked activity.
    pub(crate) fn priority_of(&self, activity: &ActivityRef) -> Option<Priority> {
        self.index.get(&ActivityKey::of(activity)).map(|p| *p)
    }

    /// Number of tracked activities.
    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    /// Groups in priority order (`FIRST` first). Reverse for resume.
    pub(crate) fn groups(&self) -> std::slice::Iter<'_, ActivityGroup> {
        self.groups.iter()
    }
}
