//! # Activity abstractions.
//!
//! This module provides the activity-related types:
//! - [`Activity`] - trait for implementing prepare/suspend/resume phases
//! - [`ActivityFn`] - closure-based activity implementation
//! - [`ActivityRef`] - shared reference to an activity (`Arc<dyn Activity>`)
//! - [`SuspendContext`], [`ResumeContext`] - values forwarded to every phase call
//! - [`Priority`] - execution group an activity belongs to

mod activity;
mod activity_fn;
mod context;
mod priority;

pub use activity::{Activity, ActivityRef};
pub use activity_fn::{ActivityFn, ActivityFnBuilder};
pub use context::{ResumeContext, SuspendContext};
pub use priority::Priority;
