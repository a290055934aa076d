//! Error types used by the suspend controller and its activities.
//!
//! This module defines three error enums:
//!
//! - [`ActivityError`]: errors raised by a single activity phase call.
//! - [`SuspendError`]: errors delivered through a suspend/resume [`Completion`](crate::Completion).
//! - [`RegisterError`]: errors raised synchronously by activity registration.
//!
//! All of them provide helper methods (`as_label`, `as_message`) for logging/metrics.
//! `ActivityError` and `SuspendError` are `Clone`: one completion is shared by
//! every waiter, so each of them receives its own copy of the same error.

use std::time::Duration;
use thiserror::Error;

use crate::activities::Priority;

/// # Errors produced by an activity phase call.
///
/// Returned by [`Activity::prepare`](crate::Activity::prepare),
/// [`Activity::suspend`](crate::Activity::suspend) and
/// [`Activity::resume`](crate::Activity::resume), or synthesized by the
/// controller when a phase call panics.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActivityError {
    /// The phase call failed.
    #[error("activity failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The phase call panicked instead of returning a result.
    #[error("activity panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text (when it was a string).
        info: String,
    },

    /// The activity observed the advisory cancellation token and gave up.
    #[error("activity cancelled")]
    Canceled,
}

impl ActivityError {
    /// Shorthand for [`ActivityError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        ActivityError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use suspendvisor::ActivityError;
    ///
    /// assert_eq!(ActivityError::fail("boom").as_label(), "activity_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ActivityError::Fail { .. } => "activity_failed",
            ActivityError::Panicked { .. } => "activity_panicked",
            ActivityError::Canceled => "activity_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ActivityError::Fail { error } => format!("error: {error}"),
            ActivityError::Panicked { info } => format!("panic: {info}"),
            ActivityError::Canceled => "cancelled".to_string(),
        }
    }
}

/// # Errors delivered through a suspend or resume completion.
///
/// `Aborted` and `Canceled` are cancellation-flavored: they mean "this suspend
/// attempt did not complete", not "something unexpected broke".
/// See [`SuspendError::is_cancellation`].
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SuspendError {
    /// An activity failed its prepare phase; the suspend attempt was abandoned
    /// before any suspend phase call was made.
    #[error("suspend aborted during prepare: {source}")]
    Aborted {
        /// The failure reported by the activity.
        source: ActivityError,
    },

    /// An activity failed its suspend phase.
    #[error("suspend phase failed: {source}")]
    SuspendFailed {
        /// The failure reported by the activity.
        source: ActivityError,
    },

    /// An activity failed its resume phase.
    #[error("resume phase failed: {source}")]
    ResumeFailed {
        /// The failure reported by the activity.
        source: ActivityError,
    },

    /// The suspend attempt was superseded by a resume (or a reset) before it finished.
    #[error("suspend cancelled")]
    Canceled,

    /// The caller-applied timeout elapsed before the completion resolved.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout that elapsed.
        timeout: Duration,
    },
}

impl SuspendError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use suspendvisor::SuspendError;
    ///
    /// assert_eq!(SuspendError::Canceled.as_label(), "suspend_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SuspendError::Aborted { .. } => "suspend_aborted",
            SuspendError::SuspendFailed { .. } => "suspend_failed",
            SuspendError::ResumeFailed { .. } => "resume_failed",
            SuspendError::Canceled => "suspend_canceled",
            SuspendError::Timeout { .. } => "completion_timeout",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SuspendError::Aborted { source } => format!("aborted: {}", source.as_message()),
            SuspendError::SuspendFailed { source } => format!("suspend: {}", source.as_message()),
            SuspendError::ResumeFailed { source } => format!("resume: {}", source.as_message()),
            SuspendError::Canceled => "cancelled".to_string(),
            SuspendError::Timeout { timeout } => format!("timeout: {timeout:?}"),
        }
    }

    /// Indicates whether the error means "the suspend attempt did not complete"
    /// rather than an activity fault.
    ///
    /// Returns `true` for [`SuspendError::Aborted`] and [`SuspendError::Canceled`].
    ///
    /// # Example
    /// ```
    /// use suspendvisor::{ActivityError, SuspendError};
    ///
    /// let aborted = SuspendError::Aborted { source: ActivityError::fail("busy") };
    /// assert!(aborted.is_cancellation());
    ///
    /// let failed = SuspendError::SuspendFailed { source: ActivityError::fail("io") };
    /// assert!(!failed.is_cancellation());
    /// ```
    pub fn is_cancellation(&self) -> bool {
        matches!(self, SuspendError::Aborted { .. } | SuspendError::Canceled)
    }

    /// Returns the activity failure behind this error, if any.
    pub fn activity_error(&self) -> Option<&ActivityError> {
        match self {
            SuspendError::Aborted { source }
            | SuspendError::SuspendFailed { source }
            | SuspendError::ResumeFailed { source } => Some(source),
            SuspendError::Canceled | SuspendError::Timeout { .. } => None,
        }
    }
}

/// # Errors produced by activity registration.
///
/// Raised synchronously by the registration call, never through a completion.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegisterError {
    /// Priority level outside `[Priority::FIRST, Priority::LAST]`.
    #[error("invalid priority {level}; expected {first}..={last}")]
    InvalidPriority {
        /// The rejected level.
        level: u8,
        /// Lowest accepted level.
        first: u8,
        /// Highest accepted level.
        last: u8,
    },

    /// The activity joined a controller that was not running, and its
    /// catch-up suspend call failed. The activity stays registered.
    #[error("late registration suspend failed for '{activity}': {source}")]
    LateSuspend {
        /// Name of the activity.
        activity: String,
        /// The failure reported by the activity.
        source: ActivityError,
    },
}

impl RegisterError {
    /// Builds [`RegisterError::InvalidPriority`] for `level`.
    pub(crate) fn invalid_priority(level: u8) -> Self {
        RegisterError::InvalidPriority {
            level,
            first: Priority::FIRST.level(),
            last: Priority::LAST.level(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use suspendvisor::Priority;
    ///
    /// let err = Priority::new(42).unwrap_err();
    /// assert_eq!(err.as_label(), "register_invalid_priority");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RegisterError::InvalidPriority { .. } => "register_invalid_priority",
            RegisterError::LateSuspend { .. } => "register_late_suspend",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RegisterError::InvalidPriority { level, first, last } => {
                format!("priority {level} outside {first}..={last}")
            }
            RegisterError::LateSuspend { activity, source } => {
                format!("late suspend of {activity}: {}", source.as_message())
            }
        }
    }
}
