//! # Activity priority.
//!
//! A [`Priority`] selects the execution group of an activity. Groups run
//! strictly one after another: ascending (`FIRST` → `LAST`) for prepare and
//! suspend, descending for resume. Activities inside one group run concurrently.

use std::fmt;

use crate::error::RegisterError;

/// Execution group of an activity, in `[Priority::FIRST, Priority::LAST]`.
///
/// Out-of-range values cannot be constructed.
///
/// ## Example
/// ```rust
/// use suspendvisor::Priority;
///
/// let p = Priority::new(3).unwrap();
/// assert!(Priority::FIRST < p && p < Priority::LAST);
/// assert!(Priority::new(10).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(u8);

impl Priority {
    /// Suspended first, resumed last.
    pub const FIRST: Priority = Priority(0);
    /// Suspended last, resumed first.
    pub const LAST: Priority = Priority(9);
    /// Middle of the range; used by [`register_default`](crate::SuspendController::register_default).
    pub const DEFAULT: Priority = Priority(5);
    /// Number of distinct levels (and therefore of activity groups).
    pub const LEVELS: usize = Self::LAST.0 as usize + 1;

    /// Validates `level` against the accepted range.
    pub fn new(level: u8) -> Result<Self, RegisterError> {
        if level <= Self::LAST.0 {
            Ok(Priority(level))
        } else {
            Err(RegisterError::invalid_priority(level))
        }
    }

    /// Raw level.
    #[inline]
    pub const fn level(self) -> u8 {
        self.0
    }

    /// Index of this priority's group.
    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }

    /// All priorities, `FIRST` to `LAST`.
    pub fn all() -> impl DoubleEndedIterator<Item = Priority> + ExactSizeIterator {
        (Self::FIRST.0..=Self::LAST.0).map(Priority)
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u8> for Priority {
    type Error = RegisterError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Priority::new(level)
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> Self {
        p.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
