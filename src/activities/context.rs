//! # Phase contexts.
//!
//! [`SuspendContext`] is forwarded to every `prepare` and `suspend` call of one
//! suspend attempt; [`ResumeContext`] to every `resume` call. The controller
//! never inspects them.

/// Context of a suspend attempt.
///
/// ## Example
/// ```rust
/// use suspendvisor::SuspendContext;
///
/// let ctx = SuspendContext::new().with_stopping(true);
/// assert!(ctx.is_stopping());
/// assert!(!ctx.is_starting());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SuspendContext {
    starting: bool,
    stopping: bool,
}

impl SuspendContext {
    /// A plain suspend: the server is neither booting nor shutting down.
    pub const fn new() -> Self {
        Self {
            starting: false,
            stopping: false,
        }
    }

    /// Marks a suspend issued while the server is still booting.
    pub const fn with_starting(mut self, starting: bool) -> Self {
        self.starting = starting;
        self
    }

    /// Marks a suspend that precedes process shutdown.
    pub const fn with_stopping(mut self, stopping: bool) -> Self {
        self.stopping = stopping;
        self
    }

    /// True if the server is booting.
    pub const fn is_starting(&self) -> bool {
        self.starting
    }

    /// True if the server will stop once suspended.
    pub const fn is_stopping(&self) -> bool {
        self.stopping
    }
}

/// Context of a resume run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResumeContext {
    starting: bool,
}

impl ResumeContext {
    /// A plain resume of a previously running server.
    pub const fn new() -> Self {
        Self { starting: false }
    }

    /// Marks the resume that completes server boot.
    pub const fn with_starting(mut self, starting: bool) -> Self {
        self.starting = starting;
        self
    }

    /// True if this resume completes server boot.
    pub const fn is_starting(&self) -> bool {
        self.starting
    }
}
