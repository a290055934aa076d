//! Runtime core: state machine, registry and phase runs.
//!
//! The public entry point is [`SuspendController`], built via [`ControllerBuilder`].
//!
//! Internal modules:
//! - [`state`]: the four-state machine and its atomic cell;
//! - [`registry`]: identity index plus one copy-on-write group per priority;
//! - [`phase`]: runs one phase over groups in order, members concurrently;
//! - [`completion`]: shared completion handles and the active suspend attempt;
//! - [`controller`]: composes phase runs into suspend/resume;
//! - [`config`]: controller configuration.

mod builder;
mod completion;
mod config;
mod controller;
mod phase;
mod registry;
mod state;

pub use builder::ControllerBuilder;
pub use completion::{ActiveSuspend, Completion, Outcome};
pub use config::ControllerConfig;
pub use controller::SuspendController;
pub use phase::Phase;
pub use state::State;

pub(crate) use phase::panic_info;
