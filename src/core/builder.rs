use std::sync::Arc;

use crate::{
    core::{config::ControllerConfig, controller::SuspendController},
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`SuspendController`].
pub struct ControllerBuilder {
    cfg: ControllerConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl ControllerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: ControllerConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets the initial event listeners.
    ///
    /// Listeners receive controller events (suspend lifecycle, registration)
    /// through dedicated workers with bounded queues. More can be added later
    /// with [`SuspendController::add_listener`].
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the controller.
    ///
    /// Spawns one worker per listener, so with listeners this must run inside
    /// a tokio runtime.
    pub fn build(self) -> Arc<SuspendController> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = SubscriberSet::new(
            self.subscribers,
            bus.clone(),
            self.cfg.subscriber_queue_override(),
        );
        Arc::new(SuspendController::new_internal(self.cfg, subs, bus))
    }
}
