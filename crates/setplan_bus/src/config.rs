//! Bus configuration.

/// Configuration for the event bus.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Buffered events per subscription before new events are dropped.
    pub capacity: usize,
    /// Maximum live subscriptions.
    pub max_subscriptions: usize,
}

impl BusConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            capacity: 256,
            max_subscriptions: 10_000,
        }
    }

    /// Sets the per-subscription buffer capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Sets the maximum number of live subscriptions.
    pub fn with_max_subscriptions(mut self, max: usize) -> Self {
        self.max_subscriptions = max;
        self
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self::new()
    }
}
