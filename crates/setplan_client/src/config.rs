//! Configuration for client sessions.

use std::time::Duration;

/// Configuration for a practice session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Quiet period before a debounced edit is sent.
    pub debounce: Duration,
    /// Capacity of the dispatcher's action queue.
    pub queue_capacity: usize,
}

impl ClientConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            debounce: Duration::from_secs(2),
            queue_capacity: 64,
        }
    }

    /// Sets the debounce window.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Sets the action queue capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.debounce, Duration::from_secs(2));
        assert_eq!(config.queue_capacity, 64);
    }

    #[test]
    fn config_builder() {
        let config = ClientConfig::new()
            .with_debounce(Duration::from_millis(300))
            .with_queue_capacity(0);
        assert_eq!(config.debounce, Duration::from_millis(300));
        assert_eq!(config.queue_capacity, 1);
    }
}
