//! Store configuration.

/// Configuration for the batch applier.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of deltas (or ids) accepted in one batch.
    pub max_batch_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_batch_size: 200,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum batch size.
    #[must_use]
    pub const fn max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        assert_eq!(Config::default().max_batch_size, 200);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new().max_batch_size(5);
        assert_eq!(config.max_batch_size, 5);
    }
}
