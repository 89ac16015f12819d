//! Rule thresholds.

/// Thresholds used by the built-in rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleConfig {
    /// Fewest confirmed dogs a practice may run with.
    pub min_confirmed_dogs: usize,
    /// How many months ahead a practice may be scheduled.
    pub horizon_months: u32,
}

impl RuleConfig {
    /// Creates the default thresholds.
    pub fn new() -> Self {
        Self {
            min_confirmed_dogs: 4,
            horizon_months: 3,
        }
    }

    /// Sets the minimum number of confirmed dogs.
    pub fn with_min_confirmed_dogs(mut self, min: usize) -> Self {
        self.min_confirmed_dogs = min;
        self
    }

    /// Sets the scheduling horizon.
    pub fn with_horizon_months(mut self, months: u32) -> Self {
        self.horizon_months = months;
        self
    }
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self::new()
    }
}
