//! Exponential backoff calculator for reconnect retries

use std::time::Duration;

/// Exponential backoff strategy for reconnect retries.
///
/// The delay before retry `attempt` is `unit * base^attempt`, optionally
/// capped. There is no jitter: every caller waits the same amounts.
///
/// # Example
///
/// ```
/// use reconnect_proxy::BackoffStrategy;
/// use std::time::Duration;
///
/// let backoff = BackoffStrategy::default();
///
/// assert_eq!(backoff.calculate_delay(0), Duration::from_secs(1));
/// assert_eq!(backoff.calculate_delay(1), Duration::from_secs(2));
/// assert_eq!(backoff.calculate_delay(3), Duration::from_secs(8));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffStrategy {
    /// Length of one time unit in milliseconds
    unit_ms: u64,
    /// Growth factor per attempt
    base: u32,
    /// Optional cap in milliseconds
    max_ms: Option<u64>,
}

impl BackoffStrategy {
    /// Create a strategy with the given unit and base.
    ///
    /// `unit_ms` is raised to at least 1ms and `base` to at least 1.
    pub fn new(unit_ms: u64, base: u32) -> Self {
        Self {
            unit_ms: unit_ms.max(1),
            base: base.max(1),
            max_ms: None,
        }
    }

    /// Cap every delay at `max_ms` (never below one unit)
    pub fn with_max_delay_ms(mut self, max_ms: u64) -> Self {
        self.max_ms = Some(max_ms.max(self.unit_ms));
        self
    }

    /// Delay before retry number `attempt` (zero-based)
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let factor = u64::from(self.base).saturating_pow(attempt);
        let delay_ms = self.unit_ms.saturating_mul(factor);

        let capped_ms = match self.max_ms {
            Some(max_ms) => delay_ms.min(max_ms),
            None => delay_ms,
        };

        Duration::from_millis(capped_ms)
    }

    pub fn unit(&self) -> Duration {
        Duration::from_millis(self.unit_ms)
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn max_delay(&self) -> Option<Duration> {
        self.max_ms.map(Duration::from_millis)
    }
}

impl Default for BackoffStrategy {
    /// One-second unit, doubling, uncapped
    fn default() -> Self {
        Self::new(1000, 2)
    }
}
