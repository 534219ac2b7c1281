//! The bounded retry loop

use std::fmt;
use std::sync::Arc;

use reconnect_core::DriverError;

use super::{BackoffStrategy, Sleeper, ThreadSleeper};

/// Number of delayed retries before the final attempt
pub const DEFAULT_MAX_RETRIES: u32 = 4;

/// Errors that may clear up on their own and are safe to retry
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for DriverError {
    fn is_transient(&self) -> bool {
        self.is_auto_reconnect()
    }
}

/// Retry policy for operations that fail with a transient error
///
/// A call is attempted immediately. Each transient failure is logged and
/// followed by a backoff delay, up to `max_retries` times; after that one
/// last attempt is made and its outcome is returned as is. Any other error
/// is returned on first occurrence.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff: BackoffStrategy,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryPolicy {
    /// Create a policy that sleeps on the calling thread
    pub fn new(max_retries: u32, backoff: BackoffStrategy) -> Self {
        Self {
            max_retries,
            backoff,
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    /// Replace the delay primitive
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn backoff(&self) -> &BackoffStrategy {
        &self.backoff
    }

    /// Total number of attempts when every call fails transiently
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Run `call`, retrying transient failures.
    ///
    /// `operation` names the call in log output.
    pub fn run<T, E, F>(&self, operation: &str, mut call: F) -> Result<T, E>
    where
        E: Transient + fmt::Display,
        F: FnMut() -> Result<T, E>,
    {
        for attempt in 0..self.max_retries {
            match call() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() => {
                    let delay = self.backoff.calculate_delay(attempt);
                    tracing::warn!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "AutoReconnecting, try {}",
                        attempt
                    );
                    self.sleeper.sleep(delay);
                }
                Err(err) => return Err(err),
            }
        }

        // Final attempt: its failure goes to the caller untouched
        call()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, BackoffStrategy::default())
    }
}
