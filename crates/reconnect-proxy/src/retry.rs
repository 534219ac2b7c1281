//! Bounded retry with exponential backoff
//!
//! Calls failing with a transient error are retried a fixed number of
//! times, sleeping `unit * base^attempt` between attempts, before a final
//! attempt whose outcome is returned unchanged.
//!
//! # Example
//!
//! ```
//! use reconnect_proxy::retry::{BackoffStrategy, RecordingSleeper, RetryPolicy};
//! use reconnect_core::DriverError;
//!
//! let sleeper = RecordingSleeper::new();
//! let policy = RetryPolicy::new(4, BackoffStrategy::default()).with_sleeper(sleeper.clone());
//!
//! let mut failures = 2;
//! let result = policy.run("find", || {
//!     if failures > 0 {
//!         failures -= 1;
//!         return Err(DriverError::AutoReconnect("failover".into()));
//!     }
//!     Ok("found")
//! });
//!
//! assert_eq!(result, Ok("found"));
//! assert_eq!(sleeper.delays().len(), 2);
//! ```

mod backoff;
mod policy;
mod sleep;


pub use backoff::BackoffStrategy;
pub use policy::{DEFAULT_MAX_RETRIES, RetryPolicy, Transient};
pub use sleep::{RecordingSleeper, Sleeper, ThreadSleeper};
