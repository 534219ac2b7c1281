//! Reconnect Proxy - transparent auto-reconnect for database client handles
//!
//! Wrapping a connection in a [`ReconnectProxy`] makes every operation on it,
//! and on the databases and collections reached through it, retry when the
//! cluster reports a transient `AutoReconnect` failure during failover.

pub mod classifier;
mod config;
pub mod logging;
pub mod proxy;
pub mod retry;

pub use classifier::{DEFAULT_ROOTS, OperationSet};
pub use config::{ConfigError, ProxyConfig, RetryConfig};
pub use proxy::{BoundOperation, ProxyBuilder, ReconnectProxy, wrap};
pub use retry::{BackoffStrategy, RetryPolicy, Transient};
