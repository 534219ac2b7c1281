//! Transparent auto-reconnect proxy for client handles
//!
//! # Example
//!
//! ```ignore
//! use reconnect_proxy::wrap;
//!
//! let conn = wrap(driver_connection);
//!
//! // Retried with backoff while the cluster elects a new primary
//! let users = conn.database("app")?.collection("users")?;
//! let admins = users.find(&json!({ "role": "admin" }))?;
//! ```

mod handles;
mod wrapper;


pub use wrapper::{BoundOperation, ProxyBuilder, ReconnectProxy, wrap};
