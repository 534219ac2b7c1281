//! Driver-level namespace: constants and free functions

use crate::{DriverError, Result};

/// Ascending index direction
pub const ASCENDING: i32 = 1;

/// Descending index direction
pub const DESCENDING: i32 = -1;

pub const DEFAULT_PORT: u16 = 27017;

/// Version of the client library
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Split a `mongodb://host[:port][/database]` URI into host and port
pub fn parse_uri(uri: &str) -> Result<(String, u16)> {
    let rest = uri
        .strip_prefix("mongodb://")
        .ok_or_else(|| DriverError::InvalidName(format!("unsupported URI scheme: {}", uri)))?;

    let authority = rest.split('/').next().unwrap_or_default();
    // Credentials are not used by the client abstractions
    let authority = authority.rsplit('@').next().unwrap_or_default();

    if authority.is_empty() {
        return Err(DriverError::InvalidName(format!("missing host in URI: {}", uri)));
    }

    match authority.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|_| DriverError::InvalidName(format!("invalid port in URI: {}", uri)))?;
            Ok((host.to_string(), port))
        }
        None => Ok((authority.to_string(), DEFAULT_PORT)),
    }
}
