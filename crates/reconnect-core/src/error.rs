//! Error types raised by database clients

use thiserror::Error;

/// Error type for client operations
///
/// `AutoReconnect` is the only kind a retry layer may treat as transient:
/// the driver raises it while it re-establishes a lost connection to the
/// cluster, and it clears on its own once a new primary is reachable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    #[error("AutoReconnect: {0}")]
    AutoReconnect(String),

    #[error("Connection failure: {0}")]
    ConnectionFailure(String),

    #[error("Operation failure: {0}")]
    OperationFailure(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("'{0}' object is not callable")]
    NotCallable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("{0}")]
    Other(String),
}

impl DriverError {
    /// Whether this error signals a reconnect in progress
    pub fn is_auto_reconnect(&self) -> bool {
        matches!(self, DriverError::AutoReconnect(_))
    }
}

impl From<serde_json::Error> for DriverError {
    fn from(err: serde_json::Error) -> Self {
        DriverError::Serialization(err.to_string())
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, DriverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_auto_reconnect_is_transient() {
        assert!(DriverError::AutoReconnect("primary stepped down".into()).is_auto_reconnect());
        assert!(!DriverError::ConnectionFailure("refused".into()).is_auto_reconnect());
        assert!(!DriverError::OperationFailure("bad query".into()).is_auto_reconnect());
        assert!(!DriverError::Authentication("bad password".into()).is_auto_reconnect());
    }

    #[test]
    fn test_display_keeps_message() {
        let err = DriverError::AutoReconnect("node-2:27017: connection closed".into());
        assert_eq!(err.to_string(), "AutoReconnect: node-2:27017: connection closed");

        let err = DriverError::NotCallable("Collection".into());
        assert_eq!(err.to_string(), "'Collection' object is not callable");
    }
}
