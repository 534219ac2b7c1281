//! Proxy configuration
//!
//! Settings are read from TOML. Every field has a default, so an empty
//! document yields the standard behaviour: the classified operation set
//! and four retries with delays of 1, 2, 4 and 8 seconds.
//!
//! ```toml
//! operations = ["find", "insert", "count"]
//!
//! [retry]
//! max_retries = 4
//! base = 2
//! unit_ms = 1000
//! max_delay_ms = 30000
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier::OperationSet;
use crate::retry::{BackoffStrategy, DEFAULT_MAX_RETRIES, RetryPolicy};

/// Errors raised while loading or validating a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level proxy configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Member names to retry; `None` uses the classified default set
    pub operations: Option<Vec<String>>,
    pub retry: RetryConfig,
}

/// Retry loop settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Delayed retries before the final attempt
    pub max_retries: u32,
    /// Exponential growth factor
    pub base: u32,
    /// Delay before the first retry, in milliseconds
    pub unit_ms: u64,
    /// Upper bound for a single delay, in milliseconds
    pub max_delay_ms: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base: 2,
            unit_ms: 1000,
            max_delay_ms: None,
        }
    }
}

impl ProxyConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), "loaded proxy config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.base == 0 {
            return Err(ConfigError::Invalid("retry.base must be at least 1".into()));
        }
        if self.retry.unit_ms == 0 {
            return Err(ConfigError::Invalid(
                "retry.unit_ms must be at least 1".into(),
            ));
        }
        if let Some(max) = self.retry.max_delay_ms
            && max < self.retry.unit_ms
        {
            return Err(ConfigError::Invalid(format!(
                "retry.max_delay_ms ({}) is below retry.unit_ms ({})",
                max, self.retry.unit_ms
            )));
        }

        for name in self.operations.iter().flatten() {
            if name.is_empty() {
                return Err(ConfigError::Invalid("empty operation name".into()));
            }
            if name.starts_with('_') {
                return Err(ConfigError::Invalid(format!(
                    "private member {:?} cannot be an operation",
                    name
                )));
            }
        }
        Ok(())
    }

    /// The configured operation set, or the shared classified one
    pub fn operation_set(&self) -> Arc<OperationSet> {
        match &self.operations {
            Some(names) => Arc::new(OperationSet::from_names(names)),
            None => OperationSet::global(),
        }
    }

    /// A retry policy sleeping on the current thread
    pub fn retry_policy(&self) -> RetryPolicy {
        let mut backoff = BackoffStrategy::new(self.retry.unit_ms, self.retry.base);
        if let Some(max) = self.retry.max_delay_ms {
            backoff = backoff.with_max_delay_ms(max);
        }
        RetryPolicy::new(self.retry.max_retries, backoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = ProxyConfig::from_toml_str("").unwrap();
        assert_eq!(config, ProxyConfig::default());
        assert_eq!(config.retry.max_retries, 4);

        let policy = config.retry_policy();
        assert_eq!(policy.max_retries(), 4);
        assert_eq!(policy.backoff(), &BackoffStrategy::default());
        assert!(Arc::ptr_eq(&config.operation_set(), &OperationSet::global()));
    }

    #[test]
    fn test_partial_retry_table() {
        let config = ProxyConfig::from_toml_str("[retry]\nunit_ms = 10\n").unwrap();
        assert_eq!(config.retry.unit_ms, 10);
        assert_eq!(config.retry.base, 2);

        let backoff = config.retry_policy().backoff().clone();
        assert_eq!(backoff.calculate_delay(3), Duration::from_millis(80));
    }

    #[test]
    fn test_operations_and_cap() {
        let config = ProxyConfig::from_toml_str(
            r#"
            operations = ["find", "count"]

            [retry]
            max_retries = 2
            max_delay_ms = 1500
            "#,
        )
        .unwrap();

        let operations = config.operation_set();
        assert_eq!(operations.iter().collect::<Vec<_>>(), vec!["count", "find"]);

        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(
            policy.backoff().calculate_delay(2),
            Duration::from_millis(1500)
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for source in [
            "[retry]\nbase = 0",
            "[retry]\nunit_ms = 0",
            "[retry]\nunit_ms = 100\nmax_delay_ms = 50",
            "operations = [\"\"]",
            "operations = [\"_private\"]",
        ] {
            let err = ProxyConfig::from_toml_str(source).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{source}: {err}");
        }
    }

    #[test]
    fn test_malformed_toml() {
        let err = ProxyConfig::from_toml_str("retry = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "operations = [\"find\"]").unwrap();

        let config = ProxyConfig::load(file.path()).unwrap();
        assert_eq!(config.operations, Some(vec!["find".to_string()]));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        let err = ProxyConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("missing.toml"));
    }

    #[test]
    fn test_serializes_back_to_toml() {
        let config = ProxyConfig {
            operations: Some(vec!["find".into()]),
            retry: RetryConfig::default(),
        };
        let source = toml::to_string(&config).unwrap();
        assert_eq!(ProxyConfig::from_toml_str(&source).unwrap(), config);
    }
}
