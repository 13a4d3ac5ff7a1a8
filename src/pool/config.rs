//! Pool configuration.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use hostpool::PoolConfig;
//!
//! let config = PoolConfig::new()
//!     .with_connections_per_host(4)
//!     .with_retries(2)
//!     .with_timeout(Duration::from_secs(5));
//!
//! assert!(config.validate().is_ok());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default number of connections opened per host.
pub const DEFAULT_CONNECTIONS_PER_HOST: usize = 1;

/// Default number of retries per connection attempt.
pub const DEFAULT_RETRIES: usize = 10;

/// Default deadline for one reconciliation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// PoolConfig
// ============================================================================

/// Connection pool configuration.
///
/// Deserializes from `{"connectionsPerHost": 2, "retries": 3, "timeoutMs": 5000}`;
/// missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PoolConfig {
    /// Connections opened for each newly added host.
    pub connections_per_host: usize,

    /// Extra attempts after a failed connection attempt.
    pub retries: usize,

    /// Deadline for adding, removing and sweeping hosts in one update.
    #[serde(rename = "timeoutMs", with = "duration_ms")]
    pub timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl PoolConfig {
    /// Creates a configuration with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connections_per_host: DEFAULT_CONNECTIONS_PER_HOST,
            retries: DEFAULT_RETRIES,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl PoolConfig {
    /// Sets the number of connections per host.
    #[inline]
    #[must_use]
    pub fn with_connections_per_host(mut self, connections_per_host: usize) -> Self {
        self.connections_per_host = connections_per_host;
        self
    }

    /// Sets the number of retries per connection attempt.
    #[inline]
    #[must_use]
    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    /// Sets the reconciliation deadline.
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl PoolConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(Error::config("timeout must be greater than zero"));
        }
        Ok(())
    }

    /// Returns the timeout in whole milliseconds.
    #[inline]
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

// ============================================================================
// Tests
// ============================================================================
