//! Type-safe identifiers for pool entities.
//!
//! | Type | Identifies |
//! |------|------------|
//! | [`HostDescription`] | A network endpoint (host + port) |
//! | [`ConnectionId`] | One physical connection, for log correlation |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::{Error, Result};

// ============================================================================
// HostDescription
// ============================================================================

/// Network endpoint identifier.
///
/// Equality and hashing are structural, so two descriptions with the same
/// host and port are the same pool key.
///
/// # Example
///
/// ```
/// use hostpool::HostDescription;
///
/// let host: HostDescription = "db1.local:8529".parse().unwrap();
/// assert_eq!(host, HostDescription::new("db1.local", 8529));
/// assert_eq!(host.to_string(), "db1.local:8529");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HostDescription {
    host: String,
    port: u16,
}

impl HostDescription {
    /// Creates a host description.
    #[inline]
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Creates a host description from a URL.
    ///
    /// Uses the scheme's default port when the URL has none.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the URL has no host or no
    /// resolvable port.
    pub fn from_url(url: &Url) -> Result<Self> {
        let host = url
            .host_str()
            .ok_or_else(|| Error::invalid_argument(format!("URL has no host: {url}")))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| Error::invalid_argument(format!("URL has no port: {url}")))?;

        let host = host.trim_start_matches('[').trim_end_matches(']');
        Ok(Self::new(host, port))
    }

    /// Returns the host name or address.
    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[inline]
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for HostDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for HostDescription {
    type Err = Error;

    /// Parses `host:port`, with IPv6 hosts in brackets (`[::1]:8529`).
    fn from_str(s: &str) -> Result<Self> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| Error::invalid_argument(format!("expected host:port, got '{s}'")))?;

        let host = match host.strip_prefix('[') {
            Some(inner) => inner
                .strip_suffix(']')
                .ok_or_else(|| Error::invalid_argument(format!("unbalanced brackets in '{s}'")))?,
            None if host.contains([':', ']']) => {
                return Err(Error::invalid_argument(format!(
                    "IPv6 host must be bracketed in '{s}'"
                )));
            }
            None => host,
        };
        if host.is_empty() {
            return Err(Error::invalid_argument(format!("empty host in '{s}'")));
        }

        let port = port
            .parse::<u16>()
            .map_err(|e| Error::invalid_argument(format!("invalid port in '{s}': {e}")))?;

        Ok(Self::new(host, port))
    }
}

// ============================================================================
// ConnectionId
// ============================================================================

/// Unique identifier of one physical connection.
///
/// Only used to correlate log lines; carries no routing meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generates a new random connection ID.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[inline]
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use rustc_hash::FxHashSet;

    #[test]
    fn test_parse_host_port() -> anyhow::Result<()> {
        let host: HostDescription = "localhost:8529".parse()?;
        assert_eq!(host.host(), "localhost");
        assert_eq!(host.port(), 8529);
        Ok(())
    }

    #[test]
    fn test_parse_ipv6() -> anyhow::Result<()> {
        let host: HostDescription = "[::1]:8529".parse()?;
        assert_eq!(host.host(), "::1");
        assert_eq!(host.to_string(), "[::1]:8529");
        Ok(())
    }

    #[test]
    fn test_parse_rejects_missing_port() {
        let result = "localhost".parse::<HostDescription>();
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn test_parse_rejects_bad_port() {
        assert!("localhost:http".parse::<HostDescription>().is_err());
        assert!("localhost:70000".parse::<HostDescription>().is_err());
        assert!(":8529".parse::<HostDescription>().is_err());
    }

    #[test]
    fn test_parse_rejects_unbracketed_ipv6() {
        for input in ["a:b:8529", "::1:8529", "::1]:8529"] {
            let result = input.parse::<HostDescription>();
            assert!(
                matches!(result, Err(Error::InvalidArgument { .. })),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rejects_unbalanced_brackets() {
        assert!("[::1:8529".parse::<HostDescription>().is_err());
        assert!("[]:8529".parse::<HostDescription>().is_err());
    }

    #[test]
    fn test_display_parse_agree_for_ipv6() -> anyhow::Result<()> {
        let host = HostDescription::new("fe80::1", 8530);
        let parsed: HostDescription = host.to_string().parse()?;
        assert_eq!(parsed, host);
        Ok(())
    }

    #[test]
    fn test_from_url_default_port() -> anyhow::Result<()> {
        let url = Url::parse("https://coordinator.example.com/_db/test")?;
        let host = HostDescription::from_url(&url)?;
        assert_eq!(host, HostDescription::new("coordinator.example.com", 443));
        Ok(())
    }

    #[test]
    fn test_from_url_explicit_port() -> anyhow::Result<()> {
        let url = Url::parse("http://10.0.0.5:8530")?;
        let host = HostDescription::from_url(&url)?;
        assert_eq!(host, HostDescription::new("10.0.0.5", 8530));
        Ok(())
    }

    #[test]
    fn test_structural_equality_and_hash() -> anyhow::Result<()> {
        let mut set = FxHashSet::default();
        set.insert(HostDescription::new("a", 1));
        set.insert("a:1".parse()?);
        set.insert(HostDescription::new("a", 2));
        assert_eq!(set.len(), 2);
        Ok(())
    }

    #[test]
    fn test_connection_id_unique() {
        assert_ne!(ConnectionId::generate(), ConnectionId::generate());
    }
}
