//! Cookie record exchanged with cookie-bearing transports.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// `max_age` value marking a session cookie.
pub const SESSION_MAX_AGE: i64 = -1;

fn session_max_age() -> i64 {
    SESSION_MAX_AGE
}

// ============================================================================
// Cookie
// ============================================================================

/// Transport-level cookie.
///
/// Identity is `(name, domain, path)`; see [`Cookie::key`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Domain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Lifetime in seconds. Negative for session cookies.
    #[serde(rename = "maxAge", default = "session_max_age")]
    pub max_age: i64,
}

/// Identity of a cookie inside a jar.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CookieKey {
    /// Cookie name.
    pub name: String,
    /// Domain.
    pub domain: Option<String>,
    /// Path.
    pub path: Option<String>,
}

impl Cookie {
    /// Creates a new session cookie with name and value.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            max_age: SESSION_MAX_AGE,
        }
    }

    /// Sets the domain.
    #[inline]
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets the path.
    #[inline]
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the lifetime in seconds.
    #[inline]
    #[must_use]
    pub fn with_max_age(mut self, max_age: i64) -> Self {
        self.max_age = max_age;
        self
    }

    /// Returns `true` for session cookies, which never expire by age.
    #[inline]
    #[must_use]
    pub fn is_session(&self) -> bool {
        self.max_age < 0
    }

    /// Returns the lifetime, or `None` for session cookies.
    #[inline]
    #[must_use]
    pub fn lifetime(&self) -> Option<Duration> {
        u64::try_from(self.max_age).ok().map(Duration::from_secs)
    }

    /// Returns the identity of this cookie.
    #[must_use]
    pub fn key(&self) -> CookieKey {
        CookieKey {
            name: self.name.clone(),
            domain: self.domain.clone(),
            path: self.path.clone(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_session() {
        let cookie = Cookie::new("arango_sid", "abc");
        assert!(cookie.is_session());
        assert_eq!(cookie.lifetime(), None);
    }

    #[test]
    fn test_lifetime() {
        let cookie = Cookie::new("a", "1").with_max_age(30);
        assert!(!cookie.is_session());
        assert_eq!(cookie.lifetime(), Some(Duration::from_secs(30)));
        assert_eq!(
            Cookie::new("a", "1").with_max_age(0).lifetime(),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn test_key_ignores_value_and_age() {
        let a = Cookie::new("sid", "1").with_path("/").with_max_age(10);
        let b = Cookie::new("sid", "2").with_path("/");
        let c = Cookie::new("sid", "1").with_path("/other");

        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
    }

    #[test]
    fn test_serde_defaults_to_session() -> anyhow::Result<()> {
        let cookie: Cookie = serde_json::from_str(r#"{"name":"a","value":"1"}"#)?;
        assert!(cookie.is_session());

        let json = serde_json::to_string(&cookie.with_max_age(5))?;
        assert!(json.contains(r#""maxAge":5"#));
        assert!(!json.contains("domain"));
        Ok(())
    }
}
