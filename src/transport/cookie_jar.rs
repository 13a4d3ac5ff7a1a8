//! Per-connection cookie cache.
//!
//! A [`CookieJar`] belongs to exactly one connection event loop. It has no
//! internal locking: every method takes `&mut self`, and the jar is never
//! handed to another task.
//!
//! # Expiry
//!
//! An entry is dropped once `now > last_written + max_age`. Session cookies
//! (`max_age < 0`) never expire here; they live until [`CookieJar::clear`].

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::protocol::{Cookie, CookieKey, Request, Response};

// ============================================================================
// Carrier Traits
// ============================================================================

/// Outgoing message that can carry cookies.
pub trait CookieRequest {
    /// Attaches a cookie.
    fn add_cookie(&mut self, cookie: Cookie);
}

/// Incoming message that may set cookies.
pub trait CookieResponse {
    /// Returns the cookies set by the peer.
    fn cookies(&self) -> &[Cookie];
}

impl CookieRequest for Request {
    fn add_cookie(&mut self, cookie: Cookie) {
        self.cookies.push(cookie);
    }
}

impl CookieResponse for Response {
    fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }
}

// ============================================================================
// CookieEntry
// ============================================================================

#[derive(Debug, Clone)]
struct CookieEntry {
    cookie: Cookie,
    written_at: Instant,
}

impl CookieEntry {
    fn is_expired(&self, now: Instant) -> bool {
        match self.cookie.lifetime() {
            Some(lifetime) => self
                .written_at
                .checked_add(lifetime)
                .is_some_and(|deadline| now > deadline),
            None => false,
        }
    }
}

// ============================================================================
// CookieJar
// ============================================================================

/// Cookie cache for one connection.
#[derive(Debug, Default)]
pub struct CookieJar {
    cookies: FxHashMap<CookieKey, CookieEntry>,
}

impl CookieJar {
    /// Creates an empty jar.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Purges expired entries, then attaches every remaining cookie.
    pub fn prepare_outgoing<R: CookieRequest>(&mut self, request: R) -> R {
        self.prepare_outgoing_at(request, Instant::now())
    }

    /// Stores every cookie of `response`, resetting its expiry baseline.
    pub fn absorb_incoming<R: CookieResponse + ?Sized>(&mut self, response: &R) {
        self.absorb_incoming_at(response, Instant::now());
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.cookies.clear();
    }

    /// Returns the number of stored entries, expired or not.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Returns `true` if the jar holds no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub(crate) fn prepare_outgoing_at<R: CookieRequest>(&mut self, mut request: R, now: Instant) -> R {
        self.remove_expired(now);

        for entry in self.cookies.values() {
            trace!(name = %entry.cookie.name, "Sending cookie");
            request.add_cookie(entry.cookie.clone());
        }

        request
    }

    pub(crate) fn absorb_incoming_at<R: CookieResponse + ?Sized>(&mut self, response: &R, now: Instant) {
        for cookie in response.cookies() {
            debug!(name = %cookie.name, max_age = cookie.max_age, "Saving cookie");
            self.cookies.insert(
                cookie.key(),
                CookieEntry {
                    cookie: cookie.clone(),
                    written_at: now,
                },
            );
        }
    }

    fn remove_expired(&mut self, now: Instant) {
        let before = self.cookies.len();
        self.cookies.retain(|_, entry| !entry.is_expired(now));

        let removed = before - self.cookies.len();
        if removed > 0 {
            debug!(removed, "Removed expired cookies");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use proptest::prelude::*;

    use crate::protocol::RequestType;

    fn request() -> Request {
        Request::new("_system", RequestType::Get, "/_api/version")
    }

    fn names(request: &Request) -> Vec<String> {
        let mut names: Vec<String> = request.cookies.iter().map(|c| c.name.clone()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_empty_jar_attaches_nothing() {
        let mut jar = CookieJar::new();
        let request = jar.prepare_outgoing(request());
        assert!(request.cookies.is_empty());
        assert!(jar.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_absorb_then_prepare() {
        let mut jar = CookieJar::new();
        let response = Response::new(200)
            .with_cookie(Cookie::new("sid", "1").with_max_age(60))
            .with_cookie(Cookie::new("session", "x"));

        jar.absorb_incoming(&response);
        let request = jar.prepare_outgoing(request());

        assert_eq!(names(&request), vec!["session", "sid"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_cookie_not_sent() {
        let mut jar = CookieJar::new();
        jar.absorb_incoming(&Response::new(200).with_cookie(Cookie::new("sid", "1").with_max_age(10)));

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(jar.prepare_outgoing(request()).cookies.len(), 1);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(jar.prepare_outgoing(request()).cookies.is_empty());
        assert!(jar.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_cookie_never_expires() {
        let mut jar = CookieJar::new();
        jar.absorb_incoming(&Response::new(200).with_cookie(Cookie::new("sid", "1")));

        tokio::time::advance(Duration::from_secs(86_400 * 365)).await;
        assert_eq!(jar.prepare_outgoing(request()).cookies.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_absorb_refreshes_expiry_and_value() {
        let mut jar = CookieJar::new();
        let response = Response::new(200).with_cookie(Cookie::new("sid", "1").with_max_age(10));

        jar.absorb_incoming(&response);
        tokio::time::advance(Duration::from_secs(8)).await;
        jar.absorb_incoming(
            &Response::new(200).with_cookie(Cookie::new("sid", "2").with_max_age(10)),
        );
        tokio::time::advance(Duration::from_secs(8)).await;

        let request = jar.prepare_outgoing(request());
        assert_eq!(request.cookies.len(), 1);
        assert_eq!(request.cookies[0].value, "2");
        assert_eq!(jar.len(), 1);
    }

    #[test]
    fn test_identity_includes_domain_and_path() {
        let mut jar = CookieJar::new();
        let response = Response::new(200)
            .with_cookie(Cookie::new("sid", "1").with_domain("a"))
            .with_cookie(Cookie::new("sid", "2").with_domain("b"))
            .with_cookie(Cookie::new("sid", "3").with_domain("b").with_path("/x"));

        jar.absorb_incoming(&response);
        assert_eq!(jar.len(), 3);
    }

    #[test]
    fn test_clear() {
        let mut jar = CookieJar::new();
        jar.absorb_incoming(&Response::new(200).with_cookie(Cookie::new("sid", "1")));
        jar.clear();
        assert!(jar.is_empty());
        assert!(jar.prepare_outgoing(request()).cookies.is_empty());
    }

    #[test]
    fn test_huge_max_age_does_not_overflow() {
        let mut jar = CookieJar::new();
        jar.absorb_incoming(
            &Response::new(200).with_cookie(Cookie::new("sid", "1").with_max_age(i64::MAX)),
        );
        assert_eq!(jar.prepare_outgoing(request()).cookies.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_attaches_exactly_live_cookies(
            ages in prop::collection::vec(-5i64..20, 1..12),
            elapsed in 0u64..25,
        ) {
            let mut jar = CookieJar::new();
            let start = Instant::now();

            let mut response = Response::new(200);
            for (i, age) in ages.iter().enumerate() {
                response = response.with_cookie(Cookie::new(format!("c{i}"), "v").with_max_age(*age));
            }
            jar.absorb_incoming_at(&response, start);

            let now = start + Duration::from_secs(elapsed);
            let request = jar.prepare_outgoing_at(request(), now);

            for cookie in &request.cookies {
                prop_assert!(cookie.max_age < 0 || elapsed <= cookie.max_age as u64);
            }

            let live = ages
                .iter()
                .filter(|age| **age < 0 || elapsed <= **age as u64)
                .count();
            prop_assert_eq!(request.cookies.len(), live);
        }
    }
}
