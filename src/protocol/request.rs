//! Request and Response types.
//!
//! Transport-neutral messages exchanged with a single connection.
//! Encoding them on the wire is the transport's job.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use rustc_hash::FxHashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;

use super::Cookie;

// ============================================================================
// RequestType
// ============================================================================

/// HTTP-style request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RequestType {
    /// `DELETE`
    Delete,
    /// `GET`
    #[default]
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `HEAD`
    Head,
    /// `PATCH`
    Patch,
    /// `OPTIONS`
    Options,
}

impl RequestType {
    /// Returns the method name in upper case.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Head => "HEAD",
            Self::Patch => "PATCH",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Request
// ============================================================================

/// A request to be executed on one connection.
///
/// # Example
///
/// ```
/// use hostpool::protocol::{Request, RequestType};
///
/// let request = Request::new("_system", RequestType::Get, "/_api/version")
///     .with_query_param("details", "true");
///
/// assert_eq!(request.uri(), "/_db/_system/_api/version?details=true");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    /// Target database.
    pub database: String,

    /// Request method.
    pub method: RequestType,

    /// Path relative to the database, starting with `/`.
    pub path: String,

    /// Query parameters, in insertion order.
    pub query_params: Vec<(String, String)>,

    /// Header parameters.
    pub header_params: FxHashMap<String, String>,

    /// Raw body bytes.
    pub body: Vec<u8>,

    /// Cookies to send with the request.
    pub cookies: Vec<Cookie>,
}

impl Request {
    /// Creates a new request with empty params and body.
    #[inline]
    #[must_use]
    pub fn new(database: impl Into<String>, method: RequestType, path: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            method,
            path: path.into(),
            ..Default::default()
        }
    }

    /// Adds a query parameter.
    #[inline]
    #[must_use]
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push((key.into(), value.into()));
        self
    }

    /// Sets a header parameter, replacing any previous value.
    #[inline]
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.header_params.insert(key.into(), value.into());
        self
    }

    /// Sets the raw body.
    #[inline]
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Serializes `value` as the JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
    pub fn with_json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self> {
        self.body = serde_json::to_vec(value)?;
        self.header_params
            .insert("content-type".to_string(), "application/json".to_string());
        Ok(self)
    }

    /// Renders the database-qualified path with an encoded query string.
    #[must_use]
    pub fn uri(&self) -> String {
        let mut uri = format!(
            "/_db/{}{}",
            urlencoding::encode(&self.database),
            self.path
        );

        for (i, (key, value)) in self.query_params.iter().enumerate() {
            uri.push(if i == 0 { '?' } else { '&' });
            uri.push_str(&urlencoding::encode(key));
            uri.push('=');
            uri.push_str(&urlencoding::encode(value));
        }

        uri
    }

    /// Renders the `Cookie` header value, if any cookies are attached.
    #[must_use]
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }

        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect();

        Some(pairs.join("; "))
    }
}

// ============================================================================
// Response
// ============================================================================

/// A response returned by one connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    /// Status code.
    pub status: u16,

    /// Response headers.
    pub headers: FxHashMap<String, String>,

    /// Raw body bytes.
    pub body: Vec<u8>,

    /// Cookies set by the server.
    pub cookies: Vec<Cookie>,
}

impl Response {
    /// Creates an empty response with the given status.
    #[inline]
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    /// Sets the raw body.
    #[inline]
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a header, replacing any previous value.
    #[inline]
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Adds a cookie set by the server.
    #[inline]
    #[must_use]
    pub fn with_cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Returns `true` for 2xx status codes.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserializes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if the body is not valid
    /// JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

// ============================================================================
// Tests
// ============================================================================
