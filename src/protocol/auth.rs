//! Authentication methods passed to connection factories.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

// ============================================================================
// AuthenticationMethod
// ============================================================================

/// Credentials used when opening a connection.
///
/// The handshake itself belongs to the transport; this type only carries
/// the credentials and renders the `Authorization` header value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthenticationMethod {
    /// Basic authentication.
    Basic {
        /// User name.
        user: String,
        /// Password.
        password: String,
    },
    /// JSON Web Token authentication.
    Jwt {
        /// Encoded token.
        token: String,
    },
}

impl AuthenticationMethod {
    /// Creates a basic authentication method.
    #[inline]
    #[must_use]
    pub fn basic(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            user: user.into(),
            password: password.into(),
        }
    }

    /// Creates a JWT authentication method.
    #[inline]
    #[must_use]
    pub fn jwt(token: impl Into<String>) -> Self {
        Self::Jwt {
            token: token.into(),
        }
    }

    /// Renders the `Authorization` header value.
    #[must_use]
    pub fn header_value(&self) -> String {
        match self {
            Self::Basic { user, password } => {
                format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
            }
            Self::Jwt { token } => format!("bearer {token}"),
        }
    }
}

// Credentials stay out of logs.
impl fmt::Debug for AuthenticationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { user, .. } => f
                .debug_struct("Basic")
                .field("user", user)
                .finish_non_exhaustive(),
            Self::Jwt { .. } => f.debug_struct("Jwt").finish_non_exhaustive(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
