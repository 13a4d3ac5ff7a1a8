//! Boundary message types.
//!
//! This module defines what flows through a single connection. The pool
//! never inspects these beyond handing them to a connection.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `auth` | Authentication methods |
//! | `cookie` | Cookie record |
//! | `request` | Request and Response types |

// ============================================================================
// Submodules
// ============================================================================

/// Authentication methods.
pub mod auth;

/// Cookie record.
pub mod cookie;

/// Request and Response message types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use auth::AuthenticationMethod;
pub use cookie::{Cookie, CookieKey, SESSION_MAX_AGE};
pub use request::{Request, RequestType, Response};
