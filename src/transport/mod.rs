//! Connection-level building blocks.
//!
//! The pool only sees the [`Connection`] and [`ConnectionFactory`] traits.
//! This module also ships a cookie-bearing implementation of both on top of
//! an abstract [`HttpTransport`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   Execute / Shutdown   ┌──────────────────────┐
//! │  HttpConnection  │───────────────────────►│  event loop task     │
//! │  (Send + Sync)   │◄───────────────────────│  owns: CookieJar     │
//! └──────────────────┘   Result<Response>     │        HttpTransport │
//!                                             └──────────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | `HttpConnection` event loop and factory |
//! | `cookie_jar` | Per-connection cookie cache |
//! | `traits` | Capability traits |

// ============================================================================
// Submodules
// ============================================================================

/// Cookie-bearing connection and factory.
pub mod connection;

/// Per-connection cookie cache.
pub mod cookie_jar;

/// Capability traits.
pub mod traits;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{HttpConnection, HttpConnectionFactory};
pub use cookie_jar::{CookieJar, CookieRequest, CookieResponse};
pub use traits::{Connection, ConnectionFactory, HttpConnector, HttpTransport};
