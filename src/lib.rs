//! hostpool - Host-aware connection pool.
//!
//! This library keeps a live set of connections to a changing list of
//! endpoint hosts and load-balances requests across them.
//!
//! # Architecture
//!
//! - **[`ConnectionPool`]**: owns the host → connections map, dispatches
//!   requests and reconciles the map against a desired host list
//! - **[`CookieJar`]**: per-connection cookie cache, owned by one
//!   connection's event loop
//! - **[`Connection`] / [`ConnectionFactory`]**: capability traits supplied
//!   by the transport
//!
//! Key design principles:
//!
//! - Requests pick a host uniformly, then a connection within that host
//! - At most one reconciliation runs at a time; others are rejected
//! - Connection attempt failures are absorbed; only an empty pool is an error
//!
//! # Quick Start
//!
//! ```ignore
//! use hostpool::{AuthenticationMethod, ConnectionPool, HttpConnectionFactory, PoolConfig};
//!
//! #[tokio::main]
//! async fn main() -> hostpool::Result<()> {
//!     let factory = HttpConnectionFactory::new(MyConnector::default());
//!     let pool = ConnectionPool::new(
//!         PoolConfig::new().with_connections_per_host(2),
//!         AuthenticationMethod::basic("root", "secret"),
//!         factory,
//!     )?;
//!
//!     pool.update_connections(&["db1:8529".parse()?, "db2:8529".parse()?]).await?;
//!
//!     let request = Request::new("_system", RequestType::Get, "/_api/version");
//!     let response = pool.dispatch(request).await?;
//!     println!("status: {}", response.status);
//!
//!     pool.close().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`pool`] | [`ConnectionPool`] and [`PoolConfig`] |
//! | [`transport`] | Capability traits, [`HttpConnection`], [`CookieJar`] |
//! | [`protocol`] | [`Request`], [`Response`], [`Cookie`], [`AuthenticationMethod`] |
//! | [`identifiers`] | [`HostDescription`], [`ConnectionId`] |
//! | [`error`] | Error types and [`Result`] alias |

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Connection pool and configuration.
pub mod pool;

/// Boundary message types.
pub mod protocol;

/// Connection traits and the cookie-bearing connection.
pub mod transport;

mod test_utils;

// ============================================================================
// Re-exports
// ============================================================================

// Pool types
pub use pool::{ConnectionPool, PoolConfig};

// Transport types
pub use transport::{
    Connection, ConnectionFactory, CookieJar, CookieRequest, CookieResponse, HttpConnection,
    HttpConnectionFactory, HttpConnector, HttpTransport,
};

// Protocol types
pub use protocol::{AuthenticationMethod, Cookie, Request, RequestType, Response};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ConnectionId, HostDescription};
