//! Capability traits implemented outside the pool.
//!
//! | Trait | Role |
//! |-------|------|
//! | [`Connection`] | One physical connection as seen by the pool |
//! | [`ConnectionFactory`] | Opens connections to a host |
//! | [`HttpTransport`] | One cookie-bearing link driven by [`HttpConnection`](super::HttpConnection) |
//! | [`HttpConnector`] | Opens [`HttpTransport`]s |

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::error::Result;
use crate::identifiers::HostDescription;
use crate::protocol::{AuthenticationMethod, Request, Response};

// ============================================================================
// Connection
// ============================================================================

/// One physical connection.
///
/// Once admitted into a pool, the pool is the only caller of
/// [`close`](Connection::close).
#[async_trait]
pub trait Connection: Send + Sync + 'static {
    /// Executes a request. Transport errors are returned unchanged.
    async fn execute(&self, request: Request) -> Result<Response>;

    /// Returns `true` while the connection is usable.
    async fn is_connected(&self) -> bool;

    /// Closes the connection.
    async fn close(&self);
}

// ============================================================================
// ConnectionFactory
// ============================================================================

/// Produces connections for the pool.
#[async_trait]
pub trait ConnectionFactory: Send + Sync + 'static {
    /// Connection type produced by this factory.
    type Connection: Connection;

    /// Opens one connection to `host`.
    ///
    /// Called once per attempt; the pool handles retries.
    async fn create(
        &self,
        host: &HostDescription,
        authentication: &AuthenticationMethod,
    ) -> Result<Self::Connection>;

    /// Releases factory-level resources. Called once on pool shutdown.
    async fn close(&self) {}
}

// ============================================================================
// HttpTransport
// ============================================================================

/// A single cookie-bearing link.
///
/// Owned by exactly one connection event loop, so methods take `&mut self`.
#[async_trait]
pub trait HttpTransport: Send + 'static {
    /// Sends a request and waits for its response.
    async fn send(&mut self, request: Request) -> Result<Response>;

    /// Closes the link.
    async fn close(&mut self);
}

// ============================================================================
// HttpConnector
// ============================================================================

/// Opens [`HttpTransport`]s to a host.
#[async_trait]
pub trait HttpConnector: Send + Sync + 'static {
    /// Transport type produced by this connector.
    type Transport: HttpTransport;

    /// Opens one transport to `host`.
    async fn connect(&self, host: &HostDescription) -> Result<Self::Transport>;

    /// Releases connector-level resources.
    async fn close(&self) {}
}
