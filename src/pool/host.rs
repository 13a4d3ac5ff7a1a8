//! Connections held for one host, and how they are built.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use futures_util::future::join_all;
use rand::seq::IndexedRandom;
use tracing::{debug, warn};

use crate::error::Error;
use crate::identifiers::HostDescription;
use crate::protocol::AuthenticationMethod;
use crate::transport::{Connection, ConnectionFactory};

// ============================================================================
// HostConnections
// ============================================================================

/// Non-empty, immutable sequence of connections to one host.
///
/// Cloning shares the sequence; the pool map and in-flight dispatches may
/// hold the same connections at once.
pub(crate) struct HostConnections<C> {
    connections: Arc<[C]>,
}

impl<C> Clone for HostConnections<C> {
    fn clone(&self) -> Self {
        Self {
            connections: Arc::clone(&self.connections),
        }
    }
}

impl<C> fmt::Debug for HostConnections<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostConnections")
            .field("len", &self.connections.len())
            .finish()
    }
}

impl<C: Connection> HostConnections<C> {
    /// Wraps `connections`, or returns `None` if there are none.
    pub(crate) fn new(connections: Vec<C>) -> Option<Self> {
        if connections.is_empty() {
            return None;
        }
        Some(Self {
            connections: connections.into(),
        })
    }

    /// Number of connections.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.connections.len()
    }

    /// Picks a connection uniformly at random.
    pub(crate) fn choose(&self) -> Option<&C> {
        self.connections.choose(&mut rand::rng())
    }

    /// Closes every connection concurrently.
    pub(crate) async fn close_all(&self) {
        join_all(self.connections.iter().map(|c| c.close())).await;
    }

    /// Returns `true` if no connection reports itself connected.
    pub(crate) async fn all_disconnected(&self) -> bool {
        let states = join_all(self.connections.iter().map(|c| c.is_connected())).await;
        states.into_iter().all(|connected| !connected)
    }
}

// ============================================================================
// Connection Attempts
// ============================================================================

/// Outcome of one connection attempt after its retries.
pub(crate) enum Attempt<C> {
    /// A connection was established.
    Created(C),
    /// Every try failed; holds the last cause.
    Failed(Error),
}

/// Runs one attempt: the first try plus up to `retries` more.
pub(crate) async fn attempt_connection<F: ConnectionFactory>(
    factory: &F,
    host: &HostDescription,
    authentication: &AuthenticationMethod,
    retries: usize,
) -> Attempt<F::Connection> {
    let mut tries = 0usize;

    loop {
        match factory.create(host, authentication).await {
            Ok(connection) => {
                debug!(host = %host, tries = tries + 1, "Created connection");
                return Attempt::Created(connection);
            }
            Err(e) if tries < retries => {
                tries += 1;
                debug!(host = %host, error = %e, retry = tries, "Connection attempt failed, retrying");
            }
            Err(e) => return Attempt::Failed(e),
        }
    }
}

/// Opens `count` connections to `host` in parallel.
///
/// Failed attempts are logged and dropped; the result may be empty.
pub(crate) async fn create_host_connections<F: ConnectionFactory>(
    factory: &F,
    host: &HostDescription,
    authentication: &AuthenticationMethod,
    count: usize,
    retries: usize,
) -> Vec<F::Connection> {
    debug!(host = %host, count, "Creating host connections");

    let attempts = join_all(
        (0..count).map(|_| attempt_connection(factory, host, authentication, retries)),
    )
    .await;

    let mut connections = Vec::with_capacity(count);
    for attempt in attempts {
        match attempt {
            Attempt::Created(connection) => connections.push(connection),
            Attempt::Failed(cause) => {
                warn!(host = %host, error = %cause, "Error creating connection");
            }
        }
    }

    connections
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::test_utils::{MockFactory, auth, host};

    #[tokio::test]
    async fn test_empty_sequence_rejected() {
        assert!(HostConnections::<crate::test_utils::MockConnection>::new(Vec::new()).is_none());
    }

    #[tokio::test]
    async fn test_attempt_failed_keeps_cause() {
        let factory = MockFactory::default();
        factory.set_unreachable(&host("a"));

        let attempt = attempt_connection(&factory, &host("a"), &auth(), 2).await;

        assert!(matches!(attempt, Attempt::Failed(Error::Connection { .. })));
        assert_eq!(factory.attempts(), 3);
    }

    #[tokio::test]
    async fn test_create_drops_failed_attempts() {
        let factory = MockFactory::default();
        factory.fail_next(&host("a"), 2);

        let connections = create_host_connections(&factory, &host("a"), &auth(), 4, 0).await;
        assert_eq!(connections.len(), 2);
    }

    #[tokio::test]
    async fn test_all_disconnected() {
        let factory = MockFactory::default();
        let connections = create_host_connections(&factory, &host("a"), &auth(), 2, 0).await;
        let connections = HostConnections::new(connections).expect("non-empty");

        assert!(!connections.all_disconnected().await);

        let handles = factory.handles(&host("a"));
        handles[0].disconnect();
        assert!(!connections.all_disconnected().await);

        handles[1].disconnect();
        assert!(connections.all_disconnected().await);
    }

    #[tokio::test]
    async fn test_close_all() {
        let factory = MockFactory::default();
        let connections = create_host_connections(&factory, &host("a"), &auth(), 3, 0).await;
        let connections = HostConnections::new(connections).expect("non-empty");

        connections.close_all().await;

        assert!(factory.handles(&host("a")).iter().all(|h| h.close_count() == 1));
        assert!(connections.choose().is_some());
    }
}
