//! Host-aware connection pool.
//!
//! Keeps a set of connections per host, reconciles that set against a
//! desired host list, and load-balances requests across hosts.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                ConnectionPool                │
//! │  ┌────────────────────────────────────────┐  │
//! │  │ db1:8529 → [conn, conn]                │  │
//! │  │ db2:8529 → [conn, conn, conn]          │  │
//! │  │ db3:8529 → [conn]                      │  │
//! │  └────────────────────────────────────────┘  │
//! │  update guard: Idle | Updating               │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Update Sequence
//!
//! 1. Reject if another update is in flight
//! 2. Add new hosts and remove dropped hosts, concurrently
//! 3. Sweep hosts whose connections all report disconnected
//! 4. Fail if steps 2-3 exceed the timeout, or if no host is left
//!
//! Dispatch takes no pool-wide lock and may observe a host appearing or
//! disappearing while an update runs.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use futures_util::future::join_all;
use rand::Rng;
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::identifiers::HostDescription;
use crate::protocol::{AuthenticationMethod, Request, Response};
use crate::transport::{Connection, ConnectionFactory};

use super::config::PoolConfig;
use super::guard::UpdateGuard;
use super::host::{HostConnections, create_host_connections};

// ============================================================================
// Types
// ============================================================================

/// Host to connections map.
type HostMap<C> = DashMap<HostDescription, HostConnections<C>, FxBuildHasher>;

// ============================================================================
// ConnectionPool
// ============================================================================

/// Connection pool spanning a changing set of hosts.
///
/// All methods take `&self`; wrap the pool in an `Arc` to share it between
/// a periodic host-list refresher and request handlers.
///
/// # Example
///
/// ```ignore
/// let pool = ConnectionPool::new(PoolConfig::new(), auth, factory)?;
///
/// pool.update_connections(&["db1:8529".parse()?, "db2:8529".parse()?]).await?;
/// let response = pool.dispatch(request).await?;
///
/// pool.close().await;
/// ```
pub struct ConnectionPool<F: ConnectionFactory> {
    /// Connections by host. Keys never map to an empty sequence.
    connections_by_host: HostMap<F::Connection>,

    /// Pool configuration.
    config: PoolConfig,

    /// Credentials passed to the factory.
    authentication: AuthenticationMethod,

    /// Connection factory.
    factory: F,

    /// Set while an update is in flight.
    updating: AtomicBool,
}

// ============================================================================
// ConnectionPool - Display
// ============================================================================

impl<F: ConnectionFactory> fmt::Debug for ConnectionPool<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("config", &self.config)
            .field("host_count", &self.host_count())
            .field("updating", &self.is_updating())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ConnectionPool - Constructor
// ============================================================================

impl<F: ConnectionFactory> ConnectionPool<F> {
    /// Creates an empty pool.
    ///
    /// Call [`update_connections`](Self::update_connections) to populate it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `config` is invalid.
    pub fn new(config: PoolConfig, authentication: AuthenticationMethod, factory: F) -> Result<Self> {
        config.validate()?;

        debug!(?config, ?authentication, "ConnectionPool created");

        Ok(Self {
            connections_by_host: DashMap::with_hasher(FxBuildHasher),
            config,
            authentication,
            factory,
            updating: AtomicBool::new(false),
        })
    }
}

// ============================================================================
// ConnectionPool - Public API
// ============================================================================

impl<F: ConnectionFactory> ConnectionPool<F> {
    /// Returns the pool configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Returns the number of hosts.
    #[inline]
    #[must_use]
    pub fn host_count(&self) -> usize {
        self.connections_by_host.len()
    }

    /// Returns the total number of connections across hosts.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections_by_host.iter().map(|e| e.value().len()).sum()
    }

    /// Returns the current hosts, in no particular order.
    #[must_use]
    pub fn hosts(&self) -> Vec<HostDescription> {
        self.connections_by_host
            .iter()
            .map(|e| e.key().clone())
            .collect()
    }

    /// Returns the number of connections held for each host.
    #[must_use]
    pub fn snapshot(&self) -> FxHashMap<HostDescription, usize> {
        self.connections_by_host
            .iter()
            .map(|e| (e.key().clone(), e.value().len()))
            .collect()
    }

    /// Returns `true` while an update is in flight.
    #[inline]
    #[must_use]
    pub fn is_updating(&self) -> bool {
        self.updating.load(Ordering::Acquire)
    }

    /// Executes `request` on a random connection of a random host.
    ///
    /// Every host is equally likely, regardless of how many connections it
    /// holds.
    ///
    /// # Errors
    ///
    /// - [`Error::NoConnections`] if the pool is empty
    /// - Any error of the chosen connection, unchanged
    pub async fn dispatch(&self, request: Request) -> Result<Response> {
        let (host, connections) = self.pick_host().ok_or(Error::NoConnections)?;
        debug!(host = %host, "dispatch: picked host");

        let connection = connections.choose().ok_or(Error::NoConnections)?;
        connection.execute(request).await
    }

    /// Brings the pool in line with `host_list`.
    ///
    /// New hosts get `connections_per_host` connections, hosts missing from
    /// the list are closed and removed, and hosts whose connections all
    /// report disconnected are evicted. Hosts present before and after keep
    /// their connections.
    ///
    /// Dropping the returned future releases the update guard.
    ///
    /// # Errors
    ///
    /// - [`Error::ConcurrentUpdate`] if another update is in flight
    /// - [`Error::Timeout`] if the update exceeds the configured timeout
    /// - [`Error::NoConnections`] if no host is left afterwards
    pub async fn update_connections(&self, host_list: &[HostDescription]) -> Result<()> {
        debug!(hosts = ?host_list, "update_connections()");

        let _guard = UpdateGuard::acquire(&self.updating)?;

        let applied = timeout(self.config.timeout, self.apply_host_list(host_list)).await;
        debug!(hosts = ?self.hosts(), "update_connections complete");

        if applied.is_err() {
            warn!(timeout_ms = self.config.timeout_ms(), "update_connections timed out");
            return Err(Error::timeout(
                "update_connections",
                self.config.timeout_ms(),
            ));
        }

        if self.connections_by_host.is_empty() {
            warn!("Could not create any connection");
            return Err(Error::NoConnections);
        }

        Ok(())
    }

    /// Closes every connection and releases the factory.
    ///
    /// Must not run concurrently with [`update_connections`](Self::update_connections).
    pub async fn close(&self) {
        info!(hosts = self.host_count(), "ConnectionPool shutting down");

        let removed: Vec<_> = self
            .hosts()
            .iter()
            .filter_map(|host| self.connections_by_host.remove(host))
            .collect();

        join_all(removed.iter().map(|(_, connections)| connections.close_all())).await;

        self.factory.close().await;

        info!("ConnectionPool shutdown complete");
    }
}

// ============================================================================
// ConnectionPool - Host Management
// ============================================================================

impl<F: ConnectionFactory> ConnectionPool<F> {
    /// Adds, removes and sweeps hosts. Runs under the update guard.
    async fn apply_host_list(&self, host_list: &[HostDescription]) {
        let desired: FxHashSet<&HostDescription> = host_list.iter().collect();

        let mut seen = FxHashSet::default();
        let to_add: Vec<&HostDescription> = host_list
            .iter()
            .filter(|host| seen.insert(*host) && !self.connections_by_host.contains_key(*host))
            .collect();

        let to_remove: Vec<HostDescription> = self
            .hosts()
            .into_iter()
            .filter(|host| !desired.contains(host))
            .collect();

        let added = join_all(to_add.into_iter().map(|host| self.add_host(host)));
        let removed = join_all(to_remove.iter().map(|host| self.remove_host(host)));
        tokio::join!(added, removed);

        self.remove_disconnected_hosts().await;
    }

    /// Connects to `host` and admits it if at least one connection succeeded.
    async fn add_host(&self, host: &HostDescription) {
        debug!(host = %host, "Adding host");

        let connections = create_host_connections(
            &self.factory,
            host,
            &self.authentication,
            self.config.connections_per_host,
            self.config.retries,
        )
        .await;

        match HostConnections::new(connections) {
            Some(connections) => {
                let count = connections.len();
                // `to_add` skips present hosts, so a previous entry is only
                // found when a host is re-added outside the diff.
                if let Some(stale) = self.connections_by_host.insert(host.clone(), connections) {
                    stale.close_all().await;
                }
                info!(host = %host, connections = count, "Added host");
            }
            None => {
                warn!(host = %host, "Not able to connect to host, skipped adding host");
                self.remove_host(host).await;
            }
        }
    }

    /// Removes `host` and closes its connections, if present.
    async fn remove_host(&self, host: &HostDescription) {
        if let Some((_, connections)) = self.connections_by_host.remove(host) {
            debug!(host = %host, connections = connections.len(), "Removing host");
            connections.close_all().await;
        }
    }

    /// Removes every host whose connections all report disconnected.
    async fn remove_disconnected_hosts(&self) {
        let entries: Vec<(HostDescription, HostConnections<F::Connection>)> = self
            .connections_by_host
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();

        let checks = join_all(entries.iter().map(|(host, connections)| async move {
            connections.all_disconnected().await.then_some(host)
        }))
        .await;

        let disconnected: Vec<&HostDescription> = checks.into_iter().flatten().collect();
        if !disconnected.is_empty() {
            info!(hosts = ?disconnected, "Removing disconnected hosts");
        }

        join_all(disconnected.into_iter().map(|host| self.remove_host(host))).await;
    }

    /// Picks a host uniformly at random.
    ///
    /// Entries are copied into a list first so the index is uniform over
    /// hosts. Returns `None` if the pool is empty.
    fn pick_host(&self) -> Option<(HostDescription, HostConnections<F::Connection>)> {
        let mut entries: Vec<(HostDescription, HostConnections<F::Connection>)> = self
            .connections_by_host
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();

        if entries.is_empty() {
            return None;
        }

        let index = rand::rng().random_range(0..entries.len());
        Some(entries.swap_remove(index))
    }
}

// ============================================================================
// Tests
// ============================================================================
