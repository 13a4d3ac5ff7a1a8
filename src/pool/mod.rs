//! Connection pool module.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ConnectionPool`] | Host map, dispatch and reconciliation |
//! | [`PoolConfig`] | Connections per host, retries, timeout |

// ============================================================================
// Submodules
// ============================================================================

/// Pool configuration.
pub mod config;

/// Pool implementation.
pub mod core;

mod guard;
mod host;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::PoolConfig;
pub use self::core::ConnectionPool;
