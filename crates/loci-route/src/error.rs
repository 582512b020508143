//! Error types for the routing crate.

use loci_types::PoolKind;

/// Errors produced while resolving a key to a backend node.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// The pool has zero configured candidates.
    ///
    /// An operator problem, not a transient one: surfacing layers should
    /// report it as a deployment misconfiguration (500-class) rather than
    /// inviting a retry.
    #[error("no nodes configured for pool {pool}")]
    NoNodesConfigured {
        /// The pool whose configuration is empty.
        pool: PoolKind,
    },

    /// The pool is configured but no candidate passed health probing.
    ///
    /// Transient: nodes may recover, so surfacing layers should report it
    /// as retryable (503-class).
    #[error("no nodes available in pool {pool}")]
    NoAvailableNodes {
        /// The pool whose candidates were all unreachable.
        pool: PoolKind,
    },

    /// Failed to read or parse the pool configuration file.
    #[error("config error: {0}")]
    Config(String),
}

impl RouteError {
    /// Whether retrying the operation later may succeed without operator
    /// intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RouteError::NoAvailableNodes { .. })
    }
}
