//! Health-aware consistent key routing across backend node pools.
//!
//! A pool is a named list of candidate backend nodes of one kind (cache
//! nodes, tile-render nodes) read from configuration. This crate maps an
//! arbitrary string key to one node of a pool:
//!
//! - [`Sha256KeyHasher`] — deterministic key → `u32` hashing.
//! - [`NodeProbe`] / [`HttpProbe`] — bounded-time liveness checks.
//! - [`PoolResolver`] — filters a pool to its healthy candidates and picks
//!   one by hash.
//! - [`ShardRouter`] — the per-process registry of resolvers, built once
//!   from [`PoolsConfig`] at startup and injected into callers.
//!
//! Routing is deterministic for a stable healthy set: the same key against
//! the same candidates always picks the same node. When liveness flips
//! between calls the chosen node may move — availability is preferred over
//! strict key affinity.

mod config;
mod error;
mod hash;
mod probe;
mod resolver;
mod router;

pub use config::{NodeEntry, PoolSection, PoolsConfig};
pub use error::RouteError;
pub use hash::{shard_index, KeyHasher, Sha256KeyHasher};
pub use probe::{HttpProbe, NodeProbe};
pub use resolver::PoolResolver;
pub use router::ShardRouter;
