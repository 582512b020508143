//! Key-to-node resolution for one pool.

use std::sync::Arc;
use std::time::Duration;

use futures::future;
use loci_types::{PoolKind, Shard};
use tracing::{debug, warn};

use crate::config::PoolSection;
use crate::error::RouteError;
use crate::hash::{shard_index, KeyHasher, Sha256KeyHasher};
use crate::probe::{HttpProbe, NodeProbe};

/// Default probe timeout per pool kind.
///
/// Cache nodes answer a ping in milliseconds, so a stuck one should be
/// dropped fast. Render nodes can legitimately take minutes to come up
/// while loading reference data, so their probe window is much wider.
fn default_probe_timeout(pool: PoolKind) -> Duration {
    match pool {
        PoolKind::Cache => Duration::from_secs(1),
        PoolKind::TileRender => Duration::from_secs(600),
    }
}

/// Routes keys to nodes within one configured pool.
///
/// Stateless beyond its configuration; safe to share across tasks.
pub struct PoolResolver {
    pool: PoolKind,
    nodes: Vec<Shard>,
    online_check: bool,
    probe_timeout: Duration,
    hasher: Arc<dyn KeyHasher>,
    probe: Arc<dyn NodeProbe>,
}

impl PoolResolver {
    /// Build a resolver for `pool` from its config section, with the
    /// default hasher and HTTP probe.
    pub fn new(pool: PoolKind, section: &PoolSection) -> Self {
        Self::with_parts(
            pool,
            section,
            Arc::new(Sha256KeyHasher),
            Arc::new(HttpProbe::new()),
        )
    }

    /// Build a resolver with explicit hasher and probe implementations.
    pub fn with_parts(
        pool: PoolKind,
        section: &PoolSection,
        hasher: Arc<dyn KeyHasher>,
        probe: Arc<dyn NodeProbe>,
    ) -> Self {
        let probe_timeout = section
            .probe_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| default_probe_timeout(pool));
        Self {
            pool,
            nodes: section
                .nodes
                .iter()
                .map(|n| Shard::new(n.url.clone()))
                .collect(),
            online_check: section.online_check,
            probe_timeout,
            hasher,
            probe,
        }
    }

    /// The pool this resolver routes within.
    pub fn pool(&self) -> PoolKind {
        self.pool
    }

    /// Resolve `key` to one healthy node of this pool.
    ///
    /// Candidates are probed concurrently (when `online_check` is on) and
    /// unreachable ones dropped; the survivors are indexed by
    /// `hash(key) % len`. With a single survivor the hash is skipped
    /// entirely. The choice is stable for a given key while the healthy
    /// set is stable; a liveness flip between calls may move the key to a
    /// different node.
    pub async fn get_shard(&self, key: &str) -> Result<Shard, RouteError> {
        if self.nodes.is_empty() {
            return Err(RouteError::NoNodesConfigured { pool: self.pool });
        }

        let healthy = self.healthy_candidates().await;
        if healthy.is_empty() {
            return Err(RouteError::NoAvailableNodes { pool: self.pool });
        }

        if healthy.len() == 1 {
            return Ok(healthy[0].clone());
        }

        let index = shard_index(self.hasher.hash_key(key), healthy.len());
        let shard = healthy[index].clone();
        debug!(pool = %self.pool, key, url = %shard.url, "resolved key to node");
        Ok(shard)
    }

    /// Filter the configured candidates to the ones currently reachable.
    ///
    /// All probes run concurrently, so the wall time is bounded by the
    /// single probe timeout, not the sum over candidates.
    async fn healthy_candidates(&self) -> Vec<&Shard> {
        if !self.online_check {
            return self.nodes.iter().collect();
        }

        let probes = self.nodes.iter().map(|node| {
            let probe = Arc::clone(&self.probe);
            let timeout = self.probe_timeout;
            async move { probe.is_online(&node.url, timeout).await }
        });
        let results = future::join_all(probes).await;

        let mut healthy = Vec::with_capacity(self.nodes.len());
        for (node, online) in self.nodes.iter().zip(results) {
            if online {
                healthy.push(node);
            } else {
                warn!(pool = %self.pool, url = %node.url, "dropping unreachable node");
            }
        }
        healthy
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::config::NodeEntry;

    /// Probe answering from a fixed set of online URLs, counting calls.
    struct StaticProbe {
        online: HashSet<String>,
        calls: AtomicUsize,
    }

    impl StaticProbe {
        fn new(online: &[&str]) -> Self {
            Self {
                online: online.iter().map(|s| s.to_string()).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl NodeProbe for StaticProbe {
        async fn is_online(&self, url: &str, _timeout: Duration) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.online.contains(url)
        }
    }

    /// Hasher wrapping [`Sha256KeyHasher`] with an invocation counter.
    struct CountingHasher {
        calls: AtomicUsize,
    }

    impl CountingHasher {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl KeyHasher for CountingHasher {
        fn hash_key(&self, key: &str) -> u32 {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Sha256KeyHasher.hash_key(key)
        }
    }

    fn section(urls: &[&str], online_check: bool) -> PoolSection {
        PoolSection {
            nodes: urls
                .iter()
                .map(|u| NodeEntry { url: u.to_string() })
                .collect(),
            online_check,
            probe_timeout_secs: Some(1),
        }
    }

    fn resolver_with(
        urls: &[&str],
        online_check: bool,
        probe: Arc<StaticProbe>,
    ) -> PoolResolver {
        PoolResolver::with_parts(
            PoolKind::Cache,
            &section(urls, online_check),
            Arc::new(Sha256KeyHasher),
            probe,
        )
    }

    #[tokio::test]
    async fn test_empty_pool_rejects_without_probing() {
        let probe = Arc::new(StaticProbe::new(&[]));
        let resolver = resolver_with(&[], true, Arc::clone(&probe));

        let err = resolver.get_shard("any").await.unwrap_err();
        assert!(matches!(err, RouteError::NoNodesConfigured { .. }));
        assert!(!err.is_retryable());
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_offline_rejects_as_retryable() {
        let probe = Arc::new(StaticProbe::new(&[]));
        let resolver = resolver_with(&["http://a", "http://b"], true, Arc::clone(&probe));

        let err = resolver.get_shard("any").await.unwrap_err();
        assert!(matches!(err, RouteError::NoAvailableNodes { .. }));
        assert!(err.is_retryable());
        assert_eq!(probe.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_single_candidate_skips_hashing() {
        let hasher = Arc::new(CountingHasher::new());
        let resolver = PoolResolver::with_parts(
            PoolKind::Cache,
            &section(&["http://only"], false),
            Arc::clone(&hasher) as Arc<dyn KeyHasher>,
            Arc::new(StaticProbe::new(&[])),
        );

        for key in ["a", "b", "c"] {
            let shard = resolver.get_shard(key).await.unwrap();
            assert_eq!(shard.url, "http://only");
        }
        assert_eq!(hasher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_single_survivor_skips_hashing() {
        let hasher = Arc::new(CountingHasher::new());
        let resolver = PoolResolver::with_parts(
            PoolKind::Cache,
            &section(&["http://down", "http://up"], true),
            Arc::clone(&hasher) as Arc<dyn KeyHasher>,
            Arc::new(StaticProbe::new(&["http://up"])),
        );

        let shard = resolver.get_shard("whatever").await.unwrap();
        assert_eq!(shard.url, "http://up");
        assert_eq!(hasher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolution_is_stable() {
        let probe = Arc::new(StaticProbe::new(&[]));
        let resolver =
            resolver_with(&["http://a", "http://b", "http://c"], false, probe);

        let first = resolver.get_shard("sample-42").await.unwrap();
        for _ in 0..10 {
            assert_eq!(resolver.get_shard("sample-42").await.unwrap(), first);
        }
    }

    #[tokio::test]
    async fn test_resolution_matches_pinned_hash() {
        // sha256("sample-42")[0..4] = 0x767f099c; 1988037020 % 3 == 2.
        let probe = Arc::new(StaticProbe::new(&[]));
        let resolver =
            resolver_with(&["http://a", "http://b", "http://c"], false, probe);

        let shard = resolver.get_shard("sample-42").await.unwrap();
        assert_eq!(shard.url, "http://c");
    }

    #[tokio::test]
    async fn test_resolved_node_always_from_pool() {
        let urls = ["http://a", "http://b", "http://c", "http://d"];
        let probe = Arc::new(StaticProbe::new(&[]));
        let resolver = resolver_with(&urls, false, probe);

        for i in 0..200 {
            let shard = resolver.get_shard(&format!("key-{i}")).await.unwrap();
            assert!(urls.contains(&shard.url.as_str()));
        }
    }

    #[tokio::test]
    async fn test_keys_spread_across_pool() {
        let probe = Arc::new(StaticProbe::new(&[]));
        let resolver =
            resolver_with(&["http://a", "http://b", "http://c"], false, probe);

        let mut seen = HashSet::new();
        for i in 0..100 {
            let shard = resolver.get_shard(&format!("key-{i}")).await.unwrap();
            seen.insert(shard.url);
        }
        assert_eq!(seen.len(), 3, "100 varied keys should hit every node");
    }

    #[tokio::test]
    async fn test_offline_node_excluded_from_selection() {
        let probe = Arc::new(StaticProbe::new(&["http://a", "http://c"]));
        let resolver =
            resolver_with(&["http://a", "http://b", "http://c"], true, probe);

        for i in 0..100 {
            let shard = resolver.get_shard(&format!("key-{i}")).await.unwrap();
            assert_ne!(shard.url, "http://b");
        }
    }

    #[tokio::test]
    async fn test_default_timeouts_per_pool_kind() {
        assert_eq!(
            default_probe_timeout(PoolKind::Cache),
            Duration::from_secs(1)
        );
        assert_eq!(
            default_probe_timeout(PoolKind::TileRender),
            Duration::from_secs(600)
        );
    }
}
