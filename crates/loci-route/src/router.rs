//! The per-process resolver registry.

use std::collections::HashMap;

use loci_types::PoolKind;
use tracing::info;

use crate::config::PoolsConfig;
use crate::resolver::PoolResolver;

/// Registry mapping each configured pool kind to its resolver.
///
/// Built once from [`PoolsConfig`] at startup and handed (usually in an
/// `Arc`) to anything that routes keyed work. There is no lazy global:
/// construction order and test isolation are explicit at the call site.
///
/// Pool kinds without a configuration section get no resolver; callers
/// must treat [`ShardRouter::resolver`] returning `None` as "feature not
/// deployed here", not as an internal error.
pub struct ShardRouter {
    resolvers: HashMap<PoolKind, PoolResolver>,
}

impl ShardRouter {
    /// Build a router from the pool configuration.
    ///
    /// An empty node list still registers a resolver; it fails at
    /// resolution time with `NoNodesConfigured`, which keeps the
    /// "configured but broken" case distinguishable from "not deployed".
    pub fn new(config: &PoolsConfig) -> Self {
        let mut resolvers = HashMap::new();
        for kind in PoolKind::ALL {
            if let Some(section) = config.section(kind) {
                info!(pool = %kind, nodes = section.nodes.len(), "registering pool");
                resolvers.insert(kind, PoolResolver::new(kind, section));
            }
        }
        Self { resolvers }
    }

    /// The resolver for a pool kind, if that pool is configured.
    pub fn resolver(&self, kind: PoolKind) -> Option<&PoolResolver> {
        self.resolvers.get(&kind)
    }

    /// The pool kinds configured in this deployment.
    pub fn pools(&self) -> impl Iterator<Item = PoolKind> + '_ {
        self.resolvers.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RouteError;

    #[test]
    fn test_only_configured_pools_are_registered() {
        let config = PoolsConfig::from_toml_str(
            r#"
            [cache]
            nodes = [{ url = "http://c1:6379" }]
            "#,
        )
        .unwrap();

        let router = ShardRouter::new(&config);
        assert!(router.resolver(PoolKind::Cache).is_some());
        assert!(router.resolver(PoolKind::TileRender).is_none());
        assert_eq!(router.pools().collect::<Vec<_>>(), vec![PoolKind::Cache]);
    }

    #[test]
    fn test_empty_config_registers_nothing() {
        let router = ShardRouter::new(&PoolsConfig::default());
        for kind in PoolKind::ALL {
            assert!(router.resolver(kind).is_none());
        }
    }

    #[tokio::test]
    async fn test_configured_empty_pool_fails_at_resolution() {
        let config = PoolsConfig::from_toml_str(
            r#"
            [tile-render]
            nodes = []
            "#,
        )
        .unwrap();

        let router = ShardRouter::new(&config);
        let resolver = router.resolver(PoolKind::TileRender).unwrap();
        let err = resolver.get_shard("k").await.unwrap_err();
        assert!(matches!(err, RouteError::NoNodesConfigured { .. }));
    }

    #[tokio::test]
    async fn test_end_to_end_routing_without_probing() {
        let config = PoolsConfig::from_toml_str(
            r#"
            [cache]
            nodes = [
                { url = "http://a" },
                { url = "http://b" },
                { url = "http://c" },
            ]
            "#,
        )
        .unwrap();

        let router = ShardRouter::new(&config);
        let resolver = router.resolver(PoolKind::Cache).unwrap();

        // Pure function of the key string: same answer on every call and
        // on every process restart.
        let shard = resolver.get_shard("sample-42").await.unwrap();
        assert_eq!(shard.url, "http://c");
        assert_eq!(resolver.get_shard("sample-42").await.unwrap(), shard);
    }
}
