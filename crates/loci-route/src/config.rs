//! TOML configuration surface for backend pools.
//!
//! One optional section per pool kind; an absent section means that pool
//! kind is not deployed and no resolver is registered for it (callers see
//! "feature not configured", not an error).

use std::path::Path;

use loci_types::PoolKind;
use serde::Deserialize;

use crate::error::RouteError;

/// Top-level pool configuration, parsed from TOML.
///
/// ```toml
/// [cache]
/// nodes = [{ url = "http://10.0.0.5:6379" }, { url = "http://10.0.0.6:6379" }]
/// online_check = true
///
/// [tile-render]
/// nodes = [{ url = "http://render1:3000" }]
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PoolsConfig {
    /// `[cache]` section: cache node pool.
    pub cache: Option<PoolSection>,
    /// `[tile-render]` section: tile-render node pool.
    #[serde(rename = "tile-render")]
    pub tile_render: Option<PoolSection>,
}

/// Configuration for one pool of candidate nodes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PoolSection {
    /// Ordered candidate node list.
    pub nodes: Vec<NodeEntry>,
    /// Probe candidates for liveness before routing. When off, every
    /// configured node is assumed healthy.
    pub online_check: bool,
    /// Probe timeout override in seconds. Defaults per pool kind.
    pub probe_timeout_secs: Option<u64>,
}

/// One configured candidate node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeEntry {
    /// Connection endpoint.
    pub url: String,
}

impl PoolsConfig {
    /// Parse from a TOML string.
    pub fn from_toml_str(raw: &str) -> Result<Self, RouteError> {
        toml::from_str(raw).map_err(|e| RouteError::Config(e.to_string()))
    }

    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RouteError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            RouteError::Config(format!("{}: {e}", path.as_ref().display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// The section for a pool kind, if configured.
    pub fn section(&self, kind: PoolKind) -> Option<&PoolSection> {
        match kind {
            PoolKind::Cache => self.cache.as_ref(),
            PoolKind::TileRender => self.tile_render.as_ref(),
        }
    }
}
