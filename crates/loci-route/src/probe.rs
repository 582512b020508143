//! Bounded-time node liveness probing.

use std::time::Duration;

use tracing::debug;

/// Liveness check against a candidate node's URL.
///
/// Implementations never error: a timeout, connect failure, or unhealthy
/// response is simply `false`. A trait so resolvers can be tested with a
/// canned probe instead of real network access.
#[async_trait::async_trait]
pub trait NodeProbe: Send + Sync {
    /// Check whether the node at `url` is reachable and healthy, giving
    /// up after `timeout`.
    async fn is_online(&self, url: &str, timeout: Duration) -> bool;
}

/// HTTP [`NodeProbe`]: `GET <url>/health`, healthy on any 2xx response.
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    /// Create a probe with a shared connection pool.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl NodeProbe for HttpProbe {
    async fn is_online(&self, url: &str, timeout: Duration) -> bool {
        let endpoint = format!("{}/health", url.trim_end_matches('/'));
        match self.client.get(&endpoint).timeout(timeout).send().await {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                debug!(url, status = %resp.status(), "health probe returned non-success");
                false
            }
            Err(err) => {
                debug!(url, %err, "health probe failed");
                false
            }
        }
    }
}
