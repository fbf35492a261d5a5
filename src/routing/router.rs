use crate::error::{BalancerError, Result};
use crate::membership::{BackendAddress, MembershipIndex};

use rand::Rng;
use serde_json::Value;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

/// Range random request keys are drawn from.
pub const REQUEST_KEY_RANGE: RangeInclusive<u64> = 100_000..=999_999;

/// Forwards client requests to the server that owns their key.
pub struct Router {
    index: Arc<MembershipIndex>,
    http_client: reqwest::Client,
    backend: BackendAddress,
    forward_timeout: Duration,
}

impl Router {
    pub fn new(
        index: Arc<MembershipIndex>,
        backend: BackendAddress,
        forward_timeout: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            index,
            http_client: reqwest::Client::new(),
            backend,
            forward_timeout,
        })
    }

    /// Sends `GET /{path}` to the owner of `key` (random when `None`) and returns its JSON body.
    ///
    /// An empty ring, a connection error, a non-2xx status and a non-JSON body all come back as
    /// the same [`BalancerError::Routing`] naming the path.
    pub async fn forward(&self, path: &str, key: Option<u64>) -> Result<Value> {
        let path = path.trim_start_matches('/');
        let key = key.unwrap_or_else(random_key);

        let server = match self.index.route(key).await {
            Ok(server) => server,
            Err(e) => {
                tracing::error!("Cannot route '{}': {}", path, e);
                return Err(missing_endpoint(path));
            }
        };
        tracing::debug!("Routing key {} for '{}' to {}", key, path, server);

        let url = self.backend.url(&server, path);
        let response = self
            .http_client
            .get(&url)
            .timeout(self.forward_timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Forwarding '{}' to {} failed: {}", path, server, e);
                missing_endpoint(path)
            })?;

        if !response.status().is_success() {
            tracing::warn!("{} answered '{}' with {}", server, path, response.status());
            return Err(missing_endpoint(path));
        }

        response.json::<Value>().await.map_err(|e| {
            tracing::warn!("{} returned a non-JSON body for '{}': {}", server, path, e);
            missing_endpoint(path)
        })
    }
}

pub fn random_key() -> u64 {
    rand::thread_rng().gen_range(REQUEST_KEY_RANGE)
}

fn missing_endpoint(path: &str) -> BalancerError {
    BalancerError::Routing(format!(
        "<Error> '{}' endpoint does not exist in server replicas",
        path
    ))
}
