use crate::membership::BackendAddress;

use anyhow::{Result, bail};

/// Backend-side liveness endpoint.
pub const HEARTBEAT_PATH: &str = "/heartbeat";

/// Liveness check against a single server. `Ok` means alive.
#[async_trait::async_trait]
pub trait HeartbeatProbe: Send + Sync {
    async fn probe(&self, server_id: &str) -> Result<()>;
}

/// `GET /heartbeat`; anything but a 2xx counts as a failure.
pub struct HttpHeartbeatProbe {
    client: reqwest::Client,
    backend: BackendAddress,
}

impl HttpHeartbeatProbe {
    pub fn new(backend: BackendAddress) -> Self {
        Self {
            client: reqwest::Client::new(),
            backend,
        }
    }
}

#[async_trait::async_trait]
impl HeartbeatProbe for HttpHeartbeatProbe {
    async fn probe(&self, server_id: &str) -> Result<()> {
        let url = self.backend.url(server_id, HEARTBEAT_PATH);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            bail!("heartbeat returned {}", response.status());
        }

        Ok(())
    }
}
