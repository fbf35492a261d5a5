//! Backend Provisioning
//!
//! The index never talks to a container runtime directly; it calls into a
//! `ServerProvisioner`. Two implementations ship with the crate:
//! - **`StaticProvisioner`**: backends are managed outside the balancer, provisioning is a no-op.
//! - **`DockerProvisioner`**: runs one container per server through the `docker` CLI.

use anyhow::{Result, bail};
use tokio::process::Command;

/// Capability to bring a backend up and tear it down.
///
/// `provision` failures are surfaced to callers of `add`/`replace`;
/// `deprovision` failures are logged and otherwise ignored.
#[async_trait::async_trait]
pub trait ServerProvisioner: Send + Sync {
    async fn provision(&self, server_id: &str) -> Result<()>;

    async fn deprovision(&self, server_id: &str) -> Result<()>;
}

/// Provisioner for externally managed backends.
#[derive(Debug, Default, Clone)]
pub struct StaticProvisioner;

#[async_trait::async_trait]
impl ServerProvisioner for StaticProvisioner {
    async fn provision(&self, server_id: &str) -> Result<()> {
        tracing::debug!("Static provisioner: assuming {} is already running", server_id);
        Ok(())
    }

    async fn deprovision(&self, server_id: &str) -> Result<()> {
        tracing::debug!("Static provisioner: leaving {} to its owner", server_id);
        Ok(())
    }
}

/// Runs each server as a detached container named and hostnamed after its id.
#[derive(Debug, Clone)]
pub struct DockerProvisioner {
    image: String,
    network: String,
}

impl DockerProvisioner {
    pub fn new(image: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            network: network.into(),
        }
    }

    /// Arguments of `docker run` for one server.
    pub fn run_args(&self, server_id: &str) -> Vec<String> {
        vec![
            "run".to_string(),
            "-d".to_string(),
            "--name".to_string(),
            server_id.to_string(),
            "--hostname".to_string(),
            server_id.to_string(),
            "--network".to_string(),
            self.network.clone(),
            "-e".to_string(),
            format!("SERVER_ID={}", server_id),
            self.image.clone(),
        ]
    }

    async fn docker(&self, args: &[String]) -> Result<()> {
        let output = Command::new("docker").args(args).output().await?;
        if !output.status.success() {
            bail!(
                "docker {} exited with {}: {}",
                args.first().map(String::as_str).unwrap_or_default(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ServerProvisioner for DockerProvisioner {
    async fn provision(&self, server_id: &str) -> Result<()> {
        self.docker(&self.run_args(server_id)).await?;
        tracing::info!("Started container {} from image {}", server_id, self.image);
        Ok(())
    }

    async fn deprovision(&self, server_id: &str) -> Result<()> {
        let args = vec!["rm".to_string(), "-f".to_string(), server_id.to_string()];
        self.docker(&args).await?;
        tracing::info!("Removed container {}", server_id);
        Ok(())
    }
}
