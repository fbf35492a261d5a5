//! Command-line and environment configuration of the balancer process.

use crate::health::HealthConfig;
use crate::membership::{BackendAddress, DockerProvisioner, ServerProvisioner, StaticProvisioner};
use crate::ring::RingConfig;

use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// How backends are brought up and torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProvisionerKind {
    /// Backends are managed outside the balancer.
    Static,
    /// One container per backend via the `docker` CLI.
    Docker,
}

#[derive(Debug, Parser)]
#[command(
    name = "ring-balancer",
    version,
    about = "Consistent-hashing load balancer with heartbeat-driven replacement"
)]
pub struct BalancerConfig {
    /// Address of the balancer's HTTP listener.
    #[arg(long, env = "BALANCER_BIND", default_value = "0.0.0.0:5000")]
    pub bind: SocketAddr,

    /// Size of the initial pool (`server1..serverN`).
    #[arg(long, env = "BALANCER_SERVERS", default_value_t = 3)]
    pub servers: usize,

    /// Explicit initial server names; replaces the generated ones.
    #[arg(long, env = "BALANCER_HOSTNAMES", value_delimiter = ',')]
    pub hostnames: Vec<String>,

    #[arg(long, env = "BALANCER_SLOTS", default_value_t = 512)]
    pub slots: u32,

    /// Virtual nodes per server.
    #[arg(long, env = "BALANCER_VIRTUALS", default_value_t = 9)]
    pub virtuals: u32,

    /// Port every backend listens on.
    #[arg(long, env = "BACKEND_PORT", default_value_t = 5000)]
    pub backend_port: u16,

    #[arg(long, env = "HEARTBEAT_INTERVAL_MS", default_value_t = 5000)]
    pub heartbeat_interval_ms: u64,

    #[arg(long, env = "HEARTBEAT_TIMEOUT_MS", default_value_t = 2000)]
    pub heartbeat_timeout_ms: u64,

    #[arg(long, env = "FORWARD_TIMEOUT_MS", default_value_t = 10_000)]
    pub forward_timeout_ms: u64,

    #[arg(long, env = "BALANCER_PROVISIONER", value_enum, default_value_t = ProvisionerKind::Static)]
    pub provisioner: ProvisionerKind,

    #[arg(long, env = "DOCKER_IMAGE", default_value = "simple-server")]
    pub docker_image: String,

    #[arg(long, env = "DOCKER_NETWORK", default_value = "net1")]
    pub docker_network: String,

    /// Seed for server sampling and naming. Random when unset.
    #[arg(long, env = "BALANCER_SEED")]
    pub seed: Option<u64>,
}

impl BalancerConfig {
    /// Rejects settings the ring or the monitor cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.slots == 0 {
            bail!("--slots must be at least 1");
        }
        if self.virtuals == 0 {
            bail!("--virtuals must be at least 1");
        }
        if self.heartbeat_interval_ms == 0 {
            bail!("--heartbeat-interval-ms must be at least 1");
        }
        Ok(())
    }

    pub fn ring_config(&self) -> RingConfig {
        RingConfig {
            num_slots: self.slots,
            virtuals_per_server: self.virtuals,
        }
    }

    pub fn health_config(&self) -> HealthConfig {
        HealthConfig {
            interval: Duration::from_millis(self.heartbeat_interval_ms),
            timeout: Duration::from_millis(self.heartbeat_timeout_ms),
        }
    }

    pub fn backend(&self) -> BackendAddress {
        BackendAddress::new(self.backend_port)
    }

    pub fn forward_timeout(&self) -> Duration {
        Duration::from_millis(self.forward_timeout_ms)
    }

    /// Names of the servers started at boot.
    pub fn initial_servers(&self) -> Vec<String> {
        if !self.hostnames.is_empty() {
            return self.hostnames.clone();
        }
        (1..=self.servers).map(|i| format!("server{}", i)).collect()
    }

    pub fn build_provisioner(&self) -> Arc<dyn ServerProvisioner> {
        match self.provisioner {
            ProvisionerKind::Static => Arc::new(StaticProvisioner),
            ProvisionerKind::Docker => Arc::new(DockerProvisioner::new(
                self.docker_image.clone(),
                self.docker_network.clone(),
            )),
        }
    }
}
