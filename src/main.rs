use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use ring_balancer::config::BalancerConfig;
use ring_balancer::health::{HealthMonitor, HttpHeartbeatProbe};
use ring_balancer::membership::MembershipIndex;
use ring_balancer::routing::{Router, app};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = BalancerConfig::parse();
    config.validate()?;

    tracing::info!(
        "Starting balancer on {} ({} slots, {} virtual nodes per server)",
        config.bind,
        config.slots,
        config.virtuals
    );

    // 1. Membership (ring + active set):
    let provisioner = config.build_provisioner();
    let index = match config.seed {
        Some(seed) => {
            MembershipIndex::with_rng(config.ring_config(), provisioner, StdRng::seed_from_u64(seed))
        }
        None => MembershipIndex::new(config.ring_config(), provisioner),
    };
    let index = Arc::new(index);
    index.bootstrap(config.initial_servers()).await?;

    // 2. Health monitor:
    let probe = Arc::new(HttpHeartbeatProbe::new(config.backend()));
    let monitor = HealthMonitor::new(index.clone(), probe, config.health_config());
    let monitor_handle = monitor.spawn();

    // 3. HTTP surface:
    let router = Router::new(index.clone(), config.backend(), config.forward_timeout());
    let app = app(index.clone(), router);

    tracing::info!("HTTP server listening on {}", config.bind);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    monitor_handle.stop().await;
    tracing::info!("Balancer stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
