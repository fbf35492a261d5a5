use super::probe::HeartbeatProbe;
use crate::error::BalancerError;
use crate::membership::{MembershipIndex, ServerId};

use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

/// Heartbeat timing.
#[derive(Debug, Clone)]
pub struct HealthConfig {
    /// Time between the start of two cycles.
    pub interval: Duration,
    /// Hard timeout applied to each probe.
    pub timeout: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(2),
        }
    }
}

/// Last observed state of a server.
///
/// `Active -> Probing -> {Active | Failed}`, `Failed -> Replacing`, after which the
/// entry is dropped and the replacement starts out `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerHealth {
    Active,
    Probing,
    Failed,
    Replacing,
}

/// Outcome of one monitoring cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Servers probed in this cycle.
    pub probed: usize,
    /// Servers whose probe failed, in active-set order.
    pub failed: Vec<ServerId>,
    /// `(dead, replacement)` pairs committed in this cycle.
    pub replaced: Vec<(ServerId, ServerId)>,
}

pub struct HealthMonitor {
    index: Arc<MembershipIndex>,
    probe: Arc<dyn HeartbeatProbe>,
    config: HealthConfig,
    states: DashMap<ServerId, ServerHealth>,
}

impl HealthMonitor {
    pub fn new(
        index: Arc<MembershipIndex>,
        probe: Arc<dyn HeartbeatProbe>,
        config: HealthConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            index,
            probe,
            config,
            states: DashMap::new(),
        })
    }

    pub fn state_of(&self, server_id: &str) -> Option<ServerHealth> {
        self.states.get(server_id).map(|entry| *entry.value())
    }

    /// Probes every active server, then replaces the ones that failed.
    ///
    /// Probe errors never escape: they are logged and turn into replacements.
    pub async fn run_cycle(&self) -> CycleReport {
        let servers = self.index.active_servers().await;
        self.states.retain(|id, _| servers.contains(id));

        let mut probes = JoinSet::new();
        for server_id in &servers {
            self.states.insert(server_id.clone(), ServerHealth::Probing);

            let probe = self.probe.clone();
            let timeout = self.config.timeout;
            let server_id = server_id.clone();
            probes.spawn(async move {
                let result = match tokio::time::timeout(timeout, probe.probe(&server_id)).await {
                    Ok(result) => result,
                    Err(_) => Err(anyhow::anyhow!("timed out after {:?}", timeout)),
                };
                (server_id, result)
            });
        }

        let mut report = CycleReport {
            probed: servers.len(),
            ..CycleReport::default()
        };

        let mut unanswered: HashSet<ServerId> = servers.iter().cloned().collect();
        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok((server_id, Ok(()))) => {
                    unanswered.remove(&server_id);
                    self.states.insert(server_id, ServerHealth::Active);
                }
                Ok((server_id, Err(e))) => {
                    unanswered.remove(&server_id);
                    tracing::warn!("Heartbeat failed for {}: {}", server_id, e);
                    self.states.insert(server_id.clone(), ServerHealth::Failed);
                    report.failed.push(server_id);
                }
                Err(e) => {
                    tracing::error!("Heartbeat task aborted: {}", e);
                }
            }
        }

        // A probe task that panicked never reported back; it counts as a failed heartbeat.
        for server_id in unanswered {
            tracing::warn!("Heartbeat failed for {}: probe task aborted", server_id);
            self.states.insert(server_id.clone(), ServerHealth::Failed);
            report.failed.push(server_id);
        }

        report
            .failed
            .sort_by_key(|id| servers.iter().position(|s| s == id));

        for dead in &report.failed {
            self.states.insert(dead.clone(), ServerHealth::Replacing);

            match self.index.replace(dead).await {
                Ok(replacement) => {
                    self.states.insert(replacement.clone(), ServerHealth::Active);
                    report.replaced.push((dead.clone(), replacement));
                }
                Err(BalancerError::UnknownServer(_)) => {
                    tracing::debug!("{} left the pool before it could be replaced", dead);
                }
                Err(e) => {
                    tracing::error!("Failed to replace {}: {}", dead, e);
                }
            }

            self.states.remove(dead);
        }

        report
    }

    /// Spawns the monitoring loop. The first cycle runs one interval after start.
    pub fn spawn(self: Arc<Self>) -> MonitorHandle {
        let (shutdown, mut stopped) = watch::channel(false);

        let task = tokio::spawn(async move {
            tracing::info!(
                "Health monitor started (interval {:?}, timeout {:?})",
                self.config.interval,
                self.config.timeout
            );

            let mut interval = tokio::time::interval(self.config.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let report = self.run_cycle().await;
                        if !report.failed.is_empty() {
                            tracing::info!(
                                "Heartbeat cycle: {} probed, {} failed, {} replaced",
                                report.probed,
                                report.failed.len(),
                                report.replaced.len()
                            );
                        }
                    }
                    _ = stopped.changed() => break,
                }
            }

            tracing::info!("Health monitor stopped");
        });

        MonitorHandle { shutdown, task }
    }
}

/// Owned handle of a running monitor loop.
pub struct MonitorHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Signals the loop and waits for it to exit. A cycle in progress finishes first.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::error!("Health monitor task failed: {}", e);
        }
    }
}
