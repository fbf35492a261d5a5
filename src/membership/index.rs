use super::provisioner::ServerProvisioner;
use super::types::{Membership, MembershipSnapshot, MembershipView, NamingConfig, ServerId};
use crate::error::{BalancerError, Result};
use crate::ring::{HashRing, RingConfig};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Random draws tried before falling back to a sequential scan for a free name.
const MAX_RANDOM_NAME_ATTEMPTS: usize = 64;

/// Single source of truth for "who is active", kept in lockstep with the ring.
pub struct MembershipIndex {
    /// Ring and active set. Readers share, commits swap the whole value.
    state: RwLock<Membership>,
    /// Serializes writers and owns the random source used for sampling and naming.
    admin: Mutex<StdRng>,
    provisioner: Arc<dyn ServerProvisioner>,
    naming: NamingConfig,
}

impl MembershipIndex {
    /// Creates an empty index seeded from OS entropy.
    pub fn new(ring_config: RingConfig, provisioner: Arc<dyn ServerProvisioner>) -> Self {
        Self::with_rng(ring_config, provisioner, StdRng::from_entropy())
    }

    /// Creates an empty index drawing all randomness from `rng`.
    pub fn with_rng(
        ring_config: RingConfig,
        provisioner: Arc<dyn ServerProvisioner>,
        rng: StdRng,
    ) -> Self {
        Self {
            state: RwLock::new(Membership::new(HashRing::new(ring_config))),
            admin: Mutex::new(rng),
            provisioner,
            naming: NamingConfig::default(),
        }
    }

    pub fn with_naming(mut self, naming: NamingConfig) -> Self {
        self.naming = naming;
        self
    }

    /// Brings up the initial pool. Equivalent to `add(servers.len(), servers)`.
    pub async fn bootstrap(&self, servers: Vec<ServerId>) -> Result<MembershipSnapshot> {
        let count = servers.len();
        let snapshot = self.add(count, servers).await?;
        tracing::info!("Initial pool ready: {:?}", snapshot.servers);
        Ok(snapshot)
    }

    /// Adds `count` servers, taking names from `names` first and synthesizing the rest.
    ///
    /// All-or-nothing: the ring insertion is staged before any backend is started,
    /// and a provisioning failure tears down the servers already started in this call.
    pub async fn add(&self, count: usize, names: Vec<ServerId>) -> Result<MembershipSnapshot> {
        if names.len() > count {
            return Err(BalancerError::Validation(
                "Length of hostname list is more than newly added instances".to_string(),
            ));
        }

        let mut rng = self.admin.lock().await;
        let mut next = self.state.read().await.clone();

        let mut batch: Vec<ServerId> = Vec::new();
        for i in 0..count {
            let server_id = match names.get(i) {
                Some(name) => {
                    if name.is_empty() {
                        return Err(BalancerError::Validation("Hostname must not be empty".to_string()));
                    }
                    if next.contains(name) || batch.contains(name) {
                        return Err(BalancerError::Validation(format!(
                            "Hostname {} is already in use",
                            name
                        )));
                    }
                    name.clone()
                }
                None => synthesize_name(&mut *rng, &self.naming, |candidate| {
                    next.contains(candidate) || batch.iter().any(|id| id == candidate)
                }),
            };

            next.ring.insert_server(&server_id)?;
            batch.push(server_id);
        }

        let mut started: Vec<&ServerId> = Vec::with_capacity(batch.len());
        for server_id in &batch {
            if let Err(e) = self.provisioner.provision(server_id).await {
                tracing::error!("Failed to provision {}: {}", server_id, e);
                for done in started {
                    self.deprovision_best_effort(done).await;
                }
                return Err(BalancerError::Provision {
                    server: server_id.clone(),
                    source: e,
                });
            }
            started.push(server_id);
        }

        next.active.extend(batch.iter().cloned());
        let snapshot = next.snapshot();
        *self.state.write().await = next;

        if !batch.is_empty() {
            tracing::info!("Added {:?}; {} servers active", batch, snapshot.count);
        }

        Ok(snapshot)
    }

    /// Removes `count` servers: every active name in `names`, plus a uniform random
    /// sample of the remaining servers to make up the difference.
    ///
    /// Deprovisioning is best-effort; a failure for one target never keeps it on the ring.
    pub async fn remove(&self, count: usize, names: Vec<ServerId>) -> Result<MembershipSnapshot> {
        if names.len() > count {
            return Err(BalancerError::Validation(
                "Length of hostname list is more than removable instances".to_string(),
            ));
        }

        let mut rng = self.admin.lock().await;
        let mut next = self.state.read().await.clone();

        let mut targets: Vec<ServerId> = Vec::with_capacity(next.active.len());
        for name in &names {
            if !next.contains(name) {
                tracing::warn!("Ignoring removal of unknown server {}", name);
            } else if !targets.contains(name) {
                targets.push(name.clone());
            }
        }

        let candidates: Vec<&ServerId> = next
            .active
            .iter()
            .filter(|id| !names.contains(id))
            .collect();
        let sample_size = (count - names.len()).min(candidates.len());
        targets.extend(
            candidates
                .choose_multiple(&mut *rng, sample_size)
                .map(|id| (*id).clone()),
        );

        for server_id in &targets {
            next.ring.remove_server(server_id);
            next.active.retain(|id| id != server_id);
        }
        let snapshot = next.snapshot();
        *self.state.write().await = next;

        for server_id in &targets {
            self.deprovision_best_effort(server_id).await;
        }

        if !targets.is_empty() {
            tracing::info!("Removed {:?}; {} servers active", targets, snapshot.count);
        }

        Ok(snapshot)
    }

    /// Swaps `dead` for one freshly named server in a single commit.
    ///
    /// If the replacement cannot be provisioned, `dead` is still removed and the
    /// provisioning error is returned; the active set shrinks by one.
    pub async fn replace(&self, dead: &str) -> Result<ServerId> {
        let mut rng = self.admin.lock().await;
        let mut next = self.state.read().await.clone();

        if !next.contains(dead) {
            return Err(BalancerError::UnknownServer(dead.to_string()));
        }

        let replacement = replacement_name(&mut *rng, &self.naming, &next.active);

        next.ring.remove_server(dead);
        next.active.retain(|id| id != dead);

        if let Err(e) = self.provisioner.provision(&replacement).await {
            *self.state.write().await = next;
            self.deprovision_best_effort(dead).await;
            tracing::error!("Removed {} but could not provision {}: {}", dead, replacement, e);
            return Err(BalancerError::Provision {
                server: replacement,
                source: e,
            });
        }

        if let Err(e) = next.ring.insert_server(&replacement) {
            *self.state.write().await = next;
            self.deprovision_best_effort(dead).await;
            self.deprovision_best_effort(&replacement).await;
            return Err(e);
        }
        next.active.push(replacement.clone());
        *self.state.write().await = next;

        self.deprovision_best_effort(dead).await;
        tracing::info!("Replaced {} with {}", dead, replacement);

        Ok(replacement)
    }

    /// Server owning `key` on the current ring.
    pub async fn route<K: Display>(&self, key: K) -> Result<ServerId> {
        let state = self.state.read().await;
        state.ring.route(key).map(str::to_string)
    }

    pub async fn snapshot(&self) -> MembershipSnapshot {
        self.state.read().await.snapshot()
    }

    pub async fn active_servers(&self) -> Vec<ServerId> {
        self.state.read().await.active.clone()
    }

    pub async fn contains(&self, server_id: &str) -> bool {
        self.state.read().await.contains(server_id)
    }

    /// Ring and active set taken under one read lock.
    pub async fn view(&self) -> MembershipView {
        self.state.read().await.view()
    }

    async fn deprovision_best_effort(&self, server_id: &str) {
        if let Err(e) = self.provisioner.deprovision(server_id).await {
            tracing::warn!("Failed to deprovision {} (ignored): {}", server_id, e);
        }
    }
}

/// Draws `{synthesized_prefix}{n}` names until one is free, then scans sequentially.
pub(crate) fn synthesize_name<R, F>(rng: &mut R, naming: &NamingConfig, taken: F) -> ServerId
where
    R: Rng,
    F: Fn(&str) -> bool,
{
    free_suffixed_name(rng, &naming.synthesized_prefix, naming, taken)
}

/// `{prefix}{max + 1}` over the numeric suffixes of active `{prefix}` names,
/// or a random free suffix when none of them is numeric.
pub(crate) fn replacement_name<R: Rng>(
    rng: &mut R,
    naming: &NamingConfig,
    active: &[ServerId],
) -> ServerId {
    let max_suffix = active
        .iter()
        .filter_map(|id| id.strip_prefix(naming.prefix.as_str()))
        .filter(|suffix| !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .max();

    // Past u64::MAX there is no successor; fall back to a random suffix.
    let successor = max_suffix
        .and_then(|max| max.checked_add(1))
        .and_then(|first| {
            (first..=u64::MAX)
                .map(|n| format!("{}{}", naming.prefix, n))
                .find(|candidate| !active.contains(candidate))
        });

    match successor {
        Some(name) => name,
        None => free_suffixed_name(rng, &naming.prefix, naming, |candidate| {
            active.iter().any(|id| id == candidate)
        }),
    }
}

fn free_suffixed_name<R, F>(rng: &mut R, prefix: &str, naming: &NamingConfig, taken: F) -> ServerId
where
    R: Rng,
    F: Fn(&str) -> bool,
{
    for _ in 0..MAX_RANDOM_NAME_ATTEMPTS {
        let candidate = format!("{}{}", prefix, rng.gen_range(naming.suffix_range.clone()));
        if !taken(&candidate) {
            return candidate;
        }
    }

    let mut suffix = *naming.suffix_range.start() as u64;
    loop {
        let candidate = format!("{}{}", prefix, suffix);
        if !taken(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}
