use super::hash::{hash_request, hash_virtual};
use crate::error::{BalancerError, Result};

use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;

/// Shape of the ring space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingConfig {
    /// Number of discrete positions on the ring.
    pub num_slots: u32,
    /// Virtual nodes placed per server.
    pub virtuals_per_server: u32,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            num_slots: 512,
            virtuals_per_server: 9,
        }
    }
}

/// Consistent hash ring over a fixed slot space.
///
/// `slots` is kept sorted and duplicate-free; `owners` maps each occupied slot
/// to the server that placed a virtual node there. Both are always updated together.
#[derive(Debug, Clone)]
pub struct HashRing {
    config: RingConfig,
    slots: Vec<u32>,
    owners: HashMap<u32, String>,
}

impl HashRing {
    pub fn new(config: RingConfig) -> Self {
        Self {
            config,
            slots: Vec::new(),
            owners: HashMap::new(),
        }
    }

    /// Places all virtual nodes of `server_id`.
    ///
    /// Either every virtual node is placed or none is: if probing runs out of
    /// attempts for any replica, the ring is left untouched and `RingFull` is returned.
    /// Inserting a server that is already on the ring is a no-op.
    pub fn insert_server(&mut self, server_id: &str) -> Result<()> {
        if self.contains_server(server_id) {
            return Ok(());
        }

        let mut placed: Vec<u32> = Vec::with_capacity(self.config.virtuals_per_server as usize);
        for replica in 0..self.config.virtuals_per_server {
            let start = hash_virtual(server_id, replica, self.config.num_slots);
            match self.probe_free_slot(start, &placed) {
                Some(slot) => placed.push(slot),
                None => {
                    return Err(BalancerError::RingFull {
                        server: server_id.to_string(),
                        num_slots: self.config.num_slots,
                    });
                }
            }
        }

        for slot in placed {
            self.owners.insert(slot, server_id.to_string());
            let pos = self.slots.partition_point(|&s| s < slot);
            self.slots.insert(pos, slot);
        }

        tracing::debug!(
            "Placed {} virtual nodes for {} ({} slots occupied)",
            self.config.virtuals_per_server,
            server_id,
            self.slots.len()
        );

        Ok(())
    }

    /// Deletes every slot owned by `server_id`. Returns how many were removed.
    pub fn remove_server(&mut self, server_id: &str) -> usize {
        let before = self.slots.len();
        self.owners.retain(|_, owner| owner != server_id);
        let owners = &self.owners;
        self.slots.retain(|slot| owners.contains_key(slot));
        before - self.slots.len()
    }

    /// Returns the server owning the first occupied slot at or after `hash_request(key)`,
    /// wrapping to the first slot when the target is past the last one.
    pub fn route<K: Display>(&self, key: K) -> Result<&str> {
        if self.slots.is_empty() {
            return Err(BalancerError::EmptyRing);
        }

        let target = hash_request(&key.to_string(), self.config.num_slots);
        let idx = self.slots.partition_point(|&s| s < target);
        let slot = self.slots[idx % self.slots.len()];

        self.owners
            .get(&slot)
            .map(String::as_str)
            .ok_or(BalancerError::EmptyRing)
    }

    pub fn contains_server(&self, server_id: &str) -> bool {
        self.owners.values().any(|owner| owner == server_id)
    }

    /// Distinct servers referenced by occupied slots.
    pub fn servers(&self) -> BTreeSet<String> {
        self.owners.values().cloned().collect()
    }

    /// `(slot, server)` pairs in ring order.
    pub fn slots(&self) -> Vec<(u32, &str)> {
        self.slots
            .iter()
            .filter_map(|slot| self.owners.get(slot).map(|owner| (*slot, owner.as_str())))
            .collect()
    }

    /// Slots owned by one server, ascending.
    pub fn server_slots(&self, server_id: &str) -> Vec<u32> {
        self.slots
            .iter()
            .copied()
            .filter(|slot| self.owners.get(slot).is_some_and(|owner| owner == server_id))
            .collect()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn config(&self) -> &RingConfig {
        &self.config
    }

    fn is_free(&self, slot: u32, pending: &[u32]) -> bool {
        !self.owners.contains_key(&slot) && !pending.contains(&slot)
    }

    /// Quadratic probing: `slot = (slot + i²) mod num_slots` for `i = 1, 2, ...`,
    /// giving up after `num_slots` attempts.
    fn probe_free_slot(&self, start: u32, pending: &[u32]) -> Option<u32> {
        if self.is_free(start, pending) {
            return Some(start);
        }

        let num_slots = self.config.num_slots as u64;
        let mut slot = start as u64;
        for i in 1..=num_slots {
            slot = (slot + i * i) % num_slots;
            if self.is_free(slot as u32, pending) {
                return Some(slot as u32);
            }
        }

        None
    }
}
