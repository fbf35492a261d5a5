use crate::ring::HashRing;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

/// Opaque, unique identifier of one backend (also its hostname).
pub type ServerId = String;

/// Read-only view of the active set for reporting. Order is insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipSnapshot {
    #[serde(rename = "N")]
    pub count: usize,
    #[serde(rename = "replicas")]
    pub servers: Vec<ServerId>,
}

/// Ring and active set observed under the same read lock.
#[derive(Debug, Clone)]
pub struct MembershipView {
    pub active: Vec<ServerId>,
    pub ring_servers: BTreeSet<ServerId>,
    pub occupied_slots: usize,
}

impl MembershipView {
    /// True when the servers referenced by the ring are exactly the active set.
    pub fn is_consistent(&self) -> bool {
        let active: BTreeSet<ServerId> = self.active.iter().cloned().collect();
        active.len() == self.active.len() && active == self.ring_servers
    }
}

/// How new server names are chosen.
#[derive(Debug, Clone)]
pub struct NamingConfig {
    /// Prefix of numbered servers (`server1`, `server2`, ...); replacements continue this sequence.
    pub prefix: String,
    /// Prefix of names synthesized by `add` when no explicit name is given.
    pub synthesized_prefix: String,
    /// Range random suffixes are drawn from.
    pub suffix_range: RangeInclusive<u32>,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            prefix: "server".to_string(),
            synthesized_prefix: "S".to_string(),
            suffix_range: 1000..=9999,
        }
    }
}

/// The single logical resource guarded by the index lock.
#[derive(Debug, Clone)]
pub(crate) struct Membership {
    pub ring: HashRing,
    pub active: Vec<ServerId>,
}

impl Membership {
    pub fn new(ring: HashRing) -> Self {
        Self {
            ring,
            active: Vec::new(),
        }
    }

    pub fn contains(&self, server_id: &str) -> bool {
        self.active.iter().any(|id| id == server_id)
    }

    pub fn snapshot(&self) -> MembershipSnapshot {
        MembershipSnapshot {
            count: self.active.len(),
            servers: self.active.clone(),
        }
    }

    pub fn view(&self) -> MembershipView {
        MembershipView {
            active: self.active.clone(),
            ring_servers: self.ring.servers(),
            occupied_slots: self.ring.len(),
        }
    }
}

/// Where a server's HTTP endpoints live.
///
/// A server id is its hostname; ids already carrying a port (`host:port`) are used verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendAddress {
    pub port: u16,
}

impl Default for BackendAddress {
    fn default() -> Self {
        Self { port: 5000 }
    }
}

impl BackendAddress {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    /// `http://{server}:{port}/{path}`
    pub fn url(&self, server_id: &str, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if server_id.contains(':') {
            format!("http://{}/{}", server_id, path)
        } else {
            format!("http://{}:{}/{}", server_id, self.port, path)
        }
    }
}
