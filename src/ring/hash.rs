//! The two hash families used by the ring.
//!
//! Requests and virtual nodes are hashed with different functions so that data
//! placement is not correlated with server placement.

use md5::Md5;
use sha2::{Digest, Sha256};

/// Salt mixed into every virtual node key. Fixed so the layout survives restarts.
pub const VIRTUAL_NODE_SALT: &str = "salt42";

/// SHA-256 of the key's string form, reduced modulo `num_slots`.
pub fn hash_request(key: &str, num_slots: u32) -> u32 {
    let digest = Sha256::digest(key.as_bytes());
    reduce(&digest, num_slots)
}

/// MD5 of `virtual-{id}-replica-{replica}-salt42`, reduced modulo `num_slots`.
pub fn hash_virtual(server_id: &str, replica: u32, num_slots: u32) -> u32 {
    let key = format!("virtual-{}-replica-{}-{}", server_id, replica, VIRTUAL_NODE_SALT);
    let digest = Md5::digest(key.as_bytes());
    reduce(&digest, num_slots)
}

/// Treats `digest` as a big-endian integer and returns it modulo `modulus`.
fn reduce(digest: &[u8], modulus: u32) -> u32 {
    let modulus = modulus as u64;
    let rem = digest
        .iter()
        .fold(0u64, |acc, &byte| ((acc << 8) | byte as u64) % modulus);
    rem as u32
}
