//! Ring Module Tests
//!
//! ## Test Scopes
//! - **Placement**: Slot-count invariant, uniqueness of slot ownership, collision resolution.
//! - **Lookup**: Determinism, lower-bound search with wrap-around, empty ring handling.
//! - **Mutation**: Removal strips every virtual node; failed inserts leave the ring untouched.
//! - **Distribution**: Statistical balance across servers for random request keys.

#[cfg(test)]
mod tests {
    use crate::error::BalancerError;
    use crate::ring::hash::hash_request;
    use crate::ring::{HashRing, RingConfig};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::{HashMap, HashSet};

    fn ring_with(servers: &[&str]) -> HashRing {
        let mut ring = HashRing::new(RingConfig::default());
        for server in servers {
            ring.insert_server(server).unwrap();
        }
        ring
    }

    /// Reference lookup: linear scan for the first slot >= target, else the first slot.
    fn expected_owner(ring: &HashRing, key: u64) -> String {
        let target = hash_request(&key.to_string(), ring.config().num_slots);
        let slots = ring.slots();
        slots
            .iter()
            .find(|(slot, _)| *slot >= target)
            .or_else(|| slots.first())
            .map(|(_, owner)| owner.to_string())
            .unwrap()
    }

    // ============================================================
    // PLACEMENT TESTS
    // ============================================================

    #[test]
    fn test_slot_count_is_servers_times_virtuals() {
        let ring = ring_with(&["server1", "server2", "server3"]);
        assert_eq!(ring.len(), 3 * 9);

        let slots: Vec<u32> = ring.slots().iter().map(|(slot, _)| *slot).collect();
        let unique: HashSet<u32> = slots.iter().copied().collect();
        assert_eq!(unique.len(), slots.len(), "No slot may be owned twice");

        let mut sorted = slots.clone();
        sorted.sort();
        assert_eq!(slots, sorted, "Slots must be kept in ascending order");
    }

    #[test]
    fn test_each_server_owns_exactly_v_slots() {
        let ring = ring_with(&["a", "b", "c", "d"]);
        for server in ["a", "b", "c", "d"] {
            assert_eq!(ring.server_slots(server).len(), 9);
        }
    }

    #[test]
    fn test_collisions_resolved_on_small_ring() {
        // 16 slots, 4 virtuals x 3 servers forces collisions
        let mut ring = HashRing::new(RingConfig {
            num_slots: 16,
            virtuals_per_server: 4,
        });
        for server in ["x", "y", "z"] {
            ring.insert_server(server).unwrap();
        }

        assert_eq!(ring.len(), 12);
        let unique: HashSet<u32> = ring.slots().iter().map(|(slot, _)| *slot).collect();
        assert_eq!(unique.len(), 12);
        assert!(unique.iter().all(|slot| *slot < 16));
    }

    #[test]
    fn test_layout_reproducible_for_same_insertion_order() {
        let ring1 = ring_with(&["server1", "server2", "server3"]);
        let ring2 = ring_with(&["server1", "server2", "server3"]);
        assert_eq!(ring1.slots(), ring2.slots());
    }

    #[test]
    fn test_insert_existing_server_is_noop() {
        let mut ring = ring_with(&["server1"]);
        ring.insert_server("server1").unwrap();
        assert_eq!(ring.len(), 9);
    }

    #[test]
    fn test_ring_full_leaves_ring_unchanged() {
        let mut ring = HashRing::new(RingConfig {
            num_slots: 4,
            virtuals_per_server: 3,
        });
        ring.insert_server("a").unwrap();
        let before = ring.slots().iter().map(|(s, o)| (*s, o.to_string())).collect::<Vec<_>>();

        let result = ring.insert_server("b");

        assert!(matches!(result, Err(BalancerError::RingFull { .. })));
        let after = ring.slots().iter().map(|(s, o)| (*s, o.to_string())).collect::<Vec<_>>();
        assert_eq!(before, after);
        assert!(!ring.contains_server("b"));
    }

    // ============================================================
    // LOOKUP TESTS
    // ============================================================

    #[test]
    fn test_route_is_deterministic() {
        let ring = ring_with(&["server1", "server2", "server3"]);
        for key in 0..200u64 {
            let first = ring.route(key).unwrap().to_string();
            for _ in 0..5 {
                assert_eq!(ring.route(key).unwrap(), first);
            }
        }
    }

    #[test]
    fn test_route_matches_lower_bound_with_wrap() {
        let ring = ring_with(&["server1", "server2", "server3"]);
        for key in 0..5000u64 {
            assert_eq!(ring.route(key).unwrap(), expected_owner(&ring, key), "key {}", key);
        }
    }

    #[test]
    fn test_route_on_empty_ring_fails() {
        let ring = HashRing::new(RingConfig::default());
        assert!(matches!(ring.route(42u64), Err(BalancerError::EmptyRing)));
    }

    #[test]
    fn test_single_server_receives_everything() {
        let ring = ring_with(&["only"]);
        for key in 0..100u64 {
            assert_eq!(ring.route(key).unwrap(), "only");
        }
    }

    // ============================================================
    // MUTATION TESTS
    // ============================================================

    #[test]
    fn test_remove_server_deletes_all_virtual_nodes() {
        let mut ring = ring_with(&["server1", "server2", "server3"]);

        let removed = ring.remove_server("server2");

        assert_eq!(removed, 9);
        assert_eq!(ring.len(), 18);
        assert!(!ring.contains_server("server2"));
        for key in 0..2000u64 {
            assert_ne!(ring.route(key).unwrap(), "server2");
        }
    }

    #[test]
    fn test_remove_unknown_server_changes_nothing() {
        let mut ring = ring_with(&["server1"]);
        assert_eq!(ring.remove_server("ghost"), 0);
        assert_eq!(ring.len(), 9);
    }

    #[test]
    fn test_removal_only_moves_keys_of_removed_server() {
        let mut ring = ring_with(&["server1", "server2", "server3"]);
        let before: Vec<String> = (0..2000u64).map(|k| ring.route(k).unwrap().to_string()).collect();

        ring.remove_server("server3");

        for (key, owner) in before.iter().enumerate() {
            if owner != "server3" {
                assert_eq!(ring.route(key as u64).unwrap(), owner);
            }
        }
    }

    // ============================================================
    // DISTRIBUTION TESTS
    // ============================================================

    #[test]
    fn test_distribution_within_tolerance() {
        let ring = ring_with(&["s1", "s2", "s3"]);
        let mut rng = StdRng::seed_from_u64(7);
        let mut counts: HashMap<String, usize> = HashMap::new();

        for _ in 0..10_000 {
            let key: u64 = rng.gen_range(100_000..=999_999);
            *counts.entry(ring.route(key).unwrap().to_string()).or_default() += 1;
        }

        let mean = 10_000.0 / 3.0;
        assert_eq!(counts.len(), 3);
        for (server, count) in counts {
            let deviation = (count as f64 - mean).abs() / mean;
            assert!(deviation <= 0.30, "{} got {} requests ({:.0}% off mean)", server, count, deviation * 100.0);
        }
    }
}
