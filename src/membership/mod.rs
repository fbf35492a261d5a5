//! Membership Index Module
//!
//! Owns the authoritative set of active servers together with the hash ring that routes to them.
//!
//! ## Core Mechanisms
//! - **Lockstep Mutation**: Every change is staged on a copy of `(ring, active set)` and swapped in
//!   under one write lock, so readers never see the two disagree.
//! - **Serialized Writers**: `add`, `remove` and `replace` queue on an admin mutex that also owns the
//!   injected random source; provisioning runs under it but outside the read/write lock.
//! - **Provisioning**: Backends are brought up and torn down through the `ServerProvisioner` capability.

pub mod index;
pub mod provisioner;
pub mod types;

pub use index::MembershipIndex;
pub use provisioner::{DockerProvisioner, ServerProvisioner, StaticProvisioner};
pub use types::{BackendAddress, MembershipSnapshot, MembershipView, NamingConfig, ServerId};
