//! Consistent-Hashing Load Balancer Library
//!
//! This library crate defines the core modules of the balancer. It serves as the foundation
//! for the binary executable (`main.rs`).
//!
//! ## Architecture Modules
//! The system is composed of four subsystems, leaf first:
//!
//! - **`ring`**: The consistent-hash ring. Maps request keys to servers through virtual nodes,
//!   resolving slot collisions with quadratic probing.
//! - **`membership`**: The authoritative active-server set, kept in lockstep with the ring.
//!   Brings backends up and down through a pluggable provisioner.
//! - **`health`**: The failure detector. Periodically probes every server and replaces the
//!   ones that stop answering.
//! - **`routing`**: The request path and the control plane. Forwards client requests to the
//!   owning server and exposes add/remove/list over HTTP.

pub mod config;
pub mod error;
pub mod health;
pub mod membership;
pub mod ring;
pub mod routing;

#[cfg(test)]
mod testing;
