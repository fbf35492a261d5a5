//! Consistent Hash Ring Module
//!
//! Maps request keys onto servers through a fixed-size slot space populated by virtual nodes.
//!
//! ## Core Concepts
//! - **Slots**: The ring space is `[0, num_slots)`. Every occupied slot belongs to exactly one server.
//! - **Virtual Nodes**: Each server is placed `V` times; placements are hashed independently from requests.
//! - **Collision Resolution**: Occupied slots are resolved with bounded quadratic probing.
//! - **Lookup**: A request lands on the first occupied slot at or after its hash, wrapping at the end.

pub mod hash;
pub mod ring;

pub use ring::{HashRing, RingConfig};

#[cfg(test)]
mod tests;
