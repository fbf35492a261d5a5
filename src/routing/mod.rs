//! Routing Module
//!
//! Entry point for client traffic and the operator control plane.
//!
//! ## Core Mechanisms
//! - **Key Selection**: Requests without a natural key get a random one from a fixed range,
//!   which spreads load statistically across the ring.
//! - **Single-Shot Forwarding**: The owning server is looked up once and the request is sent there.
//!   Any failure is reported to the caller; there is no retry against another server.
//! - **Control Plane**: `/rep`, `/add` and `/rm` expose the membership index over HTTP.

pub mod handlers;
pub mod protocol;
pub mod router;

pub use handlers::app;
pub use router::Router;
