//! Health Monitoring Module
//!
//! Keeps the active set honest by probing every server on a fixed interval and
//! replacing the ones that fail.
//!
//! ## Core Mechanisms
//! - **Heartbeats**: Each cycle probes all active servers concurrently, each with a hard timeout.
//!   No index lock is held while probes are in flight.
//! - **Replacement**: Every server that failed its probe is swapped for a new one through
//!   `MembershipIndex::replace`. There is no retry within a cycle.
//! - **Lifecycle**: The loop runs as a spawned task with an explicit stop signal; tests drive
//!   single cycles directly with `run_cycle`.

pub mod monitor;
pub mod probe;

pub use monitor::{CycleReport, HealthConfig, HealthMonitor, MonitorHandle, ServerHealth};
pub use probe::{HEARTBEAT_PATH, HeartbeatProbe, HttpHeartbeatProbe};
