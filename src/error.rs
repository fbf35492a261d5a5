//! Error taxonomy for the balancer core.

/// Errors surfaced by the ring, the membership index and the router.
#[derive(Debug, thiserror::Error)]
pub enum BalancerError {
    /// The caller asked for something inconsistent (e.g. more names than servers).
    #[error("<Error> {0}")]
    Validation(String),

    /// Quadratic probing visited every candidate slot without finding a free one.
    #[error("ring is full: no free slot for a virtual node of {server} ({num_slots} slots)")]
    RingFull {
        /// Server whose virtual node could not be placed.
        server: String,
        /// Size of the ring space.
        num_slots: u32,
    },

    /// `route` was called while no server is active.
    #[error("no active servers on the ring")]
    EmptyRing,

    /// The destination was unreachable or did not serve the path.
    #[error("{0}")]
    Routing(String),

    /// The provisioner refused to bring a server up.
    #[error("failed to provision {server}: {source}")]
    Provision {
        server: String,
        #[source]
        source: anyhow::Error,
    },

    /// The server is not (or no longer) part of the active set.
    #[error("server {0} is not active")]
    UnknownServer(String),
}

pub type Result<T> = std::result::Result<T, BalancerError>;
