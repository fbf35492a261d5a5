//! Control Plane Protocol
//!
//! Endpoints and JSON bodies of the balancer's HTTP surface. Every reply is wrapped in an
//! [`Envelope`] carrying either the payload or an error message.

use serde::{Deserialize, Serialize};

// --- API Endpoints ---

/// Lists the active servers.
pub const ENDPOINT_REP: &str = "/rep";
/// Adds servers to the pool.
pub const ENDPOINT_ADD: &str = "/add";
/// Removes servers from the pool.
pub const ENDPOINT_RM: &str = "/rm";
/// Any other path is forwarded to the server owning the request key.
pub const ENDPOINT_FORWARD: &str = "/*path";

// --- Data Transfer Objects ---

/// Body of `POST /add` and `DELETE /rm`.
#[derive(Debug, Serialize, Deserialize)]
pub struct MembershipRequest {
    /// Number of servers to add or remove.
    pub n: usize,
    /// Names to use first; the rest are synthesized (add) or sampled (remove).
    #[serde(default)]
    pub hostnames: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Successful,
    Failure,
}

/// `{ "message": ..., "status": "successful" | "failure" }`
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub message: T,
    pub status: Status,
}

impl<T> Envelope<T> {
    pub fn successful(message: T) -> Self {
        Self {
            message,
            status: Status::Successful,
        }
    }
}

impl Envelope<String> {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: Status::Failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_envelope_shape() {
        let json = serde_json::to_value(Envelope::failure("<Error> boom")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "message": "<Error> boom", "status": "failure" })
        );
    }

    #[test]
    fn test_membership_request_without_hostnames() {
        let req: MembershipRequest = serde_json::from_str(r#"{ "n": 2 }"#).unwrap();
        assert_eq!(req.n, 2);
        assert!(req.hostnames.is_empty());
    }
}
