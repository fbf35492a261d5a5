//! Deterministic collaborators shared by the module tests.

use crate::health::HeartbeatProbe;
use crate::membership::ServerProvisioner;

use anyhow::{Result, bail};
use std::collections::HashSet;
use std::sync::Mutex;

/// Records every call and fails `provision` for configured ids.
#[derive(Default)]
pub struct RecordingProvisioner {
    pub provisioned: Mutex<Vec<String>>,
    pub deprovisioned: Mutex<Vec<String>>,
    fail_provision: Mutex<HashSet<String>>,
    fail_deprovision: Mutex<HashSet<String>>,
}

impl RecordingProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_provision_of(&self, server_id: &str) {
        self.fail_provision.lock().unwrap().insert(server_id.to_string());
    }

    pub fn fail_deprovision_of(&self, server_id: &str) {
        self.fail_deprovision.lock().unwrap().insert(server_id.to_string());
    }

    pub fn provisioned(&self) -> Vec<String> {
        self.provisioned.lock().unwrap().clone()
    }

    pub fn deprovisioned(&self) -> Vec<String> {
        self.deprovisioned.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ServerProvisioner for RecordingProvisioner {
    async fn provision(&self, server_id: &str) -> Result<()> {
        if self.fail_provision.lock().unwrap().contains(server_id) {
            bail!("provisioning of {} refused", server_id);
        }
        self.provisioned.lock().unwrap().push(server_id.to_string());
        Ok(())
    }

    async fn deprovision(&self, server_id: &str) -> Result<()> {
        self.deprovisioned.lock().unwrap().push(server_id.to_string());
        if self.fail_deprovision.lock().unwrap().contains(server_id) {
            bail!("container {} not found", server_id);
        }
        Ok(())
    }
}

/// Heartbeat probe that reports configured ids as dead.
#[derive(Default)]
pub struct ScriptedProbe {
    dead: Mutex<HashSet<String>>,
    pub probed: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kill(&self, server_id: &str) {
        self.dead.lock().unwrap().insert(server_id.to_string());
    }

    pub fn revive(&self, server_id: &str) {
        self.dead.lock().unwrap().remove(server_id);
    }

    pub fn probed(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl HeartbeatProbe for ScriptedProbe {
    async fn probe(&self, server_id: &str) -> Result<()> {
        self.probed.lock().unwrap().push(server_id.to_string());
        if self.dead.lock().unwrap().contains(server_id) {
            bail!("connection refused");
        }
        Ok(())
    }
}

/// Serves `app` on an ephemeral localhost port and returns `127.0.0.1:<port>`,
/// which doubles as a server id.
pub async fn spawn_backend(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr.to_string()
}

/// An address nothing is listening on.
pub async fn closed_address() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr.to_string()
}
