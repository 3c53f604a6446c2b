//! Fakes shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use dnsha_core::{NodeRole, ServiceSet};
use dnsha_health::{
    ContainerRuntime, ContainerStatus, DnsQuery, ProbeError, ProbeSettings, RuntimeError,
};

/// DNS seam whose answer can be flipped between calls.
pub struct SwitchQuery {
    ok: Mutex<bool>,
}

impl SwitchQuery {
    pub fn new(ok: bool) -> Self {
        Self { ok: Mutex::new(ok) }
    }

    pub fn set(&self, ok: bool) {
        *self.ok.lock().unwrap() = ok;
    }
}

#[async_trait]
impl DnsQuery for SwitchQuery {
    async fn query(
        &self,
        _resolver: SocketAddr,
        _domain: &str,
        _timeout: Duration,
    ) -> Result<usize, ProbeError> {
        if *self.ok.lock().unwrap() {
            Ok(1)
        } else {
            Err(ProbeError::NoAnswer)
        }
    }
}

/// Container runtime over a name → status map, recording mutating calls.
#[derive(Default)]
pub struct MapRuntime {
    statuses: Mutex<HashMap<String, ContainerStatus>>,
    calls: Mutex<Vec<String>>,
}

impl MapRuntime {
    /// All default primary-node containers running.
    pub fn all_running() -> Self {
        let runtime = Self::default();
        for name in ["pihole_primary", "unbound_primary", "keepalived"] {
            runtime.set(name, ContainerStatus::Running);
        }
        runtime
    }

    pub fn set(&self, name: &str, status: ContainerStatus) {
        self.statuses
            .lock()
            .unwrap()
            .insert(name.to_string(), status);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContainerRuntime for MapRuntime {
    async fn status(&self, name: &str) -> Result<ContainerStatus, RuntimeError> {
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .get(name)
            .copied()
            .unwrap_or(ContainerStatus::Absent))
    }

    async fn restart(&self, name: &str) -> Result<(), RuntimeError> {
        self.calls.lock().unwrap().push(format!("restart:{name}"));
        self.set(name, ContainerStatus::Running);
        Ok(())
    }

    async fn start_service(&self, name: &str) -> Result<(), RuntimeError> {
        self.calls.lock().unwrap().push(format!("start:{name}"));
        self.set(name, ContainerStatus::Running);
        Ok(())
    }
}

pub fn services() -> ServiceSet {
    ServiceSet::defaults_for(NodeRole::Primary)
}

pub fn probe_settings() -> ProbeSettings {
    ProbeSettings {
        resolver: "127.0.0.1:53".parse().unwrap(),
        domain: "example.org".to_string(),
        timeout: Duration::from_millis(200),
        attempts: 2,
        retry_delay: Duration::ZERO,
    }
}
