//! In-memory fakes for the runtime and DNS seams.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::probe::{DnsQuery, ProbeError};
use crate::runtime::{ContainerRuntime, ContainerStatus, RuntimeError};

/// Answers queries from a script of successes (`true`) and failures.
/// An exhausted script fails every further query.
pub struct ScriptedQuery {
    script: Mutex<VecDeque<bool>>,
    hang: bool,
    calls: AtomicU32,
}

impl ScriptedQuery {
    pub fn new(script: &[bool]) -> Self {
        Self {
            script: Mutex::new(script.iter().copied().collect()),
            hang: false,
            calls: AtomicU32::new(0),
        }
    }

    pub fn always(ok: bool) -> Self {
        Self::new(&[ok; 64])
    }

    /// Never answers.
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::new(&[])
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DnsQuery for ScriptedQuery {
    async fn query(
        &self,
        _resolver: SocketAddr,
        _domain: &str,
        _timeout: Duration,
    ) -> Result<usize, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }
        let ok = self.script.lock().unwrap().pop_front().unwrap_or(false);
        if ok {
            Ok(1)
        } else {
            Err(ProbeError::Resolve("SERVFAIL".to_string()))
        }
    }
}

/// Container runtime backed by a name → status map.
#[derive(Default)]
pub struct FakeRuntime {
    statuses: Mutex<HashMap<String, ContainerStatus>>,
    fail_restart: bool,
    unreachable: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, name: &str, status: ContainerStatus) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .insert(name.to_string(), status);
        self
    }

    pub fn failing_restarts(mut self) -> Self {
        self.fail_restart = true;
        self
    }

    /// Every call fails as if the daemon were down.
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub fn set(&self, name: &str, status: ContainerStatus) {
        self.statuses
            .lock()
            .unwrap()
            .insert(name.to_string(), status);
    }

    /// Mutating calls made so far, as `"restart:<name>"` / `"start:<name>"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn down(&self, name: &str) -> RuntimeError {
        RuntimeError::Request {
            name: name.to_string(),
            message: "daemon unreachable".to_string(),
        }
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn status(&self, name: &str) -> Result<ContainerStatus, RuntimeError> {
        if self.unreachable {
            return Err(self.down(name));
        }
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
        if self.unreachable {
            return Err(self.down(name));
        }
        if self.fail_restart {
            return Err(RuntimeError::Request {
                name: name.to_string(),
                message: "restart refused".to_string(),
            });
        }
        Ok(())
    }

    async fn start_service(&self, name: &str) -> Result<(), RuntimeError> {
        self.calls.lock().unwrap().push(format!("start:{name}"));
        if self.unreachable {
            return Err(self.down(name));
        }
        self.set(name, ContainerStatus::Running);
        Ok(())
    }
}
