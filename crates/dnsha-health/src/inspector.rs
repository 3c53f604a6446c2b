//! Dependency state inspector.
//!
//! Reduces whatever the container runtime reports to running / not
//! running. Absent, stopped, and "could not ask" are all not running.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::runtime::{ContainerRuntime, ContainerStatus};

/// Whether a dependency container is up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Running,
    NotRunning,
}

/// Answers run-state questions about dependency containers.
#[derive(Clone)]
pub struct DependencyInspector {
    runtime: Arc<dyn ContainerRuntime>,
}

impl DependencyInspector {
    /// Inspector backed by `runtime`.
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { runtime }
    }

    /// Run state of `container`. A runtime error or a missing container
    /// reads as [`RunState::NotRunning`].
    pub async fn is_running(&self, container: &str) -> RunState {
        match self.runtime.status(container).await {
            Ok(ContainerStatus::Running) => RunState::Running,
            Ok(status) => {
                debug!(%container, ?status, "container not running");
                RunState::NotRunning
            }
            Err(e) => {
                warn!(%container, error = %e, "container status unavailable, treating as not running");
                RunState::NotRunning
            }
        }
    }

    /// Whether the container exists at all (running or stopped).
    pub async fn is_present(&self, container: &str) -> bool {
        match self.runtime.status(container).await {
            Ok(ContainerStatus::Absent) => false,
            Ok(_) => true,
            Err(e) => {
                warn!(%container, error = %e, "container status unavailable");
                false
            }
        }
    }
}
