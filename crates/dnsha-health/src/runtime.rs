//! Container runtime seam.
//!
//! The health checks and remediation only ever talk to the runtime through
//! [`ContainerRuntime`]. [`DockerRuntime`] implements it against the Docker
//! Engine API over its unix socket.

use std::time::Duration;

use async_trait::async_trait;
use bollard::Docker;
use bollard::errors::Error as DockerError;
use bollard::query_parameters::{
    InspectContainerOptions, RestartContainerOptions, StartContainerOptions,
};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Observed state of a named container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerStatus {
    Running,
    /// Exists but is not running (created, exited, paused, ...).
    Stopped,
    /// No container with that name.
    Absent,
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to connect to container runtime: {0}")]
    Connect(String),

    #[error("container {0} not found")]
    NotFound(String),

    #[error("runtime request for {name} failed: {message}")]
    Request { name: String, message: String },
}

/// Lifecycle operations this crate needs from a container runtime.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    async fn status(&self, name: &str) -> Result<ContainerStatus, RuntimeError>;

    async fn restart(&self, name: &str) -> Result<(), RuntimeError>;

    /// Start a stopped service (the failover engine).
    async fn start_service(&self, name: &str) -> Result<(), RuntimeError>;
}

/// Docker Engine implementation of [`ContainerRuntime`].
pub struct DockerRuntime {
    client: Docker,
}

impl DockerRuntime {
    /// Connect to the Docker socket at `socket`. The connection is lazy;
    /// a missing daemon surfaces on the first request.
    pub fn connect(socket: &str, timeout: Duration) -> Result<Self, RuntimeError> {
        let client = Docker::connect_with_socket(
            socket,
            timeout.as_secs().max(1),
            bollard::API_DEFAULT_VERSION,
        )
        .map_err(|e| RuntimeError::Connect(e.to_string()))?;
        debug!(%socket, "docker client configured");
        Ok(Self { client })
    }
}

fn request_error(name: &str, e: DockerError) -> RuntimeError {
    match e {
        DockerError::DockerResponseServerError {
            status_code: 404, ..
        } => RuntimeError::NotFound(name.to_string()),
        other => RuntimeError::Request {
            name: name.to_string(),
            message: other.to_string(),
        },
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn status(&self, name: &str) -> Result<ContainerStatus, RuntimeError> {
        match self
            .client
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
        {
            Ok(inspect) => {
                let running = inspect
                    .state
                    .as_ref()
                    .and_then(|s| s.running)
                    .unwrap_or(false);
                Ok(if running {
                    ContainerStatus::Running
                } else {
                    ContainerStatus::Stopped
                })
            }
            Err(e) => match request_error(name, e) {
                RuntimeError::NotFound(_) => Ok(ContainerStatus::Absent),
                other => Err(other),
            },
        }
    }

    async fn restart(&self, name: &str) -> Result<(), RuntimeError> {
        self.client
            .restart_container(name, None::<RestartContainerOptions>)
            .await
            .map_err(|e| request_error(name, e))
    }

    async fn start_service(&self, name: &str) -> Result<(), RuntimeError> {
        match self
            .client
            .start_container(name, None::<StartContainerOptions>)
            .await
        {
            Ok(()) => Ok(()),
            // 304: already started.
            Err(DockerError::DockerResponseServerError {
                status_code: 304, ..
            }) => Ok(()),
            Err(e) => Err(request_error(name, e)),
        }
    }
}

/// Stand-in used when the runtime cannot be reached at all. Every call
/// fails, so dependencies read as not running and remediation fails.
pub struct UnavailableRuntime {
    reason: String,
}

impl UnavailableRuntime {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn error(&self) -> RuntimeError {
        RuntimeError::Connect(self.reason.clone())
    }
}

#[async_trait]
impl ContainerRuntime for UnavailableRuntime {
    async fn status(&self, _name: &str) -> Result<ContainerStatus, RuntimeError> {
        Err(self.error())
    }

    async fn restart(&self, _name: &str) -> Result<(), RuntimeError> {
        Err(self.error())
    }

    async fn start_service(&self, _name: &str) -> Result<(), RuntimeError> {
        Err(self.error())
    }
}
