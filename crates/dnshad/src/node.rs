//! Assembly of the per-node components from configuration.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, warn};

use dnsha_core::{DEFAULT_CONFIG_PATH, HaConfig};
use dnsha_health::{
    ContainerRuntime, DockerRuntime, HealthEvaluator, HickoryQuery, ProbeSettings,
    UnavailableRuntime,
};
use dnsha_state::{StateError, StateStore};

/// Load the config. Only the default path may be missing.
pub fn load_config(path: &Path) -> anyhow::Result<HaConfig> {
    let config = if path == Path::new(DEFAULT_CONFIG_PATH) {
        HaConfig::load_or_default(path)?
    } else {
        HaConfig::from_file(path)?
    };
    debug!(path = %path.display(), node = %config.node_name(), "configuration loaded");
    Ok(config)
}

/// Docker client for the configured socket. An unreachable daemon yields
/// a runtime on which every call fails.
pub fn container_runtime(config: &HaConfig) -> Arc<dyn ContainerRuntime> {
    match DockerRuntime::connect(&config.runtime.socket, config.runtime.timeout()) {
        Ok(runtime) => Arc::new(runtime),
        Err(e) => {
            warn!(socket = %config.runtime.socket, error = %e, "container runtime unavailable");
            Arc::new(UnavailableRuntime::new(e.to_string()))
        }
    }
}

/// Health evaluator over the configured services.
pub fn evaluator(
    config: &HaConfig,
    runtime: Arc<dyn ContainerRuntime>,
) -> anyhow::Result<Arc<HealthEvaluator>> {
    let services = config.service_set()?;
    for service in services.iter() {
        debug!(service = %service.name, role = ?service.role, container = %service.container, "monitoring service");
    }
    Ok(Arc::new(HealthEvaluator::new(
        services,
        runtime,
        Arc::new(HickoryQuery),
        ProbeSettings::from_config(&config.probe),
    )))
}

/// Open the failure state store for a heal cycle.
///
/// `None` means another invocation holds the store and this cycle must be
/// skipped. A store that cannot be opened or recovered is replaced by an
/// in-memory one so the cycle still runs.
pub fn heal_store(path: &Path) -> Option<StateStore> {
    match StateStore::open_or_recover(path) {
        Ok(store) => Some(store),
        Err(StateError::Locked(path)) => {
            warn!(%path, "state store held by another heal cycle, skipping");
            None
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "state store unavailable, failure count will not persist");
            match StateStore::open_in_memory() {
                Ok(store) => Some(store),
                Err(e) => {
                    error!(error = %e, "in-memory state store failed");
                    None
                }
            }
        }
    }
}
