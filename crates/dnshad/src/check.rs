//! `dnshad check`: the failover engine's tracked script.

use std::path::Path;
use std::process::ExitCode;

use tracing::error;

use dnsha_health::{HookExit, PriorityHook};

use crate::node;

pub async fn run_check(config_path: &Path) -> ExitCode {
    ExitCode::from(evaluate_check(config_path).await.code())
}

/// Evaluate once and map the verdict to the hook's exit status. A node
/// that cannot even be configured is unhealthy.
pub async fn evaluate_check(config_path: &Path) -> HookExit {
    match hook(config_path) {
        Ok(hook) => hook.evaluate().await,
        Err(e) => {
            error!(error = %e, "priority hook cannot run, reporting unhealthy");
            HookExit::Unhealthy
        }
    }
}

fn hook(config_path: &Path) -> anyhow::Result<PriorityHook> {
    let config = node::load_config(config_path)?;
    let runtime = node::container_runtime(&config);
    let evaluator = node::evaluator(&config, runtime)?;
    Ok(PriorityHook::new(evaluator, config.hook.deadline()))
}
