//! Failure state commands: `heal`, `status`, `reset`.

use std::path::Path;

use serde_json::{Value, json};
use tracing::{error, info, warn};

use dnsha_health::{AutoHealCoordinator, HealReport, HealState};
use dnsha_state::{FailureCounterStore, StateStore};

use crate::node;

/// One auto-heal cycle. Problems are logged; the caller always exits 0.
///
/// Returns `None` when the cycle was skipped.
pub async fn run_heal(config_path: &Path) -> Option<HealReport> {
    let config = match node::load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "heal cycle skipped: configuration unusable");
            return None;
        }
    };

    // Held until the end of the cycle; blocks overlapping invocations.
    let store = node::heal_store(&config.heal.state_path)?;

    let runtime = node::container_runtime(&config);
    let evaluator = match node::evaluator(&config, runtime.clone()) {
        Ok(evaluator) => evaluator,
        Err(e) => {
            error!(error = %e, "heal cycle skipped: service configuration invalid");
            return None;
        }
    };

    let node_name = config.node_name();
    let counter = FailureCounterStore::new(store, &node_name);
    let coordinator = AutoHealCoordinator::new(evaluator, runtime, counter, config.heal.threshold);
    let report = coordinator.run().await;

    match report.state {
        HealState::Remediating => warn!(
            node = %node_name,
            actions = report.actions.len(),
            "heal cycle finished with remediation"
        ),
        state => info!(node = %node_name, ?state, count = report.count, "heal cycle finished"),
    }
    Some(report)
}

/// Print the persisted failure counter(s) as JSON.
pub fn run_status(config_path: &Path, all: bool) -> anyhow::Result<()> {
    let output = status_report(config_path, all)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// This node's counter as `{node, count, updated_at, threshold}`, or every
/// counter in the store. A missing store reads as zero and is not created.
pub fn status_report(config_path: &Path, all: bool) -> anyhow::Result<Value> {
    let config = node::load_config(config_path)?;
    let node_name = config.node_name();
    let threshold = config.heal.threshold;
    let path = &config.heal.state_path;

    if !path.exists() {
        return Ok(if all {
            json!([])
        } else {
            json!({ "node": node_name, "count": 0, "updated_at": null, "threshold": threshold })
        });
    }

    let store = StateStore::open(path)?;
    if all {
        let counters: Vec<_> = store
            .list_counters()?
            .into_iter()
            .map(|(node, c)| json!({ "node": node, "count": c.count, "updated_at": c.updated_at }))
            .collect();
        return Ok(json!(counters));
    }

    let record = FailureCounterStore::new(store, &node_name).record()?;
    Ok(json!({
        "node": node_name,
        "count": record.map(|c| c.count).unwrap_or(0),
        "updated_at": record.map(|c| c.updated_at),
        "threshold": threshold,
    }))
}

/// Forget this node's failure counter. Returns true if one was recorded.
pub fn run_reset(config_path: &Path) -> anyhow::Result<bool> {
    let config = node::load_config(config_path)?;
    let node_name = config.node_name();
    let path = &config.heal.state_path;
    if !path.exists() {
        info!(node = %node_name, "no state store, nothing to reset");
        return Ok(false);
    }

    let counter = FailureCounterStore::new(StateStore::open(path)?, &node_name);
    let removed = counter.reset()?;
    if removed {
        info!(node = %node_name, "failure counter reset");
    } else {
        info!(node = %node_name, "no failure counter recorded");
    }
    Ok(removed)
}
