//! Auto-heal coordinator.
//!
//! One call to [`AutoHealCoordinator::run`] is one scheduled invocation:
//!
//! ```text
//! load count c (missing/corrupt → 0)
//! evaluate health
//!   healthy    → persist 0                      Healthy
//!   unhealthy  → c + 1 < threshold → persist c  Degraded(c)
//!              → c + 1 ≥ threshold → remediate  Remediating
//!                  restart primary container (if present)
//!                  start failover engine (if not running)
//!                  persist 0, whatever the outcomes
//! ```
//!
//! The count is reset even when every remediation action failed; the next
//! attempt comes `threshold` invocations later.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use dnsha_state::FailureCounterStore;

use crate::inspector::RunState;
use crate::runtime::ContainerRuntime;
use crate::verdict::{HealthEvaluator, HealthVerdict};

/// State reached by one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "count", rename_all = "snake_case")]
pub enum HealState {
    Healthy,
    Degraded(u32),
    /// Remediation ran; the persisted count is back to 0.
    Remediating,
}

/// Corrective step taken at the failure threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationKind {
    RestartContainer,
    StartService,
}

impl fmt::Display for RemediationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemediationKind::RestartContainer => f.write_str("restart_container"),
            RemediationKind::StartService => f.write_str("start_service"),
        }
    }
}

/// Result of one remediation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum RemediationOutcome {
    Ok,
    Failed(String),
    Skipped(String),
}

/// A remediation step and how it went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemediationAction {
    pub kind: RemediationKind,
    pub target: String,
    pub outcome: RemediationOutcome,
}

/// What one invocation saw and did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealReport {
    pub verdict: HealthVerdict,
    pub state: HealState,
    /// Count persisted at the end of the invocation.
    pub count: u32,
    pub actions: Vec<RemediationAction>,
}

/// Counts consecutive unhealthy invocations and remediates once the count
/// reaches the threshold.
pub struct AutoHealCoordinator {
    evaluator: Arc<HealthEvaluator>,
    runtime: Arc<dyn ContainerRuntime>,
    counter: FailureCounterStore,
    threshold: u32,
}

impl AutoHealCoordinator {
    /// A threshold of 0 is treated as 1.
    pub fn new(
        evaluator: Arc<HealthEvaluator>,
        runtime: Arc<dyn ContainerRuntime>,
        counter: FailureCounterStore,
        threshold: u32,
    ) -> Self {
        Self {
            evaluator,
            runtime,
            counter,
            threshold: threshold.max(1),
        }
    }

    /// Run one invocation. Never fails; every problem is logged.
    pub async fn run(&self) -> HealReport {
        let previous = self.counter.read();
        let report = self.evaluator.evaluate().await;
        let verdict = report.verdict;

        if verdict.healthy {
            self.persist(0);
            if previous > 0 {
                info!(node = %self.counter.node(), previous, "node recovered, failure count reset");
            }
            return HealReport {
                verdict,
                state: HealState::Healthy,
                count: 0,
                actions: Vec::new(),
            };
        }

        let count = previous.saturating_add(1);
        if count < self.threshold {
            self.persist(count);
            warn!(
                node = %self.counter.node(),
                count,
                threshold = self.threshold,
                reason = ?verdict.reason,
                "node degraded"
            );
            return HealReport {
                verdict,
                state: HealState::Degraded(count),
                count,
                actions: Vec::new(),
            };
        }

        warn!(
            node = %self.counter.node(),
            count,
            threshold = self.threshold,
            reason = ?verdict.reason,
            "failure threshold reached, remediating"
        );
        let actions = self.remediate().await;
        self.persist(0);

        HealReport {
            verdict,
            state: HealState::Remediating,
            count: 0,
            actions,
        }
    }

    async fn remediate(&self) -> Vec<RemediationAction> {
        let services = self.evaluator.services();
        let inspector = self.evaluator.inspector();
        let mut actions = Vec::new();

        let primary = &services.primary.container;
        let outcome = if inspector.is_present(primary).await {
            match self.runtime.restart(primary).await {
                Ok(()) => RemediationOutcome::Ok,
                Err(e) => RemediationOutcome::Failed(e.to_string()),
            }
        } else {
            RemediationOutcome::Skipped("container not present".to_string())
        };
        actions.push(log_action(RemediationAction {
            kind: RemediationKind::RestartContainer,
            target: primary.clone(),
            outcome,
        }));

        if let Some(engine) = &services.failover_engine {
            if inspector.is_running(&engine.container).await == RunState::NotRunning {
                let outcome = match self.runtime.start_service(&engine.container).await {
                    Ok(()) => RemediationOutcome::Ok,
                    Err(e) => RemediationOutcome::Failed(e.to_string()),
                };
                actions.push(log_action(RemediationAction {
                    kind: RemediationKind::StartService,
                    target: engine.container.clone(),
                    outcome,
                }));
            }
        }

        actions
    }

    fn persist(&self, count: u32) {
        if let Err(e) = self.counter.write(count) {
            error!(node = %self.counter.node(), count, error = %e, "failed to persist failure count");
        }
    }
}

fn log_action(action: RemediationAction) -> RemediationAction {
    match &action.outcome {
        RemediationOutcome::Ok => {
            info!(kind = %action.kind, target = %action.target, "remediation succeeded")
        }
        RemediationOutcome::Failed(reason) => {
            error!(kind = %action.kind, target = %action.target, %reason, "remediation failed")
        }
        RemediationOutcome::Skipped(reason) => {
            info!(kind = %action.kind, target = %action.target, %reason, "remediation skipped")
        }
    }
    action
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use dnsha_core::{NodeRole, ServiceSet};
    use dnsha_state::StateStore;

    use crate::probe::ProbeSettings;
    use crate::runtime::ContainerStatus;
    use crate::testing::{FakeRuntime, ScriptedQuery};
    use crate::verdict::VerdictReason;

    struct Harness {
        runtime: Arc<FakeRuntime>,
        counter: FailureCounterStore,
        coordinator: AutoHealCoordinator,
    }

    /// `script` is one probe result per invocation (single-attempt probe).
    fn harness(runtime: FakeRuntime, script: &[bool], threshold: u32) -> Harness {
        let runtime = Arc::new(runtime);
        let counter = FailureCounterStore::new(StateStore::open_in_memory().unwrap(), "dns1");
        let evaluator = HealthEvaluator::new(
            ServiceSet::defaults_for(NodeRole::Primary),
            runtime.clone(),
            Arc::new(ScriptedQuery::new(script)),
            ProbeSettings {
                resolver: "127.0.0.1:53".parse().unwrap(),
                domain: "example.org".to_string(),
                timeout: Duration::from_millis(200),
                attempts: 1,
                retry_delay: Duration::ZERO,
            },
        );
        let coordinator = AutoHealCoordinator::new(
            Arc::new(evaluator),
            runtime.clone(),
            counter.clone(),
            threshold,
        );
        Harness {
            runtime,
            counter,
            coordinator,
        }
    }

    fn running() -> FakeRuntime {
        FakeRuntime::new()
            .with("pihole_primary", ContainerStatus::Running)
            .with("unbound_primary", ContainerStatus::Running)
            .with("keepalived", ContainerStatus::Running)
    }

    #[tokio::test]
    async fn first_run_healthy_starts_at_zero() {
        let h = harness(running(), &[true], 3);
        let report = h.coordinator.run().await;

        assert_eq!(report.state, HealState::Healthy);
        assert_eq!(h.counter.read(), 0);
        assert!(h.runtime.calls().is_empty());
    }

    #[tokio::test]
    async fn unhealthy_then_healthy_resets_without_remediation() {
        let h = harness(running(), &[false, true], 3);

        let first = h.coordinator.run().await;
        assert_eq!(first.state, HealState::Degraded(1));
        assert_eq!(h.counter.read(), 1);

        let second = h.coordinator.run().await;
        assert_eq!(second.state, HealState::Healthy);
        assert_eq!(h.counter.read(), 0);
        assert!(h.runtime.calls().is_empty());
    }

    #[tokio::test]
    async fn threshold_two_remediates_exactly_once_on_second_run() {
        let h = harness(running(), &[false, false], 2);

        let first = h.coordinator.run().await;
        assert_eq!(first.state, HealState::Degraded(1));
        assert!(h.runtime.calls().is_empty());

        let second = h.coordinator.run().await;
        assert_eq!(second.state, HealState::Remediating);
        assert_eq!(h.runtime.calls(), vec!["restart:pihole_primary"]);
        assert_eq!(h.counter.read(), 0);
        assert_eq!(second.count, 0);
    }

    #[tokio::test]
    async fn counter_tracks_consecutive_failures_and_wraps_at_threshold() {
        let h = harness(running(), &[false; 7], 3);
        let mut counts = Vec::new();
        for _ in 0..7 {
            h.coordinator.run().await;
            counts.push(h.counter.read());
        }
        assert_eq!(counts, vec![1, 2, 0, 1, 2, 0, 1]);
        assert_eq!(h.runtime.calls().len(), 2);
    }

    #[tokio::test]
    async fn failed_restart_still_resets_counter() {
        let h = harness(running().failing_restarts(), &[false], 1);
        let report = h.coordinator.run().await;

        assert_eq!(report.state, HealState::Remediating);
        assert!(matches!(
            report.actions[0].outcome,
            RemediationOutcome::Failed(_)
        ));
        assert_eq!(h.counter.read(), 0);
    }

    #[tokio::test]
    async fn absent_primary_is_counted_and_restart_skipped() {
        let runtime = FakeRuntime::new()
            .with("unbound_primary", ContainerStatus::Running)
            .with("keepalived", ContainerStatus::Running);
        let h = harness(runtime, &[], 2);

        let first = h.coordinator.run().await;
        assert_eq!(first.verdict.reason, VerdictReason::PrimaryDependencyAbsent);
        assert_eq!(h.counter.read(), 1);

        let second = h.coordinator.run().await;
        assert_eq!(second.state, HealState::Remediating);
        assert_eq!(second.actions.len(), 1);
        assert_eq!(second.actions[0].kind, RemediationKind::RestartContainer);
        assert!(matches!(
            second.actions[0].outcome,
            RemediationOutcome::Skipped(_)
        ));
        assert!(h.runtime.calls().is_empty());
    }

    #[tokio::test]
    async fn stopped_primary_is_restarted() {
        let runtime = running();
        runtime.set("pihole_primary", ContainerStatus::Stopped);
        let h = harness(runtime, &[], 1);

        let report = h.coordinator.run().await;
        assert_eq!(report.actions[0].outcome, RemediationOutcome::Ok);
        assert_eq!(h.runtime.calls(), vec!["restart:pihole_primary"]);
    }

    #[tokio::test]
    async fn stopped_failover_engine_is_started() {
        let runtime = running();
        runtime.set("keepalived", ContainerStatus::Stopped);
        let h = harness(runtime, &[false], 1);

        let report = h.coordinator.run().await;
        assert_eq!(report.actions.len(), 2);
        assert_eq!(report.actions[1].kind, RemediationKind::StartService);
        assert_eq!(report.actions[1].target, "keepalived");
        assert_eq!(
            h.runtime.calls(),
            vec!["restart:pihole_primary", "start:keepalived"]
        );
    }

    #[tokio::test]
    async fn failed_restart_does_not_block_engine_start() {
        let runtime = running().failing_restarts();
        runtime.set("keepalived", ContainerStatus::Absent);
        let h = harness(runtime, &[false], 1);

        let report = h.coordinator.run().await;
        assert!(matches!(report.actions[0].outcome, RemediationOutcome::Failed(_)));
        assert_eq!(report.actions[1].outcome, RemediationOutcome::Ok);
        assert_eq!(h.counter.read(), 0);
    }

    #[tokio::test]
    async fn missing_counter_does_not_trigger_early_remediation() {
        let h = harness(running(), &[false], 2);
        assert!(h.counter.record().unwrap().is_none());

        let report = h.coordinator.run().await;
        assert_eq!(report.state, HealState::Degraded(1));
        assert!(h.runtime.calls().is_empty());
    }

    #[tokio::test]
    async fn lowered_threshold_remediates_on_next_failure() {
        let h = harness(running(), &[false], 2);
        h.counter.write(5).unwrap();

        let report = h.coordinator.run().await;
        assert_eq!(report.state, HealState::Remediating);
        assert_eq!(h.counter.read(), 0);
    }

    #[test]
    fn heal_state_serializes_with_count() {
        let json = serde_json::to_value(HealState::Degraded(2)).unwrap();
        assert_eq!(json["state"], "degraded");
        assert_eq!(json["count"], 2);
    }
}
