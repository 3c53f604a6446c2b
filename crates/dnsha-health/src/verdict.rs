//! Composed health evaluation.
//!
//! Order is fixed: the primary dependency first (absent is fatal and the
//! probe is skipped), then the secondary dependency (logged only), then
//! the reachability probe, whose outcome decides the verdict.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use dnsha_core::{ServiceDescriptor, ServiceRole, ServiceSet};

use crate::inspector::{DependencyInspector, RunState};
use crate::probe::{DnsQuery, ProbeOutcome, ProbeReport, ProbeSettings, ReachabilityProbe};
use crate::runtime::ContainerRuntime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictReason {
    Healthy,
    ProbeFailed,
    PrimaryDependencyAbsent,
    /// Healthy, but the secondary dependency is not running.
    SecondaryDependencyAbsent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthVerdict {
    pub healthy: bool,
    pub reason: VerdictReason,
}

impl HealthVerdict {
    fn from_reason(reason: VerdictReason) -> Self {
        let healthy = matches!(
            reason,
            VerdictReason::Healthy | VerdictReason::SecondaryDependencyAbsent
        );
        Self { healthy, reason }
    }
}

/// Observed state of one dependency during an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyReport {
    pub name: String,
    pub role: ServiceRole,
    pub container: String,
    pub state: RunState,
}

impl DependencyReport {
    fn new(svc: &ServiceDescriptor, state: RunState) -> Self {
        Self {
            name: svc.name.clone(),
            role: svc.role,
            container: svc.container.clone(),
            state,
        }
    }
}

/// Everything one evaluation looked at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub verdict: HealthVerdict,
    pub dependencies: Vec<DependencyReport>,
    /// `None` when the probe was skipped.
    pub probe: Option<ProbeReport>,
}

/// Evaluates the local node's health from its dependencies and a probe.
#[derive(Clone)]
pub struct HealthEvaluator {
    services: ServiceSet,
    inspector: DependencyInspector,
    probe: ReachabilityProbe,
}

impl HealthEvaluator {
    /// Evaluator for `services`, inspecting through `runtime` and probing
    /// DNS through `query`.
    pub fn new(
        services: ServiceSet,
        runtime: Arc<dyn ContainerRuntime>,
        query: Arc<dyn DnsQuery>,
        settings: ProbeSettings,
    ) -> Self {
        Self {
            services,
            inspector: DependencyInspector::new(runtime),
            probe: ReachabilityProbe::new(query, settings),
        }
    }

    /// The services this evaluator watches.
    pub fn services(&self) -> &ServiceSet {
        &self.services
    }

    pub fn inspector(&self) -> &DependencyInspector {
        &self.inspector
    }

    /// Run state of the primary dependency alone.
    pub async fn primary_state(&self) -> RunState {
        self.inspector.is_running(&self.services.primary.container).await
    }

    /// Inspect every dependency, then probe DNS if the primary is running.
    /// Never fails; problems surface in the verdict.
    pub async fn evaluate(&self) -> HealthReport {
        let primary = &self.services.primary;
        let primary_state = self.primary_state().await;
        let mut dependencies = vec![DependencyReport::new(primary, primary_state)];

        if primary_state == RunState::NotRunning {
            warn!(
                service = %primary.name,
                container = %primary.container,
                "primary dependency not running, node unhealthy"
            );
            return HealthReport {
                verdict: HealthVerdict::from_reason(VerdictReason::PrimaryDependencyAbsent),
                dependencies,
                probe: None,
            };
        }

        let mut secondary_absent = false;
        if let Some(secondary) = &self.services.secondary {
            let state = self.inspector.is_running(&secondary.container).await;
            if state == RunState::NotRunning {
                warn!(
                    service = %secondary.name,
                    container = %secondary.container,
                    "secondary dependency not running, continuing degraded"
                );
                secondary_absent = true;
            }
            dependencies.push(DependencyReport::new(secondary, state));
        }

        let probe = self.probe.check().await;
        let reason = match (probe.outcome, secondary_absent) {
            (ProbeOutcome::Unhealthy, _) => VerdictReason::ProbeFailed,
            (ProbeOutcome::Healthy, true) => VerdictReason::SecondaryDependencyAbsent,
            (ProbeOutcome::Healthy, false) => VerdictReason::Healthy,
        };
        let verdict = HealthVerdict::from_reason(reason);

        info!(healthy = verdict.healthy, reason = ?verdict.reason, "health evaluated");
        HealthReport {
            verdict,
            dependencies,
            probe: Some(probe),
        }
    }
}
