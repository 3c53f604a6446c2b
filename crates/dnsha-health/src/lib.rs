//! dnsha-health: health evaluation and failover coordination for a DNS node.
//!
//! # Architecture
//!
//! ```text
//! PriorityHook ─────────┐              (read-only, exit 0/1)
//!                       ▼
//! AutoHealCoordinator → HealthEvaluator
//!   │                     ├── DependencyInspector → ContainerRuntime
//!   │                     └── ReachabilityProbe   → DnsQuery
//!   ├── FailureCounterStore (dnsha-state)
//!   └── ContainerRuntime (restart / start_service)
//! ```
//!
//! Both entry points share one evaluation path. The runtime and DNS seams are traits; [`DockerRuntime`] and
//! [`HickoryQuery`] are the production implementations.

pub mod coordinator;
pub mod hook;
pub mod inspector;
pub mod probe;
pub mod runtime;
pub mod verdict;

#[cfg(test)]
mod testing;

pub use coordinator::{
    AutoHealCoordinator, HealReport, HealState, RemediationAction, RemediationKind,
    RemediationOutcome,
};
pub use hook::{HookExit, PriorityHook};
pub use inspector::{DependencyInspector, RunState};
pub use probe::{
    DnsQuery, HickoryQuery, ProbeError, ProbeOutcome, ProbeReport, ProbeSettings,
    ReachabilityProbe,
};
pub use runtime::{
    ContainerRuntime, ContainerStatus, DockerRuntime, RuntimeError, UnavailableRuntime,
};
pub use verdict::{DependencyReport, HealthEvaluator, HealthReport, HealthVerdict, VerdictReason};
