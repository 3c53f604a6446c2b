//! Failover priority hook.
//!
//! The failover engine runs this as its tracked check script and turns
//! the exit code into a priority-weight adjustment. Read-only: it never
//! touches the failure counter or the runtime's containers.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::verdict::HealthEvaluator;

/// Exit status understood by the failover engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookExit {
    Healthy = 0,
    Unhealthy = 1,
}

impl HookExit {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Read-only health check run by the failover engine.
pub struct PriorityHook {
    evaluator: Arc<HealthEvaluator>,
    /// An evaluation still running at the deadline counts as unhealthy.
    deadline: Duration,
}

impl PriorityHook {
    pub fn new(evaluator: Arc<HealthEvaluator>, deadline: Duration) -> Self {
        Self {
            evaluator,
            deadline,
        }
    }

    /// Evaluate once within the deadline. Touches no persisted state.
    pub async fn evaluate(&self) -> HookExit {
        match tokio::time::timeout(self.deadline, self.evaluator.evaluate()).await {
            Ok(report) if report.verdict.healthy => {
                info!(reason = ?report.verdict.reason, exit = 0, "priority hook: healthy");
                HookExit::Healthy
            }
            Ok(report) => {
                warn!(reason = ?report.verdict.reason, exit = 1, "priority hook: unhealthy");
                HookExit::Unhealthy
            }
            Err(_) => {
                warn!(
                    deadline_ms = self.deadline.as_millis() as u64,
                    exit = 1,
                    "priority hook: evaluation exceeded deadline"
                );
                HookExit::Unhealthy
            }
        }
    }
}
