//! Persisted state types.

use serde::{Deserialize, Serialize};

/// Consecutive unhealthy verdicts since the last healthy verdict or the
/// last remediation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCounter {
    pub count: u32,
    /// Unix timestamp (seconds) of the last write.
    pub updated_at: u64,
}

impl FailureCounter {
    /// A counter stamped with the current time.
    pub fn now(count: u32) -> Self {
        Self {
            count,
            updated_at: epoch_secs(),
        }
    }
}

fn epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
