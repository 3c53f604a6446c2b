//! Fail-open access to one node's failure counter.

use tracing::warn;

use crate::error::StateResult;
use crate::store::StateStore;
use crate::types::FailureCounter;

/// The failure counter of a single node.
///
/// Reads never fail: anything short of a readable record is zero.
#[derive(Clone)]
pub struct FailureCounterStore {
    store: StateStore,
    node: String,
}

impl FailureCounterStore {
    pub fn new(store: StateStore, node: &str) -> Self {
        Self {
            store,
            node: node.to_string(),
        }
    }

    pub fn node(&self) -> &str {
        &self.node
    }

    /// Current count, or 0 when the record is missing or unreadable.
    pub fn read(&self) -> u32 {
        match self.store.get_counter(&self.node) {
            Ok(Some(counter)) => counter.count,
            Ok(None) => 0,
            Err(e) => {
                warn!(node = %self.node, error = %e, "failure counter unreadable, assuming 0");
                0
            }
        }
    }

    /// Persist a new count.
    pub fn write(&self, count: u32) -> StateResult<()> {
        self.store.put_counter(&self.node, &FailureCounter::now(count))
    }

    /// Full record, for status reporting.
    pub fn record(&self) -> StateResult<Option<FailureCounter>> {
        self.store.get_counter(&self.node)
    }

    /// Forget the counter (manual reset). Returns true if one existed.
    pub fn reset(&self) -> StateResult<bool> {
        self.store.delete_counter(&self.node)
    }
}
