//! redb table definitions for the dnsha state store.

use redb::TableDefinition;

/// Failure counters keyed by node name, JSON-serialized [`crate::FailureCounter`].
pub const FAILURE_COUNTERS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("failure_counters");
