//! dnsha-state: durable failure-counter state for dnsha.
//!
//! Backed by [redb](https://docs.rs/redb). One record per node holds the
//! number of consecutive unhealthy verdicts seen by the auto-heal
//! coordinator.
//!
//! # Concurrency
//!
//! redb takes an exclusive lock on the database file when it is opened.
//! A coordinator keeps the [`StateStore`] open for its whole invocation, so
//! an overlapping invocation on the same node fails with
//! [`StateError::Locked`] instead of racing on the counter. Every write is
//! an ACID transaction.
//!
//! # Fail-open reads
//!
//! [`FailureCounterStore::read`] never fails: a missing or corrupt record
//! reads as zero. [`StateStore::open_or_recover`] quarantines a database
//! file redb cannot open and starts from an empty one.

pub mod counter;
pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use counter::FailureCounterStore;
pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
