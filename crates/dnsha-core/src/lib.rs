//! dnsha-core: configuration and shared types for the dnsha crates.
//!
//! A node is one half of a redundant DNS pair. It depends on a small,
//! statically configured set of services ([`ServiceDescriptor`]), each with
//! a [`ServiceRole`] that decides how its absence affects node health.

pub mod config;
pub mod types;

pub use config::{ConfigError, DEFAULT_CONFIG_PATH, HaConfig, parse_duration};
pub use types::*;
