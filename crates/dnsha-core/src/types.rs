//! Shared types used across dnsha crates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which half of the redundant pair this node is.
///
/// Supplied statically at startup; never inferred from addresses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    #[default]
    Primary,
    Secondary,
}

impl NodeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Primary => "primary",
            NodeRole::Secondary => "secondary",
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a dependent service affects the node's health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceRole {
    /// The resolver this node fronts. Absent means the node is unhealthy.
    Primary,
    /// Peer redundancy component. Absent is logged, never fatal.
    Secondary,
    /// The virtual-IP failover engine's own process.
    FailoverEngine,
}

impl ServiceRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceRole::Primary => "primary",
            ServiceRole::Secondary => "secondary",
            ServiceRole::FailoverEngine => "failover_engine",
        }
    }
}

impl fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dependent service and the container that runs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub name: String,
    pub role: ServiceRole,
    pub container: String,
}

impl ServiceDescriptor {
    pub fn new(name: &str, role: ServiceRole, container: &str) -> Self {
        Self {
            name: name.to_string(),
            role,
            container: container.to_string(),
        }
    }
}

/// The services one node depends on, grouped by role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSet {
    pub primary: ServiceDescriptor,
    pub secondary: Option<ServiceDescriptor>,
    pub failover_engine: Option<ServiceDescriptor>,
}

impl ServiceSet {
    /// Default services for a node: Pi-hole in front of Unbound, with
    /// keepalived holding the virtual address.
    pub fn defaults_for(role: NodeRole) -> Self {
        Self {
            primary: ServiceDescriptor::new(
                "pihole",
                ServiceRole::Primary,
                &format!("pihole_{role}"),
            ),
            secondary: Some(ServiceDescriptor::new(
                "unbound",
                ServiceRole::Secondary,
                &format!("unbound_{role}"),
            )),
            failover_engine: Some(ServiceDescriptor::new(
                "keepalived",
                ServiceRole::FailoverEngine,
                "keepalived",
            )),
        }
    }

    /// All descriptors, primary first.
    pub fn iter(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        std::iter::once(&self.primary)
            .chain(self.secondary.as_ref())
            .chain(self.failover_engine.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_node_role() {
        let set = ServiceSet::defaults_for(NodeRole::Secondary);
        assert_eq!(set.primary.container, "pihole_secondary");
        assert_eq!(set.secondary.unwrap().container, "unbound_secondary");
        assert_eq!(set.failover_engine.unwrap().container, "keepalived");
    }

    #[test]
    fn iter_yields_primary_first() {
        let set = ServiceSet::defaults_for(NodeRole::Primary);
        let roles: Vec<ServiceRole> = set.iter().map(|s| s.role).collect();
        assert_eq!(
            roles,
            vec![
                ServiceRole::Primary,
                ServiceRole::Secondary,
                ServiceRole::FailoverEngine
            ]
        );
    }
}
