//! dnsha.toml configuration parser.
//!
//! Every section is optional and defaulted, so an empty file (or no file at
//! the default location) yields a working primary-node configuration.
//! Durations are strings like `"2s"`, `"500ms"`, `"1m"`.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{NodeRole, ServiceDescriptor, ServiceRole, ServiceSet};

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/dnsha/dnsha.toml";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {}", .0.join("; "))]
    Validation(Vec<String>),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HaConfig {
    pub node: NodeConfig,
    /// Dependent services. Empty means the defaults for `node.role`.
    pub services: Vec<ServiceDescriptor>,
    pub probe: ProbeConfig,
    pub hook: HookConfig,
    pub heal: HealConfig,
    pub runtime: RuntimeConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub name: Option<String>,
    pub role: NodeRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Resolver to query, `ip` or `ip:port` (port 53 if omitted).
    pub resolver: String,
    pub domain: String,
    pub timeout: String,
    pub attempts: u32,
    pub retry_delay: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            resolver: "127.0.0.1:53".to_string(),
            domain: "google.com".to_string(),
            timeout: "2s".to_string(),
            attempts: 3,
            retry_delay: "1s".to_string(),
        }
    }
}

impl ProbeConfig {
    pub fn resolver_addr(&self) -> Option<SocketAddr> {
        parse_socket_addr(&self.resolver, 53)
    }

    pub fn timeout(&self) -> Duration {
        parse_duration(&self.timeout).unwrap_or(Duration::from_secs(2))
    }

    pub fn retry_delay(&self) -> Duration {
        parse_duration(&self.retry_delay).unwrap_or(Duration::from_secs(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    /// Wall-clock budget for one priority-hook evaluation.
    pub deadline: String,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            deadline: "10s".to_string(),
        }
    }
}

impl HookConfig {
    pub fn deadline(&self) -> Duration {
        parse_duration(&self.deadline).unwrap_or(Duration::from_secs(10))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealConfig {
    /// Consecutive unhealthy verdicts before remediation.
    pub threshold: u32,
    pub state_path: PathBuf,
}

impl Default for HealConfig {
    fn default() -> Self {
        Self {
            threshold: 3,
            state_path: PathBuf::from("/var/lib/dnsha/state.redb"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Docker API socket.
    pub socket: String,
    pub timeout: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            socket: "/var/run/docker.sock".to_string(),
            timeout: "10s".to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn timeout(&self) -> Duration {
        parse_duration(&self.timeout).unwrap_or(Duration::from_secs(10))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub listen: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8888".to_string(),
        }
    }
}

impl ApiConfig {
    pub fn listen_addr(&self) -> Option<SocketAddr> {
        self.listen.parse().ok()
    }
}

impl HaConfig {
    /// Read, parse, and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Like [`HaConfig::from_file`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: HaConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Node name used to key persisted state and label output.
    pub fn node_name(&self) -> String {
        match &self.node.name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => format!("dns-{}", self.node.role),
        }
    }

    /// Group the configured services by role.
    pub fn service_set(&self) -> Result<ServiceSet, ConfigError> {
        if self.services.is_empty() {
            return Ok(ServiceSet::defaults_for(self.node.role));
        }

        let mut errors = Vec::new();
        let mut primary = None;
        let mut secondary = None;
        let mut failover_engine = None;

        for svc in &self.services {
            if svc.container.trim().is_empty() {
                errors.push(format!("service '{}' has an empty container name", svc.name));
            }
            let slot = match svc.role {
                ServiceRole::Primary => &mut primary,
                ServiceRole::Secondary => &mut secondary,
                ServiceRole::FailoverEngine => &mut failover_engine,
            };
            if slot.is_some() {
                errors.push(format!("more than one service with role '{}'", svc.role));
            } else {
                *slot = Some(svc.clone());
            }
        }

        match primary {
            Some(primary) if errors.is_empty() => Ok(ServiceSet {
                primary,
                secondary,
                failover_engine,
            }),
            None => {
                errors.push("exactly one service must have role 'primary'".to_string());
                Err(ConfigError::Validation(errors))
            }
            Some(_) => Err(ConfigError::Validation(errors)),
        }
    }

    /// Semantic checks beyond what serde enforces.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.heal.threshold == 0 {
            errors.push("heal.threshold must be at least 1".to_string());
        }
        if self.probe.attempts == 0 {
            errors.push("probe.attempts must be at least 1".to_string());
        }
        if self.probe.domain.trim().is_empty() {
            errors.push("probe.domain must not be empty".to_string());
        }
        if self.probe.resolver_addr().is_none() {
            errors.push(format!("probe.resolver '{}' is not an address", self.probe.resolver));
        }
        if self.api.listen_addr().is_none() {
            errors.push(format!("api.listen '{}' is not a socket address", self.api.listen));
        }

        let durations = [
            ("probe.timeout", &self.probe.timeout),
            ("probe.retry_delay", &self.probe.retry_delay),
            ("hook.deadline", &self.hook.deadline),
            ("runtime.timeout", &self.runtime.timeout),
        ];
        for (field, value) in durations {
            if parse_duration(value).is_none() {
                errors.push(format!("{field} '{value}' is not a duration"));
            }
        }

        if let Err(ConfigError::Validation(service_errors)) = self.service_set() {
            errors.extend(service_errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Parse a duration string like "5s", "500ms", "1m".
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>().ok().map(|m| Duration::from_secs(m * 60))
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}

fn parse_socket_addr(s: &str, default_port: u16) -> Option<SocketAddr> {
    let s = s.trim();
    s.parse::<SocketAddr>()
        .ok()
        .or_else(|| s.parse::<IpAddr>().ok().map(|ip| SocketAddr::new(ip, default_port)))
}
