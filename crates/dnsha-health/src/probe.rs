//! Reachability probe.
//!
//! Queries a DNS resolver for a well-known domain with a bounded number of
//! sequential attempts. The first answer wins; only exhausting every
//! attempt reports [`ProbeOutcome::Unhealthy`]. Nothing is raised: timeouts
//! and resolution failures are both just a failed attempt.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{NameServerConfig, Protocol, ResolverConfig, ResolverOpts};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use dnsha_core::config::ProbeConfig;

/// Result of a full probe (all attempts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("query timed out after {0:?}")]
    Timeout(Duration),

    #[error("resolution failed: {0}")]
    Resolve(String),

    #[error("answer contained no addresses")]
    NoAnswer,
}

/// A single DNS query against a specific resolver.
#[async_trait]
pub trait DnsQuery: Send + Sync {
    /// Resolve `domain` via `resolver`, returning the number of addresses.
    async fn query(
        &self,
        resolver: SocketAddr,
        domain: &str,
        timeout: Duration,
    ) -> Result<usize, ProbeError>;
}

/// [`DnsQuery`] backed by hickory-resolver, talking only to the given
/// resolver with caching and the hosts file disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct HickoryQuery;

#[async_trait]
impl DnsQuery for HickoryQuery {
    async fn query(
        &self,
        resolver: SocketAddr,
        domain: &str,
        timeout: Duration,
    ) -> Result<usize, ProbeError> {
        let mut config = ResolverConfig::new();
        config.add_name_server(NameServerConfig::new(resolver, Protocol::Udp));

        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;
        opts.cache_size = 0;
        opts.use_hosts_file = false;

        let client = TokioAsyncResolver::tokio(config, opts);
        let lookup = tokio::time::timeout(timeout, client.lookup_ip(domain))
            .await
            .map_err(|_| ProbeError::Timeout(timeout))?
            .map_err(|e| ProbeError::Resolve(e.to_string()))?;

        match lookup.iter().count() {
            0 => Err(ProbeError::NoAnswer),
            n => Ok(n),
        }
    }
}

/// Where and how hard to probe.
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub resolver: SocketAddr,
    pub domain: String,
    pub timeout: Duration,
    pub attempts: u32,
    /// Sleep before every attempt except the first.
    pub retry_delay: Duration,
}

impl ProbeSettings {
    pub fn from_config(config: &ProbeConfig) -> Self {
        Self {
            resolver: config
                .resolver_addr()
                .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 53))),
            domain: config.domain.clone(),
            timeout: config.timeout(),
            attempts: config.attempts.max(1),
            retry_delay: config.retry_delay(),
        }
    }
}

/// Summary of one probe call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    pub outcome: ProbeOutcome,
    /// Attempts actually made.
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Retrying DNS reachability probe.
#[derive(Clone)]
pub struct ReachabilityProbe {
    query: Arc<dyn DnsQuery>,
    settings: ProbeSettings,
}

impl ReachabilityProbe {
    pub fn new(query: Arc<dyn DnsQuery>, settings: ProbeSettings) -> Self {
        Self { query, settings }
    }

    /// Run up to `attempts` sequential queries, stopping at the first success.
    pub async fn check(&self) -> ProbeReport {
        let s = &self.settings;
        let max_attempts = s.attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            if attempt > 1 && !s.retry_delay.is_zero() {
                tokio::time::sleep(s.retry_delay).await;
            }

            let started = Instant::now();
            // The outer timeout holds the bound even if the query ignores it.
            let result = match tokio::time::timeout(
                s.timeout,
                self.query.query(s.resolver, &s.domain, s.timeout),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(ProbeError::Timeout(s.timeout)),
            };
            let elapsed_ms = started.elapsed().as_millis() as u64;

            match result {
                Ok(addresses) => {
                    info!(
                        resolver = %s.resolver,
                        domain = %s.domain,
                        attempt,
                        max_attempts,
                        addresses,
                        elapsed_ms,
                        "dns probe attempt succeeded"
                    );
                    return ProbeReport {
                        outcome: ProbeOutcome::Healthy,
                        attempts: attempt,
                        last_error: None,
                    };
                }
                Err(e) => {
                    warn!(
                        resolver = %s.resolver,
                        domain = %s.domain,
                        attempt,
                        max_attempts,
                        elapsed_ms,
                        error = %e,
                        "dns probe attempt failed"
                    );
                    last_error = Some(e.to_string());
                }
            }
        }

        warn!(
            resolver = %s.resolver,
            domain = %s.domain,
            attempts = max_attempts,
            outcome = "unhealthy",
            "dns probe finished"
        );
        ProbeReport {
            outcome: ProbeOutcome::Unhealthy,
            attempts: max_attempts,
            last_error,
        }
    }
}
