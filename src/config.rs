//! Transport configuration.
//!
//! Defaults are production-friendly and env-overridable (`MULTIHOST_*`). A full client
//! configuration (hosts + transport knobs) can also be loaded from YAML or JSON.

use crate::catalog::{HostCatalog, HostConfig};
use crate::host::CallType;
use crate::resilience::DEFAULT_HOST_EXPIRATION;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Timeouts, host expiration and retry knobs. Durations are stored in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub connect_timeout_ms: u64,
    /// Base deadline for read calls, before per-host escalation.
    pub read_timeout_ms: u64,
    /// Base deadline for write calls, before per-host escalation.
    pub write_timeout_ms: u64,
    pub host_expiration_ms: u64,
    /// Attempt budget per logical call. `None` means three attempts per catalog host.
    pub max_attempts: Option<u32>,
    /// Treat 5xx responses as a connectivity-class failure and rotate hosts.
    pub retry_on_server_error: bool,
    pub user_agent: String,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout_secs: u64,
    pub proxy_url: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 2_000,
            read_timeout_ms: 5_000,
            write_timeout_ms: 30_000,
            host_expiration_ms: DEFAULT_HOST_EXPIRATION.as_millis() as u64,
            max_attempts: None,
            retry_on_server_error: false,
            user_agent: format!("multihost-transport/{}", env!("CARGO_PKG_VERSION")),
            pool_max_idle_per_host: 32,
            pool_idle_timeout_secs: 90,
            proxy_url: None,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.trim().parse::<T>().ok())
}

impl TransportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with `MULTIHOST_*` environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Override fields from the environment. Unparseable values are ignored.
    ///
    /// - `MULTIHOST_CONNECT_TIMEOUT_MS`
    /// - `MULTIHOST_READ_TIMEOUT_MS`
    /// - `MULTIHOST_WRITE_TIMEOUT_MS`
    /// - `MULTIHOST_HOST_EXPIRATION_SECS`
    /// - `MULTIHOST_MAX_ATTEMPTS`
    /// - `MULTIHOST_RETRY_ON_SERVER_ERROR` (`1`/`true`)
    /// - `MULTIHOST_POOL_MAX_IDLE_PER_HOST`
    /// - `MULTIHOST_POOL_IDLE_TIMEOUT_SECS`
    /// - `MULTIHOST_PROXY_URL`
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env_parse("MULTIHOST_CONNECT_TIMEOUT_MS") {
            self.connect_timeout_ms = v;
        }
        if let Some(v) = env_parse("MULTIHOST_READ_TIMEOUT_MS") {
            self.read_timeout_ms = v;
        }
        if let Some(v) = env_parse("MULTIHOST_WRITE_TIMEOUT_MS") {
            self.write_timeout_ms = v;
        }
        if let Some(secs) = env_parse::<u64>("MULTIHOST_HOST_EXPIRATION_SECS") {
            self.host_expiration_ms = secs.saturating_mul(1000);
        }
        if let Some(v) = env_parse::<u32>("MULTIHOST_MAX_ATTEMPTS").filter(|v| *v > 0) {
            self.max_attempts = Some(v);
        }
        if let Ok(v) = env::var("MULTIHOST_RETRY_ON_SERVER_ERROR") {
            self.retry_on_server_error = matches!(v.trim(), "1" | "true" | "TRUE" | "yes");
        }
        if let Some(v) = env_parse("MULTIHOST_POOL_MAX_IDLE_PER_HOST") {
            self.pool_max_idle_per_host = v;
        }
        if let Some(v) = env_parse("MULTIHOST_POOL_IDLE_TIMEOUT_SECS") {
            self.pool_idle_timeout_secs = v;
        }
        if let Ok(v) = env::var("MULTIHOST_PROXY_URL") {
            if !v.trim().is_empty() {
                self.proxy_url = Some(v);
            }
        }
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_host_expiration(mut self, expiration: Duration) -> Self {
        self.host_expiration_ms = expiration.as_millis() as u64;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts.max(1));
        self
    }

    pub fn with_retry_on_server_error(mut self, enable: bool) -> Self {
        self.retry_on_server_error = enable;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn host_expiration(&self) -> Duration {
        Duration::from_millis(self.host_expiration_ms)
    }

    /// Base deadline for a call type, before per-host escalation.
    pub fn timeout_for(&self, call_type: CallType) -> Duration {
        match call_type {
            CallType::Read => Duration::from_millis(self.read_timeout_ms),
            CallType::Write => Duration::from_millis(self.write_timeout_ms),
        }
    }

    pub fn max_attempts_for(&self, host_count: usize) -> u32 {
        self.max_attempts
            .unwrap_or_else(|| (host_count as u32).saturating_mul(3))
            .max(1)
    }

    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("transport.connect_timeout_ms", self.connect_timeout_ms),
            ("transport.read_timeout_ms", self.read_timeout_ms),
            ("transport.write_timeout_ms", self.write_timeout_ms),
        ];
        for (field, value) in checks {
            if value == 0 {
                return Err(Error::configuration_with_context(
                    "timeouts must be greater than zero",
                    ErrorContext::new()
                        .with_field_path(field)
                        .with_source("config_validator"),
                ));
            }
        }
        Ok(())
    }
}

/// Hosts plus transport knobs, as loaded from a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub hosts: Vec<HostConfig>,
    #[serde(default)]
    pub transport: TransportConfig,
}

impl ClientConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| {
            Error::configuration_with_context(
                "failed to parse client configuration YAML",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("config_loader"),
            )
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a `.json` file, or YAML for any other extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    pub fn catalog(&self) -> Result<HostCatalog> {
        HostCatalog::new(self.hosts.clone())
    }
}
