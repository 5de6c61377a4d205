use crate::catalog::HostCatalog;
use crate::client::core::HostClient;
use crate::client::credentials::{Credentials, NoCredentials};
use crate::client::policy::PolicyEngine;
use crate::config::{ClientConfig, TransportConfig};
use crate::resilience::RetryStrategy;
use crate::transport::{Requester, ReqwestRequester};
use crate::{Error, ErrorContext, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Builder for [`HostClient`].
///
/// Keep this surface area small and predictable. Anything not set explicitly falls
/// back to the environment (`MULTIHOST_HOSTS`, `MULTIHOST_*`).
pub struct HostClientBuilder {
    catalog: Option<HostCatalog>,
    config: Option<TransportConfig>,
    credentials: Arc<dyn Credentials>,
    requester: Option<Arc<dyn Requester>>,
    max_inflight: Option<usize>,
}

impl HostClientBuilder {
    pub fn new() -> Self {
        Self {
            catalog: None,
            config: None,
            credentials: Arc::new(NoCredentials),
            requester: None,
            max_inflight: None,
        }
    }

    /// Start from a loaded configuration file (hosts + transport knobs).
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let catalog = config.catalog()?;
        Ok(Self::new().hosts(catalog).config(config.transport))
    }

    pub fn hosts(mut self, catalog: HostCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn config(mut self, config: TransportConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn credentials(mut self, credentials: Arc<dyn Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Inject a requester. Default is a pooled reqwest client built from the config.
    pub fn requester(mut self, requester: Arc<dyn Requester>) -> Self {
        self.requester = Some(requester);
        self
    }

    /// Limit the number of logical calls in flight at once.
    /// Falls back to `MULTIHOST_MAX_INFLIGHT` when unset.
    pub fn max_inflight(mut self, n: usize) -> Self {
        self.max_inflight = Some(n.max(1));
        self
    }

    pub fn build(self) -> Result<HostClient> {
        let catalog = match self.catalog {
            Some(catalog) => catalog,
            None => HostCatalog::from_env()?,
        };
        let config = self.config.unwrap_or_else(TransportConfig::from_env);
        config.validate()?;

        let requester: Arc<dyn Requester> = match self.requester {
            Some(r) => r,
            None => Arc::new(ReqwestRequester::new(&config)?),
        };

        let mut default_headers = HeaderMap::new();
        let user_agent = HeaderValue::from_str(&config.user_agent).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid user agent '{}'", config.user_agent),
                ErrorContext::new()
                    .with_field_path("transport.user_agent")
                    .with_details(e.to_string())
                    .with_source("client_builder"),
            )
        })?;
        default_headers.insert(USER_AGENT, user_agent);
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let max_inflight = self.max_inflight.or_else(|| {
            std::env::var("MULTIHOST_MAX_INFLIGHT")
                .ok()?
                .trim()
                .parse::<usize>()
                .ok()
        });
        let inflight = max_inflight.map(|n| Arc::new(Semaphore::new(n.max(1))));

        let policy = PolicyEngine::new(&config, catalog.len());
        let strategy = Arc::new(RetryStrategy::new(&catalog, config.host_expiration()));

        tracing::debug!(
            hosts = catalog.len(),
            max_attempts = policy.max_attempts,
            retry_on_server_error = config.retry_on_server_error,
            "multihost client built"
        );

        Ok(HostClient {
            strategy,
            requester,
            credentials: self.credentials,
            config: Arc::new(config),
            policy,
            default_headers,
            inflight,
        })
    }
}

impl Default for HostClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
