use crate::client::credentials::Credentials;
use crate::client::policy::{Decision, PolicyEngine};
use crate::client::request::RequestDescriptor;
use crate::client::types::{CallStats, CancelHandle};
use crate::config::TransportConfig;
use crate::host::HostSnapshot;
use crate::resilience::RetryStrategy;
use crate::transport::{HttpRequest, HttpResponse, Outcome, Requester};
use crate::{Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Correlation header carried by every attempt of one logical call.
pub const CLIENT_REQUEST_ID_HEADER: &str = "x-client-request-id";

/// Host-rotating HTTP client.
///
/// Cheap to clone: every clone shares the same host health state, requester and
/// credentials, so one client can serve many concurrent tasks.
#[derive(Clone)]
pub struct HostClient {
    pub(crate) strategy: Arc<RetryStrategy>,
    pub(crate) requester: Arc<dyn Requester>,
    pub(crate) credentials: Arc<dyn Credentials>,
    pub(crate) config: Arc<TransportConfig>,
    pub(crate) policy: PolicyEngine,
    pub(crate) default_headers: HeaderMap,
    pub(crate) inflight: Option<Arc<Semaphore>>,
}

impl HostClient {
    /// Create a client for a catalog with env-derived configuration and the reqwest requester.
    pub fn new(catalog: crate::catalog::HostCatalog) -> Result<Self> {
        crate::client::builder::HostClientBuilder::new()
            .hosts(catalog)
            .build()
    }

    pub fn builder() -> crate::client::builder::HostClientBuilder {
        crate::client::builder::HostClientBuilder::new()
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn retry_strategy(&self) -> &Arc<RetryStrategy> {
        &self.strategy
    }

    /// Current health of every host, in catalog order.
    pub fn hosts(&self) -> Vec<HostSnapshot> {
        self.strategy.snapshot()
    }

    /// Execute a logical call, rotating hosts on timeout and connectivity failures.
    pub async fn execute(&self, descriptor: RequestDescriptor) -> Result<HttpResponse> {
        Ok(self.execute_with_stats(descriptor).await?.0)
    }

    /// Execute and decode a JSON response body.
    pub async fn execute_json<T: serde::de::DeserializeOwned>(
        &self,
        descriptor: RequestDescriptor,
    ) -> Result<T> {
        self.execute(descriptor).await?.json()
    }

    pub async fn execute_cancellable(
        &self,
        descriptor: RequestDescriptor,
        cancel: &CancelHandle,
    ) -> Result<HttpResponse> {
        Ok(self
            .execute_with_stats_cancellable(descriptor, cancel)
            .await?
            .0)
    }

    /// Execute and also return per-call stats (attempts, hosts tried, latency, request id).
    pub async fn execute_with_stats(
        &self,
        descriptor: RequestDescriptor,
    ) -> Result<(HttpResponse, CallStats)> {
        self.execute_with_stats_cancellable(descriptor, &CancelHandle::new())
            .await
    }

    pub async fn execute_with_stats_cancellable(
        &self,
        descriptor: RequestDescriptor,
        cancel: &CancelHandle,
    ) -> Result<(HttpResponse, CallStats)> {
        descriptor.validate()?;

        // Held for the whole logical call, across every attempt.
        let _permit = match &self.inflight {
            Some(sem) => tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                // The semaphore is never closed.
                permit = sem.clone().acquire_owned() => permit.ok(),
            },
            None => None,
        };

        let call_type = descriptor.call_type;
        let base_timeout = descriptor
            .timeout
            .unwrap_or_else(|| self.config.timeout_for(call_type));
        let client_request_id = Uuid::new_v4().to_string();
        let start = Instant::now();
        let mut attempted_hosts: Vec<String> = Vec::new();
        let mut attempts: u32 = 0;
        // Catalog indices attempted in the current pass over the eligible hosts.
        let mut tried: Vec<usize> = Vec::new();

        loop {
            if cancel.is_cancelled() {
                debug!(
                    client_request_id = client_request_id.as_str(),
                    attempts, "call cancelled before next attempt"
                );
                return Err(Error::Cancelled);
            }

            let host = match self.strategy.select_host_excluding(call_type, &tried) {
                Ok(host) => host,
                Err(_) => {
                    warn!(
                        call_type = %call_type,
                        attempts,
                        client_request_id = client_request_id.as_str(),
                        "no reachable hosts"
                    );
                    return Err(Error::NoReachableHosts {
                        call_type,
                        attempts,
                    });
                }
            };

            if tried.contains(&host.index) {
                debug!(
                    call_type = %call_type,
                    attempts,
                    client_request_id = client_request_id.as_str(),
                    "every eligible host tried, starting a new pass"
                );
                tried.clear();
            }
            tried.push(host.index);

            let timeout = host.timeout(base_timeout);
            let request = self.build_request(&descriptor, &host, timeout, &client_request_id);
            attempts = attempts.saturating_add(1);
            attempted_hosts.push(host.url.to_string());

            debug!(
                attempt = attempts,
                host = %host.url,
                call_type = %call_type,
                timeout_ms = timeout.as_millis() as u64,
                client_request_id = client_request_id.as_str(),
                "sending attempt"
            );

            // Dropping the requester future on cancellation aborts the network call.
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Outcome::Cancelled,
                result = self.requester.send(request) => self.policy.classify(result),
            };

            if outcome.affects_health() {
                self.strategy.notify(&host, &outcome);
            }

            match self.policy.decide(outcome, attempts) {
                Decision::Complete(resp) => {
                    info!(
                        http_status = resp.status,
                        host = %host.url,
                        attempts,
                        client_request_id = client_request_id.as_str(),
                        duration_ms = start.elapsed().as_millis() as u64,
                        "multihost request completed"
                    );
                    let stats = CallStats {
                        call_type,
                        attempts,
                        attempted_hosts,
                        host: Some(host.url.to_string()),
                        http_status: Some(resp.status),
                        duration_ms: start.elapsed().as_millis(),
                        client_request_id,
                    };
                    return Ok((resp, stats));
                }
                Decision::Surface(resp) => {
                    info!(
                        http_status = resp.status,
                        host = %host.url,
                        attempts,
                        client_request_id = client_request_id.as_str(),
                        duration_ms = start.elapsed().as_millis() as u64,
                        "multihost request failed"
                    );
                    return Err(Error::Remote {
                        status: resp.status,
                        host: host.url.to_string(),
                        message: resp.text(),
                    });
                }
                Decision::Abort => {
                    debug!(
                        host = %host.url,
                        attempts,
                        client_request_id = client_request_id.as_str(),
                        "call cancelled during attempt"
                    );
                    return Err(Error::Cancelled);
                }
                Decision::Rotate(reason) => {
                    debug!(
                        host = %host.url,
                        attempt = attempts,
                        reason = reason.as_str(),
                        "attempt failed, rotating host"
                    );
                }
                Decision::GiveUp(reason) => {
                    warn!(
                        attempts,
                        call_type = %call_type,
                        client_request_id = client_request_id.as_str(),
                        reason = reason.as_str(),
                        "attempt budget exhausted"
                    );
                    return Err(Error::AttemptsExhausted {
                        attempts,
                        last_failure: reason,
                    });
                }
            }
        }
    }

    /// Execute several calls concurrently with an optional concurrency limit.
    ///
    /// Results preserve input order.
    pub async fn execute_batch(
        &self,
        descriptors: Vec<RequestDescriptor>,
        concurrency_limit: Option<usize>,
    ) -> Vec<Result<HttpResponse>> {
        use futures::StreamExt;

        if descriptors.is_empty() {
            return Vec::new();
        }

        let limit = concurrency_limit.unwrap_or(10).max(1);
        let mut results: Vec<(usize, Result<HttpResponse>)> =
            futures::stream::iter(descriptors.into_iter().enumerate())
                .map(|(idx, descriptor)| async move { (idx, self.execute(descriptor).await) })
                .buffer_unordered(limit)
                .collect()
                .await;

        results.sort_by_key(|(idx, _)| *idx);
        results.into_iter().map(|(_, r)| r).collect()
    }

    /// Merge the descriptor onto a concrete host.
    ///
    /// Header precedence, lowest first: defaults, credentials, descriptor overrides.
    fn build_request(
        &self,
        descriptor: &RequestDescriptor,
        host: &HostSnapshot,
        timeout: Duration,
        client_request_id: &str,
    ) -> HttpRequest {
        // The host path is a prefix; the catalog guarantees there is no host query or fragment.
        let mut url = host.url.clone();
        let path = format!("{}{}", host.url.path().trim_end_matches('/'), descriptor.path);
        url.set_path(&path);
        url.set_query(None);
        url.set_fragment(None);
        if !descriptor.query.is_empty() {
            url.query_pairs_mut().extend_pairs(
                descriptor
                    .query
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str())),
            );
        }

        let mut headers = self.default_headers.clone();
        headers.extend(self.credentials.headers());
        headers.extend(descriptor.headers.clone());
        if let Ok(value) = HeaderValue::from_str(client_request_id) {
            headers.insert(HeaderName::from_static(CLIENT_REQUEST_ID_HEADER), value);
        }

        HttpRequest {
            method: descriptor.method.clone(),
            url,
            headers,
            body: descriptor.body.clone(),
            timeout,
        }
    }
}

impl std::fmt::Debug for HostClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostClient")
            .field("hosts", &self.strategy.len())
            .field("config", &self.config)
            .field("max_inflight", &self.inflight.is_some())
            .finish()
    }
}
