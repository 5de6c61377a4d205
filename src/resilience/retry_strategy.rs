use crate::catalog::HostCatalog;
use crate::host::{CallType, Host, HostSnapshot};
use crate::transport::Outcome;
use crate::{Error, Result};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default time after which a host's health state is forgiven.
pub const DEFAULT_HOST_EXPIRATION: Duration = Duration::from_secs(5 * 60);

/// Shared owner of a host catalog's health state.
///
/// - One mutex guards the whole catalog, for reads and writes alike
/// - No I/O happens while the lock is held
/// - Membership and order never change after construction
pub struct RetryStrategy {
    hosts: Mutex<Vec<Host>>,
    expiration: Duration,
}

impl RetryStrategy {
    pub fn new(catalog: &HostCatalog, expiration: Duration) -> Self {
        Self::from_hosts(catalog.to_hosts(), expiration)
    }

    pub fn from_hosts(hosts: Vec<Host>, expiration: Duration) -> Self {
        Self {
            hosts: Mutex::new(hosts),
            expiration,
        }
    }

    pub fn expiration(&self) -> Duration {
        self.expiration
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Every mutation is a plain field assignment that cannot panic halfway, so a
    // poisoned lock still guards a consistent catalog.
    fn lock(&self) -> MutexGuard<'_, Vec<Host>> {
        self.hosts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hosts that may serve `call_type` right now, in priority order.
    pub fn eligible_hosts(&self, call_type: CallType) -> Vec<HostSnapshot> {
        self.eligible_hosts_at(call_type, Instant::now())
    }

    /// Resets every expired host, then filters by scope and health.
    pub fn eligible_hosts_at(&self, call_type: CallType, now: Instant) -> Vec<HostSnapshot> {
        let mut hosts = self.lock();
        for host in hosts.iter_mut() {
            if host.is_expired(now, self.expiration) {
                if !host.is_up() || host.retry_count() > 0 {
                    debug!(
                        host = %host.url(),
                        was_up = host.is_up(),
                        retry_count = host.retry_count(),
                        "host state expired, resetting"
                    );
                }
                host.reset(now);
            }
        }
        hosts
            .iter()
            .enumerate()
            .filter(|(_, h)| h.is_up() && h.accepts(call_type))
            .map(|(idx, h)| h.snapshot(idx))
            .collect()
    }

    pub fn select_host(&self, call_type: CallType) -> Result<HostSnapshot> {
        self.select_host_at(call_type, Instant::now())
    }

    /// First eligible host, or `NoReachableHosts` when there is none.
    pub fn select_host_at(&self, call_type: CallType, now: Instant) -> Result<HostSnapshot> {
        self.eligible_hosts_at(call_type, now)
            .into_iter()
            .next()
            .ok_or(Error::NoReachableHosts {
                call_type,
                attempts: 0,
            })
    }

    /// First eligible host whose catalog index is not in `tried`.
    ///
    /// When every eligible host has been tried, the first eligible host is returned, so a
    /// caller sees an index already in `tried` exactly when a new pass over the catalog starts.
    pub fn select_host_excluding(
        &self,
        call_type: CallType,
        tried: &[usize],
    ) -> Result<HostSnapshot> {
        self.select_host_excluding_at(call_type, tried, Instant::now())
    }

    pub fn select_host_excluding_at(
        &self,
        call_type: CallType,
        tried: &[usize],
        now: Instant,
    ) -> Result<HostSnapshot> {
        let mut eligible = self.eligible_hosts_at(call_type, now).into_iter();
        let first = eligible.next().ok_or(Error::NoReachableHosts {
            call_type,
            attempts: 0,
        })?;
        if !tried.contains(&first.index) {
            return Ok(first);
        }
        Ok(eligible
            .find(|h| !tried.contains(&h.index))
            .unwrap_or(first))
    }

    /// Apply the health consequence of an attempt against `host`.
    ///
    /// Application errors and cancellations leave the host untouched.
    pub fn notify(&self, host: &HostSnapshot, outcome: &Outcome) {
        self.notify_at(host, outcome, Instant::now())
    }

    pub fn notify_at(&self, host: &HostSnapshot, outcome: &Outcome, now: Instant) {
        let mut hosts = self.lock();
        let Some(target) = hosts.get_mut(host.index) else {
            warn!(index = host.index, host = %host.url, "notify for unknown host ignored");
            return;
        };

        match outcome {
            Outcome::Success(_) => target.reset(now),
            Outcome::TransientFailure(reason) => {
                target.record_timeout(now);
                warn!(
                    host = %target.url(),
                    retry_count = target.retry_count(),
                    outcome = outcome.kind(),
                    reason = reason.as_str(),
                    "host timed out, escalating its deadline"
                );
            }
            Outcome::HardFailure(reason) => {
                target.record_failure(now);
                warn!(
                    host = %target.url(),
                    outcome = outcome.kind(),
                    reason = reason.as_str(),
                    "host unreachable, marking down"
                );
            }
            Outcome::ApplicationError(_) | Outcome::Cancelled => {}
        }
    }

    /// Manual reset of every host back to `Up(0)`.
    pub fn reset_all(&self) {
        let now = Instant::now();
        for host in self.lock().iter_mut() {
            host.reset(now);
        }
    }

    /// Current state of every host in catalog order. Does not apply expiration.
    pub fn snapshot(&self) -> Vec<HostSnapshot> {
        self.lock()
            .iter()
            .enumerate()
            .map(|(idx, h)| h.snapshot(idx))
            .collect()
    }
}
