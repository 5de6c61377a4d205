//! 主机模型：端点身份与可变的健康状态。
//!
//! Host identity plus health state.
//!
//! A [`Host`] never performs I/O. Its transitions are driven exclusively by
//! [`RetryStrategy`](crate::resilience::RetryStrategy), which holds every host of a
//! catalog behind a single lock.
//!
//! ```text
//! Up(0) --timeout--> Up(1) --timeout--> Up(2) ...
//! Up(n) --hard failure--> Down
//! Down  --expiration / reset--> Up(0)
//! any   --success--> Up(0)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use url::Url;

/// Classification of an operation, used to filter eligible hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    Read,
    Write,
}

impl CallType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallType::Read => "read",
            CallType::Write => "write",
        }
    }
}

impl fmt::Display for CallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One candidate endpoint with mutable health state.
#[derive(Debug, Clone)]
pub struct Host {
    url: Url,
    scope: Option<CallType>,
    is_up: bool,
    last_updated: Instant,
    retry_count: u32,
}

impl Host {
    /// A fresh host starts `Up` with no recorded timeouts.
    pub fn new(url: Url, scope: Option<CallType>) -> Self {
        Self {
            url,
            scope,
            is_up: true,
            last_updated: Instant::now(),
            retry_count: 0,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// `None` means the host serves both reads and writes.
    pub fn scope(&self) -> Option<CallType> {
        self.scope
    }

    pub fn is_up(&self) -> bool {
        self.is_up
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn last_updated(&self) -> Instant {
        self.last_updated
    }

    pub fn accepts(&self, call_type: CallType) -> bool {
        self.scope.map_or(true, |scope| scope == call_type)
    }

    pub fn reset(&mut self, now: Instant) {
        self.is_up = true;
        self.retry_count = 0;
        self.last_updated = now;
    }

    /// The host stays eligible; only its next deadline grows.
    pub fn record_timeout(&mut self, now: Instant) {
        self.is_up = true;
        self.retry_count = self.retry_count.saturating_add(1);
        self.last_updated = now;
    }

    pub fn record_failure(&mut self, now: Instant) {
        self.is_up = false;
        self.last_updated = now;
    }

    pub fn is_expired(&self, now: Instant, expiration: Duration) -> bool {
        now.saturating_duration_since(self.last_updated) > expiration
    }

    /// Deadline for the next attempt against this host: `base * (retry_count + 1)`.
    pub fn timeout(&self, base: Duration) -> Duration {
        escalate(base, self.retry_count)
    }

    pub(crate) fn snapshot(&self, index: usize) -> HostSnapshot {
        HostSnapshot {
            index,
            url: self.url.clone(),
            scope: self.scope,
            is_up: self.is_up,
            retry_count: self.retry_count,
            last_updated: self.last_updated,
        }
    }
}

fn escalate(base: Duration, retry_count: u32) -> Duration {
    base.saturating_mul(retry_count.saturating_add(1))
}

/// Point-in-time copy of a host's state, tagged with its catalog position.
///
/// Returned by selection and fed back into `notify`; it is never written through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSnapshot {
    pub index: usize,
    pub url: Url,
    pub scope: Option<CallType>,
    pub is_up: bool,
    pub retry_count: u32,
    pub last_updated: Instant,
}

impl HostSnapshot {
    /// Same escalation rule as [`Host::timeout`], using the captured retry count.
    pub fn timeout(&self, base: Duration) -> Duration {
        escalate(base, self.retry_count)
    }
}
