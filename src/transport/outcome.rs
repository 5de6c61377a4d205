//! 结果分类：把异构的传输错误映射为统一的尝试结果。
//!
//! Attempt outcome classification.
//!
//! This is the only place that inspects transport-level errors and status codes. The
//! retry core works exclusively with [`Outcome`].

use super::requester::{HttpResponse, TransportError};

/// Result of a single attempt against a single host.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// 2xx response.
    Success(HttpResponse),
    /// The host answered with a non-retryable error response.
    ApplicationError(HttpResponse),
    /// Timeout-class: the attempt exceeded its deadline.
    TransientFailure(String),
    /// Connectivity-class: the host could not be reached or the exchange broke.
    HardFailure(String),
    Cancelled,
}

impl Outcome {
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Success(_) => "success",
            Outcome::ApplicationError(_) => "application_error",
            Outcome::TransientFailure(_) => "timeout",
            Outcome::HardFailure(_) => "unreachable",
            Outcome::Cancelled => "cancelled",
        }
    }

    /// Whether the transport loop should move on to another host.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Outcome::TransientFailure(_) | Outcome::HardFailure(_))
    }

    /// Whether this outcome says anything about the host's health.
    pub fn affects_health(&self) -> bool {
        matches!(self, Outcome::Success(_)) || self.is_recoverable()
    }
}

/// How HTTP statuses map onto outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusPolicy {
    /// When set, 5xx responses count as connectivity-class failures.
    pub retry_on_server_error: bool,
}

impl StatusPolicy {
    pub fn new(retry_on_server_error: bool) -> Self {
        Self {
            retry_on_server_error,
        }
    }
}

/// Map a raw requester result onto the outcome taxonomy.
pub fn classify(result: Result<HttpResponse, TransportError>, policy: &StatusPolicy) -> Outcome {
    match result {
        Ok(resp) if resp.is_success() => Outcome::Success(resp),
        Ok(resp) if policy.retry_on_server_error && (500..600).contains(&resp.status) => {
            Outcome::HardFailure(format!("server error: HTTP {}", resp.status))
        }
        Ok(resp) => Outcome::ApplicationError(resp),
        Err(e) if e.is_timeout() => Outcome::TransientFailure(e.to_string()),
        Err(e) => Outcome::HardFailure(e.to_string()),
    }
}
