use crate::host::CallType;
use tokio_util::sync::CancellationToken;

/// Per-call statistics for observability.
#[derive(Debug, Clone)]
pub struct CallStats {
    pub call_type: CallType,
    /// Number of network attempts made, including the final one.
    pub attempts: u32,
    /// Hosts tried, in order. A host may appear more than once after a timeout.
    pub attempted_hosts: Vec<String>,
    /// Host that produced the final response.
    pub host: Option<String>,
    pub http_status: Option<u16>,
    pub duration_ms: u128,
    /// Correlation id sent as `x-client-request-id` on every attempt.
    pub client_request_id: String,
}

/// Cancels an in-flight logical call.
///
/// Cloning is cheap; every clone controls the same call(s).
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes once `cancel` has been called.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}
