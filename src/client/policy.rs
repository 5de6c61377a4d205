use crate::config::TransportConfig;
use crate::transport::{classify, HttpResponse, Outcome, StatusPolicy, TransportError};

/// Internal decision for how to proceed after an attempt.
#[derive(Debug)]
pub(crate) enum Decision {
    /// Return the response to the caller.
    Complete(HttpResponse),
    /// The host answered with an error; hand it to the caller untouched.
    Surface(HttpResponse),
    Abort,
    /// Try the next eligible host.
    Rotate(String),
    /// Attempt budget spent.
    GiveUp(String),
}

/// Internal policy engine for the rotation loop.
///
/// Important constraints:
/// - Only timeout and connectivity failures ever rotate.
/// - Prefer deterministic, explainable behavior over clever heuristics.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PolicyEngine {
    pub status_policy: StatusPolicy,
    pub max_attempts: u32,
}

impl PolicyEngine {
    pub fn new(config: &TransportConfig, host_count: usize) -> Self {
        Self {
            status_policy: StatusPolicy::new(config.retry_on_server_error),
            max_attempts: config.max_attempts_for(host_count),
        }
    }

    pub fn classify(&self, result: Result<HttpResponse, TransportError>) -> Outcome {
        classify(result, &self.status_policy)
    }

    /// Decide what to do after `attempts` attempts, the last of which produced `outcome`.
    pub fn decide(&self, outcome: Outcome, attempts: u32) -> Decision {
        match outcome {
            Outcome::Success(resp) => Decision::Complete(resp),
            Outcome::ApplicationError(resp) => Decision::Surface(resp),
            Outcome::Cancelled => Decision::Abort,
            Outcome::TransientFailure(reason) | Outcome::HardFailure(reason) => {
                if attempts >= self.max_attempts {
                    Decision::GiveUp(reason)
                } else {
                    Decision::Rotate(reason)
                }
            }
        }
    }
}
