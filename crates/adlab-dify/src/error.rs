//! Client error types.

use std::time::Duration;

use thiserror::Error;

/// Convenience alias for client results.
pub type Result<T> = std::result::Result<T, DifyError>;

/// Transport-level failure of a remote call.
///
/// Every variant carries the elapsed time up to the failure so stage
/// timings stay accurate. Transport failures are reported, never retried.
#[derive(Debug, Error)]
pub enum DifyError {
    /// Connection-level failure (DNS, TLS, reset, body read).
    #[error("request failed after {elapsed:?}: {source}")]
    Http {
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
        /// Time spent before the failure.
        elapsed: Duration,
    },
    /// Non-success HTTP status.
    #[error("service returned status {status} after {elapsed:?}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
        /// Time spent before the failure.
        elapsed: Duration,
    },
    /// The call did not complete within the configured timeout.
    #[error("request timed out after {elapsed:?}")]
    Timeout {
        /// Time spent before expiry.
        elapsed: Duration,
    },
}

impl DifyError {
    /// Elapsed time up to the failure.
    pub fn elapsed(&self) -> Duration {
        match self {
            Self::Http { elapsed, .. } | Self::Api { elapsed, .. } | Self::Timeout { elapsed } => {
                *elapsed
            }
        }
    }
}
