//! Error types for SharQ client operations.
//!
//! [`SharqError`] covers three classes of failure:
//!
//! - **Validation**: a request could not be built from the caller's
//!   parameters. Detected before any network I/O and reported to the caller as
//!   a `400` [`Reply`](crate::Reply), never as a hard error.
//! - **Transport**: the request was attempted but no usable JSON response came
//!   back. Reported as a [`Reply`](crate::Reply) carrying
//!   `{"error": <reason>}`.
//! - **Configuration**: the client itself could not be constructed. This is
//!   the only class returned as an `Err` to the caller.

use thiserror::Error;

/// Status code used in replies when no HTTP response was received at all.
pub const TRANSPORT_FAILURE_STATUS: u16 = 0;

/// Status code used in replies for locally rejected requests.
pub const VALIDATION_FAILURE_STATUS: u16 = 400;

/// Comprehensive error type for SharQ client operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SharqError {
    /// A mandatory parameter was absent from the request parameters.
    #[error("`{parameter}` is a mandatory parameter")]
    MissingParameter { parameter: String },

    /// A metrics request named a queue id but no queue type.
    #[error("`queue_id` should be accompanied by `queue_type`.")]
    QueueIdWithoutQueueType,

    /// A parameter was present but had an unusable JSON type.
    #[error("`{parameter}` must be {expected}")]
    InvalidParameter {
        parameter: String,
        expected: &'static str,
    },

    /// The client configuration is unusable.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The server could not be reached.
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    /// The request did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// Any other failure while sending the request or reading the response.
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The server answered, but the body was not valid JSON.
    #[error("Malformed response (status {status}): {reason}")]
    MalformedResponse { status: u16, reason: String },
}

impl SharqError {
    /// Shorthand for [`SharqError::MissingParameter`].
    pub fn missing(parameter: impl Into<String>) -> Self {
        Self::MissingParameter {
            parameter: parameter.into(),
        }
    }

    /// Shorthand for [`SharqError::InvalidParameter`].
    pub fn invalid(parameter: impl Into<String>, expected: &'static str) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            expected,
        }
    }

    /// Whether the error was detected locally, before any request was sent.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter { .. }
                | Self::QueueIdWithoutQueueType
                | Self::InvalidParameter { .. }
        )
    }

    /// Whether the error arose while talking to the server.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. }
                | Self::Timeout
                | Self::Transport { .. }
                | Self::MalformedResponse { .. }
        )
    }

    /// Check if the error is transient and a caller-side retry may succeed.
    ///
    /// The client itself never retries; this is only a hint for callers that
    /// implement their own resilience policy.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::MissingParameter { .. } => false,
            Self::QueueIdWithoutQueueType => false,
            Self::InvalidParameter { .. } => false,
            Self::Configuration { .. } => false,
            Self::ConnectionFailed { .. } => true,
            Self::Timeout => true,
            Self::Transport { .. } => true,
            Self::MalformedResponse { status, .. } => *status >= 500 || *status == 429,
        }
    }

    /// Status code a [`Reply`](crate::Reply) built from this error carries.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MalformedResponse { status, .. } => *status,
            e if e.is_validation() => VALIDATION_FAILURE_STATUS,
            _ => TRANSPORT_FAILURE_STATUS,
        }
    }

    /// Short reason placed in the `error` field of a transport failure reply.
    pub fn reason(&self) -> String {
        match self {
            Self::MalformedResponse { reason, .. } => reason.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
