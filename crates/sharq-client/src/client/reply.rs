//! Uniform result of a SharQ operation.

use serde_json::{json, Value};

use crate::error::SharqError;

#[cfg(test)]
#[path = "reply_tests.rs"]
mod tests;

/// Status code and decoded JSON body of one operation.
///
/// Every call on [`SharqClient`](crate::SharqClient) produces a `Reply`,
/// whatever happened:
///
/// | Outcome | `status()` | `body()` |
/// |---|---|---|
/// | Server answered with JSON | server status, verbatim | server JSON, verbatim |
/// | Rejected locally | `400` | `{"status": "failure", "message": ...}` |
/// | Server answered with a non-JSON body | server status | `{"error": <reason phrase>}` |
/// | No response received | `0` | `{"error": <reason>}` |
///
/// The last three carry the underlying [`SharqError`] in `failure()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    status: u16,
    body: Value,
    failure: Option<SharqError>,
}

impl Reply {
    /// A decoded server response, passed through unchanged.
    pub fn from_server(status: u16, body: Value) -> Self {
        Self {
            status,
            body,
            failure: None,
        }
    }

    /// A reply for a failure that happened in the client.
    ///
    /// Validation errors produce the `400` failure payload; everything else
    /// produces `{"error": reason}` with the best-known status.
    pub fn from_error(error: SharqError) -> Self {
        let body = if error.is_validation() {
            json!({
                "status": "failure",
                "message": error.to_string(),
            })
        } else {
            json!({ "error": error.reason() })
        };

        Self {
            status: error.status_code(),
            body,
            failure: Some(error),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn into_body(self) -> Value {
        self.body
    }

    /// The `(status_code, body)` pair.
    pub fn into_parts(self) -> (u16, Value) {
        (self.status, self.body)
    }

    /// The server answered with a 2xx status and a JSON body.
    pub fn is_success(&self) -> bool {
        self.failure.is_none() && (200..300).contains(&self.status)
    }

    /// The client-side error behind this reply, if any.
    pub fn failure(&self) -> Option<&SharqError> {
        self.failure.as_ref()
    }

    /// The request was rejected before anything was sent.
    pub fn is_local_failure(&self) -> bool {
        self.failure.as_ref().is_some_and(SharqError::is_validation)
    }

    /// The request was attempted but no usable JSON response came back.
    pub fn is_transport_failure(&self) -> bool {
        self.failure.as_ref().is_some_and(SharqError::is_transport)
    }
}

impl From<SharqError> for Reply {
    fn from(error: SharqError) -> Self {
        Self::from_error(error)
    }
}
