//! SharQ API client.
//!
//! [`SharqClient`] turns an [`Operation`] into one HTTP request against the
//! configured server and returns a [`Reply`]. Server responses are passed
//! through unchanged, whatever their status. Local validation failures and
//! transport faults are folded into the same `Reply` shape; nothing is
//! retried.

mod operations;
mod reply;

use std::fmt;
use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::SharqError;
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

pub use operations::{
    DeleteQueueRequest, DequeueRequest, EnqueueRequest, FinishRequest, IntervalRequest,
    MetricsRequest, Operation, OperationKind, Params, Route, DEFAULT_QUEUE_TYPE,
};
pub use reply::Reply;

/// Client for a single SharQ server.
///
/// Construct once per server and reuse. Each call awaits one complete HTTP
/// round trip (or its timeout) and holds no state between calls.
///
/// # Concurrency
///
/// `SharqClient` is `Clone + Send + Sync`. Clones share one transport and, with
/// the default [`ReqwestTransport`], one `reqwest::Client` connection pool.
/// Concurrent calls through the same instance are safe exactly as far as the
/// transport is: `reqwest::Client` documents itself as safe to share across
/// tasks. A custom [`Transport`] must provide the same guarantee.
///
/// # Examples
///
/// ```no_run
/// use sharq_client::{ClientConfig, EnqueueRequest, SharqClient};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), sharq_client::SharqError> {
/// let client = SharqClient::new(ClientConfig::new("queue.internal").with_port(8080))?;
///
/// let reply = client
///     .enqueue(
///         EnqueueRequest::new("sms", "acct1")
///             .job_id("job-1")
///             .payload(json!({ "to": "+15550100" }))
///             .interval(1000u64),
///     )
///     .await;
///
/// let (status, body) = reply.into_parts();
/// println!("{} {}", status, body);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SharqClient {
    config: ClientConfig,
    base_url: String,
    endpoint: Url,
    transport: Arc<dyn Transport>,
}

impl SharqClient {
    /// Create a client using the default reqwest transport.
    ///
    /// # Errors
    ///
    /// Returns [`SharqError::Configuration`] if the configuration is invalid
    /// or the HTTP client cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self, SharqError> {
        Self::builder(config).build()
    }

    /// Create a new builder for constructing a SharQ client.
    pub fn builder(config: ClientConfig) -> SharqClientBuilder {
        SharqClientBuilder::new(config)
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Base URL in the form `scheme://host:port`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Enqueue a job. Sends `POST /enqueue/{queue_type}/{queue_id}/` with the
    /// request body as JSON.
    pub async fn enqueue(&self, request: EnqueueRequest) -> Reply {
        self.execute(request.into()).await
    }

    /// Dequeue a job. Sends `GET /dequeue/{queue_type}/`.
    pub async fn dequeue(&self, request: DequeueRequest) -> Reply {
        self.execute(request.into()).await
    }

    /// Mark a job finished. Sends
    /// `POST /finish/{queue_type}/{queue_id}/{job_id}/`.
    pub async fn finish(&self, request: FinishRequest) -> Reply {
        self.execute(request.into()).await
    }

    /// Update a queue's interval. Sends
    /// `POST /interval/{queue_type}/{queue_id}/` with `{"interval": ...}`.
    pub async fn interval(&self, request: IntervalRequest) -> Reply {
        self.execute(request.into()).await
    }

    /// Fetch metrics. Sends `GET /metrics/`, `/metrics/{queue_type}/` or
    /// `/metrics/{queue_type}/{queue_id}/`.
    pub async fn metrics(&self, request: MetricsRequest) -> Reply {
        self.execute(request.into()).await
    }

    /// Delete a queue. Sends `DELETE /deletequeue/{queue_type}/{queue_id}/`
    /// with `{"purge_all": ...}` plus any extra body keys.
    pub async fn delete_queue(&self, request: DeleteQueueRequest) -> Reply {
        self.execute(request.into()).await
    }

    /// Run an operation described by name and a parameter mapping.
    ///
    /// Missing or malformed parameters produce a `400` reply and no request.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use sharq_client::{OperationKind, Params, SharqClient};
    /// # async fn example(client: &SharqClient) {
    /// let mut params = Params::new();
    /// params.insert("queue_id".into(), "acct1".into());
    ///
    /// let (status, body) = client.call(OperationKind::Metrics, params).await.into_parts();
    /// assert_eq!(status, 400);
    /// assert_eq!(body["message"], "`queue_id` should be accompanied by `queue_type`.");
    /// # }
    /// ```
    pub async fn call(&self, kind: OperationKind, params: Params) -> Reply {
        match Operation::from_params(kind, params) {
            Ok(operation) => self.execute(operation).await,
            Err(e) => {
                warn!(operation = %kind, error = %e, "Rejected SharQ request");
                Reply::from_error(e)
            }
        }
    }

    /// Run a tagged operation.
    pub async fn execute(&self, operation: Operation) -> Reply {
        let kind = operation.kind();

        let request = match self.prepare(&operation) {
            Ok(request) => request,
            Err(e) => {
                warn!(operation = %kind, error = %e, "Rejected SharQ request");
                return Reply::from_error(e);
            }
        };

        debug!(
            operation = %kind,
            method = %request.method,
            url = %request.url,
            "Sending SharQ request"
        );

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(operation = %kind, error = %e, "SharQ request failed");
                return Reply::from_error(e);
            }
        };

        debug!(operation = %kind, status = response.status, "Received SharQ response");

        match decode_body(&response) {
            Ok(body) => Reply::from_server(response.status, body),
            Err(e) => {
                warn!(operation = %kind, error = %e, "SharQ response was not JSON");
                Reply::from_error(e)
            }
        }
    }

    /// Resolve an operation into a request against this client's server.
    pub fn prepare(&self, operation: &Operation) -> Result<HttpRequest, SharqError> {
        let route = operation.route()?;

        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| SharqError::Configuration {
                message: format!("'{}' cannot be used as a base URL", self.base_url),
            })?
            .clear()
            .extend(&route.segments)
            .push("");

        Ok(HttpRequest {
            method: route.method,
            url,
            body: route.body,
        })
    }
}

impl fmt::Debug for SharqClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharqClient")
            .field("config", &self.config)
            .field("transport", &"<Transport>")
            .finish()
    }
}

/// Decode a response body as JSON.
///
/// Non-JSON bodies (including empty ones) fail with the status's reason
/// phrase for error statuses and the decode error for successful ones.
fn decode_body(response: &HttpResponse) -> Result<Value, SharqError> {
    serde_json::from_slice(&response.body).map_err(|e| {
        let reason = StatusCode::from_u16(response.status)
            .ok()
            .filter(|status| !status.is_success())
            .and_then(|status| status.canonical_reason())
            .map(str::to_string)
            .unwrap_or_else(|| format!("response body is not valid JSON: {}", e));

        SharqError::MalformedResponse {
            status: response.status,
            reason,
        }
    })
}

/// Builder for constructing `SharqClient` instances.
pub struct SharqClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
}

impl SharqClientBuilder {
    fn new(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
        }
    }

    /// Use a custom transport instead of [`ReqwestTransport`].
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Build the SharQ client.
    ///
    /// # Errors
    ///
    /// Returns [`SharqError::Configuration`] if the configuration is invalid
    /// or the default HTTP transport cannot be created.
    pub fn build(self) -> Result<SharqClient, SharqError> {
        self.config.validate()?;

        let base_url = self.config.base_url();
        let endpoint = Url::parse(&base_url).map_err(|e| SharqError::Configuration {
            message: format!("invalid base URL '{}': {}", base_url, e),
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(SharqError::Configuration {
                message: format!("'{}' cannot be used as a base URL", base_url),
            });
        }

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&self.config)?),
        };

        Ok(SharqClient {
            config: self.config,
            base_url,
            endpoint,
            transport,
        })
    }
}

impl fmt::Debug for SharqClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharqClientBuilder")
            .field("config", &self.config)
            .field("custom_transport", &self.transport.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
