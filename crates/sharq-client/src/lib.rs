//! # SharQ Client
//!
//! Client library for [SharQ](https://github.com/plivo/sharq), a rate-limited
//! job queue server spoken to over JSON and HTTP.
//!
//! The library maps each server operation onto one HTTP request and hands
//! back the server's answer untouched:
//!
//! | Operation | Request |
//! |---|---|
//! | enqueue | `POST /enqueue/{queue_type}/{queue_id}/` |
//! | dequeue | `GET /dequeue/{queue_type}/` |
//! | finish | `POST /finish/{queue_type}/{queue_id}/{job_id}/` |
//! | interval | `POST /interval/{queue_type}/{queue_id}/` |
//! | metrics | `GET /metrics/[{queue_type}/[{queue_id}/]]` |
//! | delete_queue | `DELETE /deletequeue/{queue_type}/{queue_id}/` |
//!
//! Every call returns a [`Reply`], a `(status, JSON body)` pair. Missing
//! mandatory parameters are answered locally with `400` and
//! `{"status": "failure", "message": ...}`; transport faults are answered
//! with `{"error": ...}`. Queue semantics, rate limiting and retries are the
//! server's or the caller's business.
//!
//! # Examples
//!
//! ## Typed requests
//!
//! ```no_run
//! use sharq_client::{ClientConfig, DequeueRequest, FinishRequest, SharqClient};
//!
//! # async fn example() -> Result<(), sharq_client::SharqError> {
//! let client = SharqClient::new(ClientConfig::new("localhost").with_port(8080))?;
//!
//! let reply = client.dequeue(DequeueRequest::new("sms")).await;
//! if reply.is_success() {
//!     let job = reply.body();
//!     let finish = FinishRequest::new(
//!         "sms",
//!         job["queue_id"].as_str().unwrap_or_default(),
//!         job["job_id"].as_str().unwrap_or_default(),
//!     );
//!     client.finish(finish).await;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Parameter mappings
//!
//! ```no_run
//! use sharq_client::{ClientConfig, OperationKind, Params, SharqClient};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), sharq_client::SharqError> {
//! let client = SharqClient::new(ClientConfig::new("localhost"))?;
//!
//! let params: Params = serde_json::from_value(json!({
//!     "queue_type": "sms",
//!     "queue_id": "acct1",
//!     "payload": "x",
//! }))
//! .unwrap_or_default();
//!
//! let (status, body) = client.call(OperationKind::Enqueue, params).await.into_parts();
//! println!("{} {}", status, body);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod transport;

// Re-export commonly used types at crate root for convenience
pub use client::{
    DeleteQueueRequest, DequeueRequest, EnqueueRequest, FinishRequest, IntervalRequest,
    MetricsRequest, Operation, OperationKind, Params, Reply, Route, SharqClient,
    SharqClientBuilder, DEFAULT_QUEUE_TYPE,
};
pub use config::{ClientConfig, ClientConfigBuilder, Credentials, Scheme, SecretString};
pub use error::{SharqError, TRANSPORT_FAILURE_STATUS, VALIDATION_FAILURE_STATUS};
pub use transport::{HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport};
