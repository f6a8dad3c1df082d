//! HTTP transport seam.
//!
//! [`SharqClient`](crate::SharqClient) builds an [`HttpRequest`] per operation
//! and hands it to a [`Transport`]. The default [`ReqwestTransport`] owns one
//! pooled `reqwest::Client`; tests substitute a mock to observe (or forbid)
//! network traffic.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde_json::Value;
use url::Url;

use crate::config::{ClientConfig, Credentials};
use crate::error::SharqError;

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;

/// HTTP methods used by the SharQ protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved request, ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    /// JSON body; `None` means the request carries no body and no
    /// `Content-Type` header.
    pub body: Option<Value>,
}

/// Raw response as received from the server.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

/// Sends requests to the SharQ server.
///
/// Implementations must return `Ok` for every response that arrived,
/// whatever its status code. `Err` is reserved for requests that produced no
/// response at all, or whose body could not be read.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a single request and wait for the complete response.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, SharqError>;
}

/// [`Transport`] backed by a pooled `reqwest::Client`.
///
/// Every request carries `Accept: application/json`. Requests with a body are
/// sent as JSON, which sets `Content-Type: application/json`. Configured
/// credentials are attached to every request.
///
/// `reqwest::Client` is internally reference counted and safe to use from
/// many tasks at once; clones of this transport share one connection pool.
#[derive(Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
    credentials: Option<Credentials>,
}

impl ReqwestTransport {
    /// Build a transport from client configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SharqError::Configuration`] if the HTTP client cannot be
    /// created.
    pub fn new(config: &ClientConfig) -> Result<Self, SharqError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| SharqError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            credentials: config.credentials.clone(),
        })
    }
}

impl fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("credentials", &self.credentials)
            .finish()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, SharqError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.http_client.get(request.url),
            HttpMethod::Post => self.http_client.post(request.url),
            HttpMethod::Delete => self.http_client.delete(request.url),
        };

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        builder = match &self.credentials {
            Some(Credentials::Basic { username, password }) => {
                builder.basic_auth(username, Some(password.expose_secret()))
            }
            Some(Credentials::Bearer { token }) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        };

        let response = builder.send().await.map_err(map_send_error)?;
        let status = response.status().as_u16();

        // The status is already known here, so a body read failure still
        // reports it.
        let body = response
            .bytes()
            .await
            .map_err(|e| SharqError::MalformedResponse {
                status,
                reason: format!("failed to read response body: {}", e),
            })?;

        Ok(HttpResponse { status, body })
    }
}

fn map_send_error(error: reqwest::Error) -> SharqError {
    if error.is_timeout() {
        SharqError::Timeout
    } else if error.is_connect() {
        SharqError::ConnectionFailed {
            message: error.to_string(),
        }
    } else {
        SharqError::Transport {
            message: error.to_string(),
        }
    }
}
