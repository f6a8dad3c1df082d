//! Request records for each SharQ operation.
//!
//! Every operation has an explicit request struct. Mandatory parameters are
//! plain fields, optional ones are `Option` or defaulted, and keys forwarded
//! verbatim to the server live in an auxiliary [`Params`] map.
//!
//! Callers holding a dynamic parameter mapping go through
//! [`Operation::from_params`], which applies the mandatory-parameter checks
//! in protocol order: the first absent key names the error.

use std::fmt;
use std::str::FromStr;

use serde_json::{Number, Value};

use crate::error::SharqError;
use crate::transport::HttpMethod;

#[cfg(test)]
#[path = "operations_tests.rs"]
mod tests;

/// Named request parameters, as JSON values.
pub type Params = serde_json::Map<String, Value>;

/// Queue type used by `dequeue` when none is given.
pub const DEFAULT_QUEUE_TYPE: &str = "default";

const SEGMENT_EXPECTED: &str = "a non-empty string or a number";

/// The operations understood by the SharQ server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Enqueue,
    Dequeue,
    Finish,
    Interval,
    Metrics,
    DeleteQueue,
}

impl OperationKind {
    /// Every operation, in protocol order.
    pub const ALL: [OperationKind; 6] = [
        Self::Enqueue,
        Self::Dequeue,
        Self::Finish,
        Self::Interval,
        Self::Metrics,
        Self::DeleteQueue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enqueue => "enqueue",
            Self::Dequeue => "dequeue",
            Self::Finish => "finish",
            Self::Interval => "interval",
            Self::Metrics => "metrics",
            Self::DeleteQueue => "delete_queue",
        }
    }

    /// Mandatory parameters, in the order they are checked.
    pub fn mandatory_parameters(&self) -> &'static [&'static str] {
        match self {
            Self::Enqueue => &["queue_type", "queue_id"],
            Self::Dequeue => &[],
            Self::Finish => &["queue_type", "queue_id", "job_id"],
            Self::Interval => &["queue_type", "queue_id", "interval"],
            Self::Metrics => &[],
            Self::DeleteQueue => &["queue_type", "queue_id"],
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = SharqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enqueue" => Ok(Self::Enqueue),
            "dequeue" => Ok(Self::Dequeue),
            "finish" => Ok(Self::Finish),
            "interval" => Ok(Self::Interval),
            "metrics" => Ok(Self::Metrics),
            "delete_queue" | "deletequeue" | "delete-queue" => Ok(Self::DeleteQueue),
            _ => Err(SharqError::invalid(
                "operation",
                "one of enqueue, dequeue, finish, interval, metrics, delete_queue",
            )),
        }
    }
}

/// Method, path segments and body of one protocol request.
///
/// Segments are joined onto the base URL by the client; the path always ends
/// with a trailing slash.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub method: HttpMethod,
    pub segments: Vec<String>,
    pub body: Option<Value>,
}

impl Route {
    /// Path as sent to the server, before percent-encoding.
    pub fn path(&self) -> String {
        let mut path = String::from("/");
        for segment in &self.segments {
            path.push_str(segment);
            path.push('/');
        }
        path
    }
}

// ============================================================================
// Request records
// ============================================================================

/// Enqueue a job on `queue_type`/`queue_id`.
///
/// `body` is sent as the JSON request body. The SharQ server reads `job_id`,
/// `payload`, `interval` and `requeue_limit` from it; the client forwards
/// whatever keys are present.
#[derive(Debug, Clone, PartialEq)]
pub struct EnqueueRequest {
    pub queue_type: String,
    pub queue_id: String,
    pub body: Params,
}

impl EnqueueRequest {
    pub fn new(queue_type: impl Into<String>, queue_id: impl Into<String>) -> Self {
        Self {
            queue_type: queue_type.into(),
            queue_id: queue_id.into(),
            body: Params::new(),
        }
    }

    /// Add an arbitrary body field.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.body.insert(key.into(), value.into());
        self
    }

    pub fn job_id(self, job_id: impl Into<String>) -> Self {
        self.field("job_id", job_id.into())
    }

    pub fn payload(self, payload: impl Into<Value>) -> Self {
        self.field("payload", payload)
    }

    pub fn interval(self, interval: impl Into<Number>) -> Self {
        self.field("interval", Value::Number(interval.into()))
    }

    pub fn requeue_limit(self, requeue_limit: i64) -> Self {
        self.field("requeue_limit", requeue_limit)
    }

    /// Build from a parameter mapping. `queue_type` and `queue_id` become
    /// path components; every other key becomes part of the body.
    pub fn from_params(mut params: Params) -> Result<Self, SharqError> {
        ensure_present(&params, OperationKind::Enqueue)?;
        let queue_type = take_segment(&mut params, "queue_type")?;
        let queue_id = take_segment(&mut params, "queue_id")?;
        Ok(Self {
            queue_type,
            queue_id,
            body: params,
        })
    }

    fn route(&self) -> Result<Route, SharqError> {
        Ok(Route {
            method: HttpMethod::Post,
            segments: vec![
                "enqueue".to_string(),
                segment("queue_type", &self.queue_type)?,
                segment("queue_id", &self.queue_id)?,
            ],
            body: Some(Value::Object(self.body.clone())),
        })
    }
}

/// Dequeue the next ready job of a queue type.
#[derive(Debug, Clone, PartialEq)]
pub struct DequeueRequest {
    pub queue_type: String,
}

impl Default for DequeueRequest {
    fn default() -> Self {
        Self {
            queue_type: DEFAULT_QUEUE_TYPE.to_string(),
        }
    }
}

impl DequeueRequest {
    pub fn new(queue_type: impl Into<String>) -> Self {
        Self {
            queue_type: queue_type.into(),
        }
    }

    /// Build from a parameter mapping. An absent, null or empty `queue_type`
    /// falls back to [`DEFAULT_QUEUE_TYPE`]; other keys are ignored.
    pub fn from_params(mut params: Params) -> Result<Self, SharqError> {
        let queue_type = take_optional_segment(&mut params, "queue_type")?
            .unwrap_or_else(|| DEFAULT_QUEUE_TYPE.to_string());
        Ok(Self { queue_type })
    }

    fn route(&self) -> Result<Route, SharqError> {
        Ok(Route {
            method: HttpMethod::Get,
            segments: vec![
                "dequeue".to_string(),
                segment("queue_type", &self.queue_type)?,
            ],
            body: None,
        })
    }
}

/// Mark a dequeued job as successfully processed.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishRequest {
    pub queue_type: String,
    pub queue_id: String,
    pub job_id: String,
}

impl FinishRequest {
    pub fn new(
        queue_type: impl Into<String>,
        queue_id: impl Into<String>,
        job_id: impl Into<String>,
    ) -> Self {
        Self {
            queue_type: queue_type.into(),
            queue_id: queue_id.into(),
            job_id: job_id.into(),
        }
    }

    pub fn from_params(mut params: Params) -> Result<Self, SharqError> {
        ensure_present(&params, OperationKind::Finish)?;
        Ok(Self {
            queue_type: take_segment(&mut params, "queue_type")?,
            queue_id: take_segment(&mut params, "queue_id")?,
            job_id: take_segment(&mut params, "job_id")?,
        })
    }

    fn route(&self) -> Result<Route, SharqError> {
        Ok(Route {
            method: HttpMethod::Post,
            segments: vec![
                "finish".to_string(),
                segment("queue_type", &self.queue_type)?,
                segment("queue_id", &self.queue_id)?,
                segment("job_id", &self.job_id)?,
            ],
            body: None,
        })
    }
}

/// Change the dequeue interval of a queue.
///
/// The interval is opaque to the client; SharQ interprets it in
/// milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalRequest {
    pub queue_type: String,
    pub queue_id: String,
    pub interval: Number,
}

impl IntervalRequest {
    pub fn new(
        queue_type: impl Into<String>,
        queue_id: impl Into<String>,
        interval: impl Into<Number>,
    ) -> Self {
        Self {
            queue_type: queue_type.into(),
            queue_id: queue_id.into(),
            interval: interval.into(),
        }
    }

    pub fn from_params(mut params: Params) -> Result<Self, SharqError> {
        ensure_present(&params, OperationKind::Interval)?;
        let queue_type = take_segment(&mut params, "queue_type")?;
        let queue_id = take_segment(&mut params, "queue_id")?;
        let interval = match take_present(&mut params, "interval") {
            Some(Value::Number(interval)) => interval,
            Some(_) => return Err(SharqError::invalid("interval", "a number")),
            None => return Err(SharqError::missing("interval")),
        };
        Ok(Self {
            queue_type,
            queue_id,
            interval,
        })
    }

    fn route(&self) -> Result<Route, SharqError> {
        let mut body = Params::new();
        body.insert("interval".to_string(), Value::Number(self.interval.clone()));
        Ok(Route {
            method: HttpMethod::Post,
            segments: vec![
                "interval".to_string(),
                segment("queue_type", &self.queue_type)?,
                segment("queue_id", &self.queue_id)?,
            ],
            body: Some(Value::Object(body)),
        })
    }
}

/// Fetch server-wide, per-type or per-queue metrics.
///
/// A `queue_id` is only meaningful together with a `queue_type`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsRequest {
    pub queue_type: Option<String>,
    pub queue_id: Option<String>,
}

impl MetricsRequest {
    /// Server-wide metrics.
    pub fn global() -> Self {
        Self::default()
    }

    /// Metrics for every queue of one type.
    pub fn for_type(queue_type: impl Into<String>) -> Self {
        Self {
            queue_type: Some(queue_type.into()),
            queue_id: None,
        }
    }

    /// Metrics for one queue.
    pub fn for_queue(queue_type: impl Into<String>, queue_id: impl Into<String>) -> Self {
        Self {
            queue_type: Some(queue_type.into()),
            queue_id: Some(queue_id.into()),
        }
    }

    /// Build from a parameter mapping. Null or empty values count as absent.
    pub fn from_params(mut params: Params) -> Result<Self, SharqError> {
        let queue_type = take_optional_segment(&mut params, "queue_type")?;
        let queue_id = take_optional_segment(&mut params, "queue_id")?;
        if queue_type.is_none() && queue_id.is_some() {
            return Err(SharqError::QueueIdWithoutQueueType);
        }
        Ok(Self {
            queue_type,
            queue_id,
        })
    }

    fn route(&self) -> Result<Route, SharqError> {
        let queue_type = self.queue_type.as_deref().filter(|s| !s.is_empty());
        let queue_id = self.queue_id.as_deref().filter(|s| !s.is_empty());

        let mut segments = vec!["metrics".to_string()];
        match (queue_type, queue_id) {
            (None, None) => {}
            (Some(queue_type), None) => segments.push(segment("queue_type", queue_type)?),
            (None, Some(_)) => return Err(SharqError::QueueIdWithoutQueueType),
            (Some(queue_type), Some(queue_id)) => {
                segments.push(segment("queue_type", queue_type)?);
                segments.push(segment("queue_id", queue_id)?);
            }
        }

        Ok(Route {
            method: HttpMethod::Get,
            segments,
            body: None,
        })
    }
}

/// Delete a queue, optionally purging its in-flight jobs.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteQueueRequest {
    pub queue_type: String,
    pub queue_id: String,
    pub purge_all: bool,
    /// Extra keys sent alongside `purge_all`.
    pub body: Params,
}

impl DeleteQueueRequest {
    pub fn new(queue_type: impl Into<String>, queue_id: impl Into<String>) -> Self {
        Self {
            queue_type: queue_type.into(),
            queue_id: queue_id.into(),
            purge_all: false,
            body: Params::new(),
        }
    }

    pub fn purge_all(mut self, purge_all: bool) -> Self {
        self.purge_all = purge_all;
        self
    }

    pub fn from_params(mut params: Params) -> Result<Self, SharqError> {
        ensure_present(&params, OperationKind::DeleteQueue)?;
        let queue_type = take_segment(&mut params, "queue_type")?;
        let queue_id = take_segment(&mut params, "queue_id")?;
        let purge_all = match take_present(&mut params, "purge_all") {
            None => false,
            Some(Value::Bool(purge_all)) => purge_all,
            Some(_) => return Err(SharqError::invalid("purge_all", "a boolean")),
        };
        Ok(Self {
            queue_type,
            queue_id,
            purge_all,
            body: params,
        })
    }

    fn route(&self) -> Result<Route, SharqError> {
        let mut body = self.body.clone();
        body.insert("purge_all".to_string(), Value::Bool(self.purge_all));
        Ok(Route {
            method: HttpMethod::Delete,
            segments: vec![
                "deletequeue".to_string(),
                segment("queue_type", &self.queue_type)?,
                segment("queue_id", &self.queue_id)?,
            ],
            body: Some(Value::Object(body)),
        })
    }
}

// ============================================================================
// Tagged operation
// ============================================================================

/// One SharQ operation with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Enqueue(EnqueueRequest),
    Dequeue(DequeueRequest),
    Finish(FinishRequest),
    Interval(IntervalRequest),
    Metrics(MetricsRequest),
    DeleteQueue(DeleteQueueRequest),
}

impl Operation {
    /// Build an operation of `kind` from a parameter mapping.
    ///
    /// # Errors
    ///
    /// Returns a validation [`SharqError`] naming the first missing mandatory
    /// parameter, a parameter of the wrong JSON type, or (for metrics) a
    /// `queue_id` given without `queue_type`.
    pub fn from_params(kind: OperationKind, params: Params) -> Result<Self, SharqError> {
        Ok(match kind {
            OperationKind::Enqueue => Self::Enqueue(EnqueueRequest::from_params(params)?),
            OperationKind::Dequeue => Self::Dequeue(DequeueRequest::from_params(params)?),
            OperationKind::Finish => Self::Finish(FinishRequest::from_params(params)?),
            OperationKind::Interval => Self::Interval(IntervalRequest::from_params(params)?),
            OperationKind::Metrics => Self::Metrics(MetricsRequest::from_params(params)?),
            OperationKind::DeleteQueue => {
                Self::DeleteQueue(DeleteQueueRequest::from_params(params)?)
            }
        })
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Enqueue(_) => OperationKind::Enqueue,
            Self::Dequeue(_) => OperationKind::Dequeue,
            Self::Finish(_) => OperationKind::Finish,
            Self::Interval(_) => OperationKind::Interval,
            Self::Metrics(_) => OperationKind::Metrics,
            Self::DeleteQueue(_) => OperationKind::DeleteQueue,
        }
    }

    /// Resolve the method, path and body for this operation.
    ///
    /// # Errors
    ///
    /// Returns a validation [`SharqError`] if a path component is empty or a
    /// metrics request names a queue id without a queue type.
    pub fn route(&self) -> Result<Route, SharqError> {
        match self {
            Self::Enqueue(request) => request.route(),
            Self::Dequeue(request) => request.route(),
            Self::Finish(request) => request.route(),
            Self::Interval(request) => request.route(),
            Self::Metrics(request) => request.route(),
            Self::DeleteQueue(request) => request.route(),
        }
    }
}

impl From<EnqueueRequest> for Operation {
    fn from(request: EnqueueRequest) -> Self {
        Self::Enqueue(request)
    }
}

impl From<DequeueRequest> for Operation {
    fn from(request: DequeueRequest) -> Self {
        Self::Dequeue(request)
    }
}

impl From<FinishRequest> for Operation {
    fn from(request: FinishRequest) -> Self {
        Self::Finish(request)
    }
}

impl From<IntervalRequest> for Operation {
    fn from(request: IntervalRequest) -> Self {
        Self::Interval(request)
    }
}

impl From<MetricsRequest> for Operation {
    fn from(request: MetricsRequest) -> Self {
        Self::Metrics(request)
    }
}

impl From<DeleteQueueRequest> for Operation {
    fn from(request: DeleteQueueRequest) -> Self {
        Self::DeleteQueue(request)
    }
}

// ============================================================================
// Parameter helpers
// ============================================================================

/// Fail on the first mandatory parameter of `kind` that is absent or null.
fn ensure_present(params: &Params, kind: OperationKind) -> Result<(), SharqError> {
    for name in kind.mandatory_parameters() {
        if params.get(*name).map_or(true, Value::is_null) {
            return Err(SharqError::missing(*name));
        }
    }
    Ok(())
}

/// Remove `name`, treating an explicit null as absent.
fn take_present(params: &mut Params, name: &str) -> Option<Value> {
    params.remove(name).filter(|value| !value.is_null())
}

fn take_segment(params: &mut Params, name: &str) -> Result<String, SharqError> {
    match take_present(params, name) {
        Some(value) => segment_from_value(name, value),
        None => Err(SharqError::missing(name)),
    }
}

fn take_optional_segment(params: &mut Params, name: &str) -> Result<Option<String>, SharqError> {
    match take_present(params, name) {
        None => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(value) => segment_from_value(name, value).map(Some),
    }
}

fn segment_from_value(name: &str, value: Value) -> Result<String, SharqError> {
    match value {
        Value::String(s) if !s.is_empty() => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(SharqError::invalid(name, SEGMENT_EXPECTED)),
    }
}

/// Check a path component before it is joined onto the base URL. Dot
/// segments would be collapsed by URL normalization.
fn segment(name: &str, value: &str) -> Result<String, SharqError> {
    match value {
        "" => Err(SharqError::invalid(name, SEGMENT_EXPECTED)),
        "." | ".." => Err(SharqError::invalid(
            name,
            "a path component other than `.` or `..`",
        )),
        _ => Ok(value.to_string()),
    }
}
