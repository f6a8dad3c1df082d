//! # SharQ CLI
//!
//! Command-line front end for a SharQ job queue server.
//!
//! Each invocation:
//! - loads the client configuration (files, environment, flags)
//! - issues exactly one SharQ operation
//! - prints the reply as `{"status": <code>, "body": <json>}` on stdout
//!
//! Logs go to stderr so stdout stays machine-readable.

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use serde_json::{json, Value};
use sharq_client::{ClientConfig, OperationKind, Params, Reply, Scheme, SharqClient, SharqError};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// System-wide configuration file, extension inferred.
pub const SYSTEM_CONFIG_FILE: &str = "/etc/sharq/client";

/// Working-directory configuration file, extension inferred.
pub const LOCAL_CONFIG_FILE: &str = "sharq";

/// Prefix for configuration environment variables, e.g. `SHARQ__SERVER__PORT`.
pub const ENV_PREFIX: &str = "SHARQ";

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_CONFIGURATION: i32 = 1;
pub const EXIT_VALIDATION: i32 = 2;
pub const EXIT_TRANSPORT: i32 = 3;
pub const EXIT_SERVER: i32 = 4;
pub const EXIT_IO: i32 = 5;

// ============================================================================
// CLI Structure
// ============================================================================

/// SharQ CLI - issue operations against a SharQ job queue server
#[derive(Parser, Debug)]
#[command(name = "sharq")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Command-line client for the SharQ job queue server")]
#[command(
    long_about = "Sends one operation to a SharQ server and prints the server's status and JSON reply"
)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SHARQ_CONFIG")]
    pub config: Option<PathBuf>,

    /// Server host name or address
    #[arg(long)]
    pub host: Option<String>,

    /// Server port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// URL scheme (http or https)
    #[arg(long)]
    pub scheme: Option<Scheme>,

    /// Request timeout in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Logging level or filter directive
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long)]
    pub json_logs: bool,

    /// Operation to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Queue coordinates shared by most operations.
///
/// Both are optional here; the client reports missing ones.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct QueueArgs {
    /// Queue type, e.g. `sms`
    #[arg(long)]
    pub queue_type: Option<String>,

    /// Queue identifier within the queue type
    #[arg(long)]
    pub queue_id: Option<String>,
}

/// Available SharQ operations
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Enqueue a job
    Enqueue {
        #[command(flatten)]
        queue: QueueArgs,

        /// Job identifier
        #[arg(long)]
        job_id: Option<String>,

        /// Job payload; parsed as JSON, otherwise sent as a string
        #[arg(long, conflicts_with = "payload_file")]
        payload: Option<String>,

        /// Read the job payload from a JSON file
        #[arg(long)]
        payload_file: Option<PathBuf>,

        /// Queue interval in milliseconds
        #[arg(long)]
        interval: Option<u64>,

        /// Requeue limit (-1 for unlimited)
        #[arg(long, allow_negative_numbers = true)]
        requeue_limit: Option<i64>,

        /// Extra body field; may be repeated
        #[arg(long = "field", value_name = "KEY=JSON", value_parser = parse_field)]
        fields: Vec<(String, Value)>,
    },

    /// Dequeue a job
    Dequeue {
        /// Queue type (defaults to `default`)
        #[arg(long)]
        queue_type: Option<String>,
    },

    /// Mark a job as finished
    Finish {
        #[command(flatten)]
        queue: QueueArgs,

        /// Job identifier
        #[arg(long)]
        job_id: Option<String>,
    },

    /// Change a queue's interval
    Interval {
        #[command(flatten)]
        queue: QueueArgs,

        /// New interval in milliseconds
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Show server, queue type or queue metrics
    Metrics {
        #[command(flatten)]
        queue: QueueArgs,
    },

    /// Delete a queue
    DeleteQueue {
        #[command(flatten)]
        queue: QueueArgs,

        /// Also purge the queue's jobs
        #[arg(long)]
        purge_all: bool,
    },
}

impl Commands {
    /// The SharQ operation this command runs.
    pub fn kind(&self) -> OperationKind {
        match self {
            Commands::Enqueue { .. } => OperationKind::Enqueue,
            Commands::Dequeue { .. } => OperationKind::Dequeue,
            Commands::Finish { .. } => OperationKind::Finish,
            Commands::Interval { .. } => OperationKind::Interval,
            Commands::Metrics { .. } => OperationKind::Metrics,
            Commands::DeleteQueue { .. } => OperationKind::DeleteQueue,
        }
    }

    /// Convert the command into an operation name and parameter mapping.
    ///
    /// Only flags that were given end up in the mapping.
    pub fn into_params(self) -> Result<(OperationKind, Params), CliError> {
        let kind = self.kind();
        let mut params = Params::new();

        match self {
            Commands::Enqueue {
                queue,
                job_id,
                payload,
                payload_file,
                interval,
                requeue_limit,
                fields,
            } => {
                params.extend(fields);
                insert_queue(&mut params, queue);
                insert(&mut params, "job_id", job_id);
                insert(&mut params, "payload", payload.as_deref().map(parse_json_or_string));
                if let Some(path) = payload_file {
                    params.insert("payload".to_string(), read_payload_file(&path)?);
                }
                insert(&mut params, "interval", interval);
                insert(&mut params, "requeue_limit", requeue_limit);
            }
            Commands::Dequeue { queue_type } => {
                insert(&mut params, "queue_type", queue_type);
            }
            Commands::Finish { queue, job_id } => {
                insert_queue(&mut params, queue);
                insert(&mut params, "job_id", job_id);
            }
            Commands::Interval { queue, interval } => {
                insert_queue(&mut params, queue);
                insert(&mut params, "interval", interval);
            }
            Commands::Metrics { queue } => insert_queue(&mut params, queue),
            Commands::DeleteQueue { queue, purge_all } => {
                insert_queue(&mut params, queue);
                params.insert("purge_all".to_string(), Value::Bool(purge_all));
            }
        }

        Ok((kind, params))
    }
}

fn insert(params: &mut Params, key: &str, value: Option<impl Into<Value>>) {
    if let Some(value) = value {
        params.insert(key.to_string(), value.into());
    }
}

fn insert_queue(params: &mut Params, queue: QueueArgs) {
    insert(params, "queue_type", queue.queue_type);
    insert(params, "queue_id", queue.queue_id);
}

fn parse_json_or_string(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Parse a `KEY=JSON` body field.
fn parse_field(raw: &str) -> Result<(String, Value), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), parse_json_or_string(value))),
        _ => Err(format!("expected KEY=JSON, got '{}'", raw)),
    }
}

fn read_payload_file(path: &Path) -> Result<Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::InvalidArgument {
        arg: "payload-file".to_string(),
        message: format!("{} is not valid JSON: {}", path.display(), e),
    })
}

impl Cli {
    /// Apply command-line flags on top of loaded configuration.
    pub fn apply_overrides(&self, config: &mut CliConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(scheme) = self.scheme {
            config.server.scheme = scheme;
        }
        if let Some(timeout) = self.timeout {
            config.server.timeout_seconds = timeout;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.json_logs {
            config.logging.format = LogFormat::Json;
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// CLI-specific errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Client error: {0}")]
    Client(#[from] SharqError),

    #[error("Invalid argument: {arg} - {message}")]
    InvalidArgument { arg: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Configuration(_) => EXIT_CONFIGURATION,
            CliError::Client(e) if e.is_validation() => EXIT_VALIDATION,
            CliError::Client(_) => EXIT_CONFIGURATION,
            CliError::InvalidArgument { .. } => EXIT_VALIDATION,
            CliError::Io(_) => EXIT_IO,
        }
    }
}

/// Configuration-related errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] config::ConfigError),

    #[error("Failed to initialize logging: {message}")]
    Logging { message: String },
}

// ============================================================================
// Configuration Types
// ============================================================================

/// CLI configuration structure
///
/// ```toml
/// [server]
/// host = "queue.internal"
/// port = 8080
///
/// [server.credentials]
/// type = "bearer"
/// token = "..."
///
/// [logging]
/// level = "info"
/// format = "json"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// SharQ server connection settings
    pub server: ClientConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Log format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

// ============================================================================
// Main Entry Point
// ============================================================================

/// Main CLI entry point. Returns the process exit code.
pub async fn run_cli(cli: Cli) -> Result<i32, CliError> {
    let mut config = load_configuration(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);

    initialize_logging(&config.logging)?;

    let mut stdout = std::io::stdout();
    execute(&config, cli.command, &mut stdout).await
}

/// Run one command against the configured server and write the reply.
pub async fn execute<W: Write>(
    config: &CliConfig,
    command: Commands,
    out: &mut W,
) -> Result<i32, CliError> {
    let (kind, params) = command.into_params()?;
    let client = SharqClient::new(config.server.clone())?;

    info!(
        operation = %kind,
        server = %client.base_url(),
        "Running SharQ operation"
    );

    let reply = client.call(kind, params).await;
    write_reply(out, &reply)?;

    info!(operation = %kind, status = reply.status(), "SharQ operation completed");

    Ok(reply_exit_code(&reply))
}

/// Exit code for a reply.
pub fn reply_exit_code(reply: &Reply) -> i32 {
    if reply.is_success() {
        EXIT_SUCCESS
    } else if reply.is_local_failure() {
        EXIT_VALIDATION
    } else if reply.is_transport_failure() {
        EXIT_TRANSPORT
    } else {
        EXIT_SERVER
    }
}

/// Write a reply as a single JSON line.
pub fn write_reply<W: Write>(out: &mut W, reply: &Reply) -> std::io::Result<()> {
    let document = json!({
        "status": reply.status(),
        "body": reply.body(),
    });
    serde_json::to_writer(&mut *out, &document)?;
    writeln!(out)
}

// ============================================================================
// Logging and Configuration
// ============================================================================

/// Initialize logging. `RUST_LOG` takes precedence over the configured level.
pub fn initialize_logging(logging: &LoggingConfig) -> Result<(), CliError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.level).map_err(|e| CliError::InvalidArgument {
            arg: "log-level".to_string(),
            message: e.to_string(),
        })?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = match logging.format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    result.map_err(|e| {
        ConfigError::Logging {
            message: e.to_string(),
        }
        .into()
    })
}

/// Load configuration from files and `SHARQ__*` environment variables.
///
/// Sources, lowest precedence first:
///  1. `/etc/sharq/client.{toml,json,yaml}` (optional)
///  2. `./sharq.{toml,json,yaml}` (optional)
///  3. the explicit `path` (required when given)
///  4. environment variables, e.g. `SHARQ__SERVER__HOST=queue.internal`
pub fn load_configuration(path: Option<&Path>) -> Result<CliConfig, ConfigError> {
    load_configuration_from(
        path,
        config::Environment::with_prefix(ENV_PREFIX).separator("__"),
    )
}

fn load_configuration_from(
    path: Option<&Path>,
    environment: config::Environment,
) -> Result<CliConfig, ConfigError> {
    let mut builder = config::Config::builder()
        .add_source(config::File::with_name(SYSTEM_CONFIG_FILE).required(false))
        .add_source(config::File::with_name(LOCAL_CONFIG_FILE).required(false));

    if let Some(path) = path {
        if !path.is_file() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        builder = builder.add_source(config::File::from(path).required(true));
    }

    let config = builder.add_source(environment).build()?.try_deserialize()?;
    Ok(config)
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
