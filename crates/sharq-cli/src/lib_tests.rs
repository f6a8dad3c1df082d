//! Tests for the sharq-cli library module.

use super::*;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

fn environment(vars: &[(&str, &str)]) -> config::Environment {
    let source = vars
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

    config::Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .source(Some(source))
}

fn config_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

mod parsing {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = parse(&[
            "sharq",
            "--host",
            "queue.internal",
            "--port",
            "8080",
            "--scheme",
            "HTTPS",
            "finish",
            "--queue-type",
            "sms",
            "--queue-id",
            "acct1",
            "--job-id",
            "job-1",
        ]);

        assert_eq!(cli.host.as_deref(), Some("queue.internal"));
        assert_eq!(cli.port, Some(8080));
        assert_eq!(cli.scheme, Some(Scheme::Https));
        match cli.command {
            Commands::Finish { queue, job_id } => {
                assert_eq!(queue.queue_type.as_deref(), Some("sms"));
                assert_eq!(queue.queue_id.as_deref(), Some("acct1"));
                assert_eq!(job_id.as_deref(), Some("job-1"));
            }
            other => panic!("Expected Finish command, got {:?}", other),
        }
    }

    #[test]
    fn test_enqueue_parsing() {
        let cli = parse(&[
            "sharq",
            "enqueue",
            "--queue-type",
            "sms",
            "--queue-id",
            "acct1",
            "--requeue-limit",
            "-1",
            "--field",
            "priority=\"high\"",
            "--field",
            "attempts=3",
        ]);

        match cli.command {
            Commands::Enqueue {
                requeue_limit,
                fields,
                ..
            } => {
                assert_eq!(requeue_limit, Some(-1));
                assert_eq!(
                    fields,
                    vec![
                        ("priority".to_string(), json!("high")),
                        ("attempts".to_string(), json!(3)),
                    ]
                );
            }
            other => panic!("Expected Enqueue command, got {:?}", other),
        }
    }

    #[test]
    fn test_delete_queue_command_name() {
        let cli = parse(&["sharq", "delete-queue", "--purge-all"]);

        assert_eq!(cli.command.kind(), OperationKind::DeleteQueue);
    }

    #[test]
    fn test_mandatory_flags_are_optional_at_parse_time() {
        let cli = Cli::try_parse_from(["sharq", "interval"]);

        assert!(cli.is_ok());
    }

    #[test]
    fn test_malformed_field_rejected() {
        assert!(Cli::try_parse_from(["sharq", "enqueue", "--field", "no-equals"]).is_err());
        assert!(Cli::try_parse_from(["sharq", "enqueue", "--field", "=1"]).is_err());
    }

    #[test]
    fn test_unsupported_scheme_rejected() {
        assert!(Cli::try_parse_from(["sharq", "--scheme", "ftp", "metrics"]).is_err());
    }

    #[test]
    fn test_payload_and_payload_file_conflict() {
        let result = Cli::try_parse_from([
            "sharq",
            "enqueue",
            "--payload",
            "x",
            "--payload-file",
            "job.json",
        ]);

        assert!(result.is_err());
    }
}

mod params {
    use super::*;

    #[test]
    fn test_enqueue_params() {
        let cli = parse(&[
            "sharq",
            "enqueue",
            "--queue-type",
            "sms",
            "--queue-id",
            "acct1",
            "--job-id",
            "job-1",
            "--payload",
            "{\"to\": \"+15550100\"}",
            "--interval",
            "1000",
        ]);

        let (kind, params) = cli.command.into_params().unwrap();

        assert_eq!(kind, OperationKind::Enqueue);
        assert_eq!(
            Value::Object(params),
            json!({
                "queue_type": "sms",
                "queue_id": "acct1",
                "job_id": "job-1",
                "payload": { "to": "+15550100" },
                "interval": 1000,
            })
        );
    }

    #[test]
    fn test_plain_payload_sent_as_string() {
        let cli = parse(&["sharq", "enqueue", "--payload", "hello world"]);

        let (_, params) = cli.command.into_params().unwrap();

        assert_eq!(params["payload"], json!("hello world"));
    }

    #[test]
    fn test_absent_flags_are_left_out() {
        let cli = parse(&["sharq", "finish", "--queue-id", "acct1"]);

        let (_, params) = cli.command.into_params().unwrap();

        assert_eq!(Value::Object(params), json!({ "queue_id": "acct1" }));
    }

    #[test]
    fn test_delete_queue_always_sends_purge_flag() {
        let cli = parse(&["sharq", "delete-queue", "--queue-type", "sms", "--queue-id", "a"]);

        let (_, params) = cli.command.into_params().unwrap();

        assert_eq!(params["purge_all"], json!(false));
    }

    #[test]
    fn test_payload_file_is_read_as_json() {
        let file = config_file(".json", r#"{"to": "+15550100"}"#);
        let command = Commands::Enqueue {
            queue: QueueArgs::default(),
            job_id: None,
            payload: None,
            payload_file: Some(file.path().to_path_buf()),
            interval: None,
            requeue_limit: None,
            fields: Vec::new(),
        };

        let (_, params) = command.into_params().unwrap();

        assert_eq!(params["payload"], json!({ "to": "+15550100" }));
    }

    #[test]
    fn test_payload_file_with_invalid_json() {
        let file = config_file(".json", "not json");
        let cli = parse(&[
            "sharq",
            "enqueue",
            "--payload-file",
            file.path().to_str().unwrap(),
        ]);

        let error = cli.command.into_params().unwrap_err();

        assert!(matches!(error, CliError::InvalidArgument { ref arg, .. } if arg == "payload-file"));
        assert_eq!(error.exit_code(), EXIT_VALIDATION);
    }

    #[test]
    fn test_missing_payload_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let cli = parse(&[
            "sharq",
            "enqueue",
            "--payload-file",
            missing.to_str().unwrap(),
        ]);

        let error = cli.command.into_params().unwrap_err();

        assert!(matches!(error, CliError::Io(_)));
        assert_eq!(error.exit_code(), EXIT_IO);
    }
}

mod configuration {
    use super::*;
    use sharq_client::Credentials;

    #[test]
    fn test_config_defaults() {
        let config = CliConfig::default();

        assert_eq!(config.server.host, "localhost");
        assert_eq!(config.server.port, 80);
        assert_eq!(config.server.timeout_seconds, 30);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_load_without_sources_gives_defaults() {
        let config = load_configuration_from(None, environment(&[])).unwrap();

        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let file = config_file(
            ".toml",
            r#"
[server]
host = "queue.internal"
port = 8080
scheme = "https"

[server.credentials]
type = "basic"
username = "ops"
password = "hunter2"

[logging]
format = "json"
"#,
        );

        let config = load_configuration_from(Some(file.path()), environment(&[])).unwrap();

        assert_eq!(config.server.base_url(), "https://queue.internal:8080");
        assert_eq!(
            config.server.credentials,
            Some(Credentials::basic("ops", "hunter2"))
        );
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = config_file(".json", r#"{ "server": { "host": "from-file", "port": 8080 } }"#);

        let config = load_configuration_from(
            Some(file.path()),
            environment(&[
                ("SHARQ__SERVER__PORT", "9090"),
                ("SHARQ__LOGGING__LEVEL", "debug"),
                ("OTHER__SERVER__HOST", "ignored"),
            ]),
        )
        .unwrap();

        assert_eq!(config.server.host, "from-file");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("sharq.toml");

        let error = load_configuration_from(Some(&missing), environment(&[])).unwrap_err();

        assert!(matches!(error, ConfigError::FileNotFound { .. }));
        assert_eq!(CliError::from(error).exit_code(), EXIT_CONFIGURATION);
    }

    #[test]
    fn test_malformed_file_is_invalid() {
        let file = config_file(".toml", "[server]\nport = \"not a port\"\n");

        let error = load_configuration_from(Some(file.path()), environment(&[])).unwrap_err();

        assert!(matches!(error, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_flags_override_configuration() {
        let cli = parse(&[
            "sharq",
            "--host",
            "flag-host",
            "--port",
            "7000",
            "--timeout",
            "5",
            "--log-level",
            "trace",
            "--json-logs",
            "metrics",
        ]);
        let mut config = CliConfig::default();

        cli.apply_overrides(&mut config);

        assert_eq!(config.server.host, "flag-host");
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.server.timeout_seconds, 5);
        assert_eq!(config.logging.level, "trace");
        assert_eq!(config.logging.format, LogFormat::Json);
    }
}

mod output {
    use super::*;

    #[test]
    fn test_write_reply_single_line() {
        let reply = Reply::from_server(201, json!({ "status": "queued" }));
        let mut out = Vec::new();

        write_reply(&mut out, &reply).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(text.lines().count(), 1);
        let document: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            document,
            json!({ "status": 201, "body": { "status": "queued" } })
        );
    }

    #[test]
    fn test_reply_exit_codes() {
        assert_eq!(
            reply_exit_code(&Reply::from_server(200, json!({}))),
            EXIT_SUCCESS
        );
        assert_eq!(
            reply_exit_code(&Reply::from_server(404, json!({}))),
            EXIT_SERVER
        );
        assert_eq!(
            reply_exit_code(&Reply::from_error(SharqError::missing("queue_id"))),
            EXIT_VALIDATION
        );
        assert_eq!(
            reply_exit_code(&Reply::from_error(SharqError::Timeout)),
            EXIT_TRANSPORT
        );
    }

    #[test]
    fn test_client_error_exit_codes() {
        let configuration = CliError::from(SharqError::Configuration {
            message: "host must not be empty".to_string(),
        });
        let validation = CliError::from(SharqError::missing("queue_type"));

        assert_eq!(configuration.exit_code(), EXIT_CONFIGURATION);
        assert_eq!(validation.exit_code(), EXIT_VALIDATION);
    }
}

mod execution {
    use super::*;

    fn config_for(server: &MockServer) -> CliConfig {
        CliConfig {
            server: ClientConfig::new("127.0.0.1").with_port(server.address().port()),
            logging: LoggingConfig::default(),
        }
    }

    async fn run(config: &CliConfig, args: &[&str]) -> (i32, Value) {
        let cli = parse(args);
        let mut out = Vec::new();

        let exit_code = execute(config, cli.command, &mut out).await.unwrap();

        (exit_code, serde_json::from_slice(&out).unwrap())
    }

    #[tokio::test]
    async fn test_enqueue_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/enqueue/sms/acct1/"))
            .and(body_json(json!({ "payload": "x" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "status": "queued" })))
            .expect(1)
            .mount(&server)
            .await;

        let (exit_code, document) = run(
            &config_for(&server),
            &[
                "sharq",
                "enqueue",
                "--queue-type",
                "sms",
                "--queue-id",
                "acct1",
                "--payload",
                "x",
            ],
        )
        .await;

        assert_eq!(exit_code, EXIT_SUCCESS);
        assert_eq!(
            document,
            json!({ "status": 201, "body": { "status": "queued" } })
        );
    }

    #[tokio::test]
    async fn test_missing_flag_prints_failure_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (exit_code, document) = run(
            &config_for(&server),
            &["sharq", "finish", "--queue-type", "sms", "--job-id", "j"],
        )
        .await;

        assert_eq!(exit_code, EXIT_VALIDATION);
        assert_eq!(
            document,
            json!({
                "status": 400,
                "body": {
                    "status": "failure",
                    "message": "`queue_id` is a mandatory parameter",
                },
            })
        );
    }

    #[tokio::test]
    async fn test_server_error_exit_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dequeue/default/"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "status": "failure" })))
            .mount(&server)
            .await;

        let (exit_code, document) = run(&config_for(&server), &["sharq", "dequeue"]).await;

        assert_eq!(exit_code, EXIT_SERVER);
        assert_eq!(document["status"], 404);
    }

    #[tokio::test]
    async fn test_invalid_server_configuration() {
        let config = CliConfig {
            server: ClientConfig::new(""),
            logging: LoggingConfig::default(),
        };
        let cli = parse(&["sharq", "metrics"]);
        let mut out = Vec::new();

        let error = execute(&config, cli.command, &mut out).await.unwrap_err();

        assert!(matches!(error, CliError::Client(SharqError::Configuration { .. })));
        assert_eq!(error.exit_code(), EXIT_CONFIGURATION);
        assert!(out.is_empty());
    }
}
