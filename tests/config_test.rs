use std::path::PathBuf;
use std::time::Duration;
use taskecho_rs::config::{Config, DEFAULT_PORT, ServerConfig};

const VARS: [&str; 6] = [
    "TASKECHO_HOST",
    "TASKECHO_PORT",
    "TASKECHO_LOG_FILE",
    "TASKECHO_RESPONSE_DELAY_MS",
    "TASKECHO_GRACE_PERIOD_MS",
    "TASKECHO_MAX_CONCURRENT_CALLS",
];

fn clear_vars() {
    unsafe {
        for var in VARS {
            std::env::remove_var(var);
        }
    }
}

// Env-mutating checks share one test so they never race each other.
#[test]
fn config_from_env() {
    clear_vars();
    let config = Config::from_env().unwrap();
    assert_eq!(config.server, ServerConfig::default());
    assert_eq!(config.server.bind_address(), format!("[::]:{DEFAULT_PORT}"));
    assert!(!config.log_level.is_empty());

    unsafe {
        std::env::set_var("TASKECHO_HOST", "127.0.0.1");
        std::env::set_var("TASKECHO_PORT", "50052");
        std::env::set_var("TASKECHO_LOG_FILE", "/tmp/ai_server.log");
        std::env::set_var("TASKECHO_RESPONSE_DELAY_MS", "10");
        std::env::set_var("TASKECHO_GRACE_PERIOD_MS", "250");
    }
    let config = Config::from_env().unwrap();
    assert_eq!(config.server.bind_address(), "127.0.0.1:50052");
    assert_eq!(
        config.server.log_file,
        Some(PathBuf::from("/tmp/ai_server.log"))
    );
    assert_eq!(config.server.response_delay, Some(Duration::from_millis(10)));
    assert_eq!(config.server.grace_period, Duration::from_millis(250));

    unsafe {
        std::env::set_var("TASKECHO_PORT", "not-a-port");
    }
    assert!(Config::from_env().is_err());

    unsafe {
        std::env::set_var("TASKECHO_PORT", "50052");
        std::env::set_var("TASKECHO_MAX_CONCURRENT_CALLS", "0");
    }
    assert!(Config::from_env().is_err());

    clear_vars();
}

#[test]
fn config_from_toml_applies_defaults() {
    let config = Config::from_toml(
        r#"
        log_level = "debug"

        [server]
        port = 50059
        response_delay_ms = 10
        "#,
    )
    .unwrap();

    assert_eq!(config.log_level, "debug");
    assert_eq!(config.server.port, 50059);
    assert_eq!(config.server.host, "[::]");
    assert_eq!(config.server.response_delay, Some(Duration::from_millis(10)));
    assert_eq!(config.server.grace_period, Duration::from_secs(1));
    assert_eq!(config.server.max_concurrent_calls, 10);
    assert!(config.otel_endpoint.is_none());
}

#[test]
fn config_from_toml_rejects_unknown_keys() {
    assert!(Config::from_toml("[server]\nprot = 1\n").is_err());
}

#[test]
fn config_from_file_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn config_from_file_reads_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskecho.toml");
    std::fs::write(
        &path,
        "otel_endpoint = \"http://localhost:4317\"\n[server]\nhost = \"0.0.0.0\"\nlog_file = \"/tmp/x.log\"\n",
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.log_file, Some(PathBuf::from("/tmp/x.log")));
    assert_eq!(config.otel_endpoint.as_deref(), Some("http://localhost:4317"));
}
