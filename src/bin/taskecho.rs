//! taskecho CLI: run the echo server or talk to one.

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use taskecho_rs::client::{DEFAULT_TIMEOUT, EchoClient, ObservationFields, send_task_observation};
use taskecho_rs::config::{Config, ServerConfig};
use taskecho_rs::service::{EchoServer, Supervisor};
use taskecho_rs::telemetry::{TelemetryConfig, init_telemetry};

#[derive(Parser)]
#[command(name = "taskecho", about = "Acknowledge pipeline task observations over gRPC")]
struct Cli {
    /// TOML config file (defaults to environment variables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the echo server until Ctrl-C
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        /// Append-only activity log file
        #[arg(long)]
        log_file: Option<PathBuf>,
        /// Fixed delay before each response, in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
        /// Shutdown grace period, in milliseconds
        #[arg(long)]
        grace_ms: Option<u64>,
    },
    /// Send one task observation and print the action
    Send {
        /// Server address (host:port or URI)
        #[arg(long, default_value = "localhost:50051")]
        addr: String,
        /// Observation field as name=value (repeatable)
        #[arg(long = "field", value_name = "NAME=VALUE")]
        fields: Vec<String>,
        /// Observation fields as a JSON object; --field entries override
        #[arg(long)]
        json: Option<String>,
        /// Seconds to wait for the action
        #[arg(long, default_value_t = 10)]
        timeout_secs: u64,
    },
    /// Call the greeter demo endpoint
    Hello {
        #[arg(long, default_value = "localhost:50051")]
        addr: String,
        #[arg(default_value = "world")]
        name: String,
    },
    /// Start a server, round-trip one observation, stop. Exit 0 on success
    Verify {
        #[arg(long, default_value_t = 50059)]
        port: u16,
        #[arg(long, default_value = "/tmp/test_taskecho.log")]
        log_file: PathBuf,
        #[arg(long, default_value_t = 10)]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "taskecho".to_string(),
        log_level: config.log_level.clone(),
    })?;

    match cli.command {
        Command::Serve {
            host,
            port,
            log_file,
            delay_ms,
            grace_ms,
        } => {
            let mut server = config.server;
            if let Some(host) = host {
                server.host = host;
            }
            if let Some(port) = port {
                server.port = port;
            }
            if log_file.is_some() {
                server.log_file = log_file;
            }
            if let Some(ms) = delay_ms {
                server.response_delay = Some(Duration::from_millis(ms));
            }
            if let Some(ms) = grace_ms {
                server.grace_period = Duration::from_millis(ms);
            }
            cmd_serve(server).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Send {
            addr,
            fields,
            json,
            timeout_secs,
        } => {
            cmd_send(&addr, fields, json, Duration::from_secs(timeout_secs)).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Hello { addr, name } => {
            let mut client = EchoClient::connect(&addr, DEFAULT_TIMEOUT).await?;
            println!("{}", client.say_hello(&name).await?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify {
            port,
            log_file,
            timeout_secs,
        } => Ok(cmd_verify(port, log_file, Duration::from_secs(timeout_secs)).await),
    }
}

async fn cmd_serve(server: ServerConfig) -> anyhow::Result<()> {
    let supervisor = Supervisor::new(server);

    let sup = supervisor.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        sup.shutdown();
    });

    supervisor.run().await?;
    Ok(())
}

async fn cmd_send(
    addr: &str,
    pairs: Vec<String>,
    json: Option<String>,
    timeout: Duration,
) -> anyhow::Result<()> {
    let mut fields: ObservationFields = match json {
        Some(raw) => serde_json::from_str(&raw).context("--json must be a JSON object")?,
        None => ObservationFields::new(),
    };
    for pair in pairs {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("--field expects NAME=VALUE, got '{pair}'"))?;
        fields.insert(name.to_string(), Value::String(value.to_string()));
    }

    let pending = send_task_observation(fields, addr, timeout)?;
    let action = pending.wait_timeout(timeout).await?;

    println!("Action ID:    {}", action.action_id);
    println!("Event ID:     {}", action.observation_event_id);
    println!("Success:      {}", action.success);
    println!("Message:      {}", action.message);
    println!("Details:      {}", action.action_details);
    Ok(())
}

async fn cmd_verify(port: u16, log_file: PathBuf, timeout: Duration) -> ExitCode {
    let mut server = EchoServer::new(ServerConfig {
        host: "127.0.0.1".to_string(),
        port,
        log_file: Some(log_file.clone()),
        ..ServerConfig::default()
    });

    let passed = match server.start().await {
        Ok(addr) => match round_trip(&addr.to_string(), timeout).await {
            Ok(()) => {
                println!("Integration check passed.");
                true
            }
            Err(e) => {
                println!("Integration check failed: {e:#}");
                false
            }
        },
        Err(e) => {
            println!("Integration check failed: could not start server: {e}");
            false
        }
    };

    if server.state().is_serving() {
        if let Err(e) = server.stop_with_grace(Duration::ZERO).await {
            println!("Server stop failed: {e}");
        }
    }

    match std::fs::read_to_string(&log_file) {
        Ok(content) => {
            println!("\n--- {} ---", log_file.display());
            print!("{content}");
            println!("--- end of log ---");
        }
        Err(_) => println!("Log file {} was not created.", log_file.display()),
    }

    if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

async fn round_trip(addr: &str, timeout: Duration) -> anyhow::Result<()> {
    let event_id = uuid::Uuid::new_v4().to_string();
    let mut fields = ObservationFields::new();
    fields.insert("event_id".into(), event_id.clone().into());
    fields.insert("event_type".into(), "integration_check".into());
    fields.insert("pipeline_name".into(), "integration_pipeline".into());
    fields.insert("process_name".into(), "integration_process".into());
    fields.insert("task_id_num".into(), "888".into());
    fields.insert("status".into(), "TESTING".into());

    let action = send_task_observation(fields, addr, timeout)?
        .wait_timeout(timeout)
        .await?;

    println!(
        "Received action {} (success={}) for event {}",
        action.action_id, action.success, action.observation_event_id
    );
    anyhow::ensure!(action.success, "action success was false");
    anyhow::ensure!(
        action.observation_event_id == event_id,
        "event id mismatch: expected {event_id}, got {}",
        action.observation_event_id
    );
    Ok(())
}
