//! flatserve
//!
//! Serves the direct children of one directory over HTTP and keeps an hourly
//! JSON access log with time-based retention.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ request id ──▶ trace ──▶ access log ──▶ timeout ──▶ handler
//!                                         │                          │
//!                                         │              path validator, extension
//!                                         │              policy, stat, ServeFile
//!                                         ▼
//!                               <log_dir>/YYYY-MM-DDTHH.log ◀── retention sweeper
//!                                                               (startup + interval)
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use flatserve::access_log::retention::{report, RetentionSweeper};
use flatserve::config::loader::resolve_config;
use flatserve::config::{Overrides, ServerConfig};
use flatserve::http::HttpServer;
use flatserve::lifecycle::startup::{bind_listener, parse_timezone, prepare_log_directory};
use flatserve::lifecycle::{signals, Shutdown};
use flatserve::observability::init_logging;

#[derive(Parser)]
#[command(name = "flatserve", version)]
#[command(about = "Static file server for a flat directory with hourly access logs", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, global = true, env = "FLATSERVE_CONFIG")]
    config: Option<PathBuf>,

    /// Directory to serve.
    #[arg(long, global = true, env = "WWW_ROOT")]
    root: Option<PathBuf>,

    /// Directory for hourly access log files.
    #[arg(long, global = true, env = "LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:8080.
    #[arg(long, global = true, env = "BIND_ADDRESS")]
    bind: Option<String>,

    /// Hours to keep access log files.
    #[arg(long, global = true, env = "LOG_RETENTION_HOURS")]
    retention_hours: Option<u64>,

    /// IANA timezone used to name access log files.
    #[arg(long, global = true, env = "LOG_TIMEZONE")]
    timezone: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Serve files (default)
    Serve,
    /// Run one retention sweep and exit
    Sweep,
    /// Validate configuration and print the effective settings
    CheckConfig,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            root: self.root.clone(),
            log_dir: self.log_dir.clone(),
            bind_address: self.bind.clone(),
            retention_hours: self.retention_hours,
            timezone: self.timezone.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resolve_config(cli.config.as_deref(), cli.overrides()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("flatserve: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.observability);

    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Sweep => sweep_once(config).await,
        Command::CheckConfig => print_config(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "flatserve starting");

    let timezone = parse_timezone(&config.access_log.timezone)?;
    prepare_log_directory(&config.access_log.directory)?;

    let sweeper = Arc::new(RetentionSweeper::new(
        &config.access_log.directory,
        timezone,
        config.access_log.retention_hours,
    ));
    report(sweeper.sweep_now().await);

    let shutdown = Shutdown::new();
    tokio::spawn(sweeper.run(
        Duration::from_secs(config.access_log.sweep_interval_secs),
        shutdown.subscribe(),
    ));

    let listener = bind_listener(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;
    let server_shutdown = shutdown.signal();

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            signals::wait_for_signal().await;
            shutdown.trigger();
        }
    });

    server.run(listener, server_shutdown).await?;
    shutdown.trigger();

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn sweep_once(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let timezone = parse_timezone(&config.access_log.timezone)?;
    let sweeper = Arc::new(RetentionSweeper::new(
        &config.access_log.directory,
        timezone,
        config.access_log.retention_hours,
    ));

    let removed = sweeper.sweep_now().await?;
    println!("removed {removed} expired log file(s) from {}", sweeper.directory().display());
    Ok(())
}

fn print_config(config: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
