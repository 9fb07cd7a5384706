//! Startup orchestration.
//!
//! # Responsibilities
//! - Create the log directory
//! - Catch up on retention before traffic arrives
//! - Bind the listener
//!
//! Any error here is fatal.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use thiserror::Error;
use tokio::net::TcpListener;

/// Errors that stop the process before it serves anything.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("unknown timezone `{0}`")]
    Timezone(String),

    #[error("failed to create log directory {}: {source}", path.display())]
    LogDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to resolve served root {}: {source}", path.display())]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

pub fn parse_timezone(name: &str) -> Result<Tz, StartupError> {
    name.parse::<Tz>()
        .map_err(|_| StartupError::Timezone(name.to_string()))
}

/// Create the log directory (and parents) if missing.
pub fn prepare_log_directory(dir: &Path) -> Result<(), StartupError> {
    std::fs::create_dir_all(dir).map_err(|source| StartupError::LogDirectory {
        path: dir.to_path_buf(),
        source,
    })?;
    tracing::info!(directory = %dir.display(), "Log directory ready");
    Ok(())
}

/// Bind a TCP listener on `address`.
pub async fn bind_listener(address: &str) -> Result<TcpListener, StartupError> {
    let bind_error = |source| StartupError::Bind {
        address: address.to_string(),
        source,
    };

    let addr: SocketAddr = address
        .parse()
        .map_err(|e| bind_error(std::io::Error::new(std::io::ErrorKind::InvalidInput, e)))?;

    let listener = TcpListener::bind(addr).await.map_err(bind_error)?;
    let local_addr = listener.local_addr().map_err(bind_error)?;

    tracing::info!(address = %local_addr, "Listener bound");
    Ok(listener)
}
