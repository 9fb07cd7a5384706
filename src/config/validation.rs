//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, retention longer than one bucket)
//! - Check the timezone names a real IANA zone
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use chrono_tz::Tz;
use thiserror::Error;

use crate::config::schema::ServerConfig;

/// Shortest retention that can never reach the bucket currently being written.
pub const MIN_RETENTION_HOURS: u64 = 2;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),

    #[error("listener.request_timeout_secs must be greater than zero")]
    RequestTimeout,

    #[error("files.root must not be empty")]
    EmptyRoot,

    #[error("access_log.directory must not be empty")]
    EmptyLogDirectory,

    #[error("access_log.timezone `{0}` is not a known IANA timezone")]
    Timezone(String),

    #[error("access_log.retention_hours must be at least {MIN_RETENTION_HOURS}, got {0}")]
    Retention(u64),

    #[error("access_log.sweep_interval_secs must be greater than zero")]
    SweepInterval,

    #[error("files extension entry `{0}` is empty or contains a path separator")]
    Extension(String),
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    if config.files.root.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyRoot);
    }
    for ext in config
        .files
        .allowed_extensions
        .iter()
        .chain(&config.files.blocked_extensions)
    {
        let bare = ext.trim_start_matches('.');
        if bare.is_empty() || bare.contains(['/', '\\']) {
            errors.push(ValidationError::Extension(ext.clone()));
        }
    }

    let log = &config.access_log;
    if log.directory.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyLogDirectory);
    }
    if log.timezone.parse::<Tz>().is_err() {
        errors.push(ValidationError::Timezone(log.timezone.clone()));
    }
    if log.retention_hours < MIN_RETENTION_HOURS {
        errors.push(ValidationError::Retention(log.retention_hours));
    }
    if log.sweep_interval_secs == 0 {
        errors.push(ValidationError::SweepInterval);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
