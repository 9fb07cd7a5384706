//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the static file server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, request timeout).
    pub listener: ListenerConfig,

    /// Served directory and extension policy.
    pub files: FilesConfig,

    /// Hourly access log settings.
    pub access_log: AccessLogConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Time allowed for the handler to produce response headers, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Served content configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Directory files are served from. Only its direct children are reachable.
    pub root: PathBuf,

    /// Extensions that may be served (without the leading dot).
    pub allowed_extensions: Vec<String>,

    /// Extensions that are never served, even if allowed above.
    pub blocked_extensions: Vec<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/var/www"),
            allowed_extensions: [
                "html", "css", "js", "png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "json",
                "txt", "md",
            ]
            .iter()
            .map(|ext| ext.to_string())
            .collect(),
            blocked_extensions: vec!["log".to_string()],
        }
    }
}

/// Access log configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AccessLogConfig {
    /// Directory holding the hourly bucket files.
    pub directory: PathBuf,

    /// IANA timezone used to name buckets and stamp entries.
    pub timezone: String,

    /// Buckets older than this many hours are deleted.
    pub retention_hours: u64,

    /// Interval between retention sweeps in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for AccessLogConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("/var/log/app"),
            timezone: "America/Chicago".to_string(),
            retention_hours: 168,
            sweep_interval_secs: 3600,
        }
    }
}

/// Output format of the operational log.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Operational log format.
    pub format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}
