//! One access log record.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A completed request, serialized as a single JSON line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessLogEntry {
    /// RFC 3339 timestamp with the zone's offset, second precision.
    pub timestamp: String,
    pub method: String,
    /// Request path exactly as received, before decoding.
    pub path: String,
    pub status: u16,
    pub bytes: u64,
    pub duration_ms: f64,
}

impl AccessLogEntry {
    pub fn new(
        at: &DateTime<Tz>,
        method: &str,
        path: &str,
        status: u16,
        bytes: u64,
        duration: Duration,
    ) -> Self {
        Self {
            timestamp: at.to_rfc3339_opts(SecondsFormat::Secs, true),
            method: method.to_string(),
            path: path.to_string(),
            status,
            bytes,
            duration_ms: duration.as_micros() as f64 / 1000.0,
        }
    }

    /// Encode as one newline-terminated line.
    pub fn to_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}
