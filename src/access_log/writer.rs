//! Append-only hourly log files.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use thiserror::Error;

use crate::access_log::bucket::bucket_file_name;
use crate::access_log::entry::AccessLogEntry;

/// Error type for a single append.
#[derive(Debug, Error)]
pub enum LogWriteError {
    #[error("failed to encode log entry: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to open log file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write log file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writes access log entries into hour buckets under one directory.
///
/// Each entry is a single `write_all` on a file opened in append mode, made
/// while holding a directory-wide lock, so concurrent requests never
/// interleave partial lines.
///
/// Appends are synchronous and run on the calling thread, which for the
/// access log middleware is a tokio worker. The lock covers one small open and
/// write, and an entry is on disk by the time the response body is dropped.
#[derive(Debug)]
pub struct LogWriter {
    directory: PathBuf,
    timezone: Tz,
    lock: Mutex<()>,
}

impl LogWriter {
    pub fn new(directory: impl Into<PathBuf>, timezone: Tz) -> Self {
        Self {
            directory: directory.into(),
            timezone,
            lock: Mutex::new(()),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Current time in the log timezone.
    pub fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.timezone)
    }

    /// Path of the bucket file that `at` falls into.
    pub fn bucket_path(&self, at: &DateTime<Tz>) -> PathBuf {
        self.directory
            .join(bucket_file_name(&at.with_timezone(&self.timezone)))
    }

    /// Append `entry` to the bucket for `at`, returning the file written.
    pub fn try_append(&self, entry: &AccessLogEntry, at: &DateTime<Tz>) -> Result<PathBuf, LogWriteError> {
        let line = entry.to_line()?;
        let path = self.bucket_path(at);

        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut file = open_append(&path).map_err(|source| LogWriteError::Open {
            path: path.clone(),
            source,
        })?;
        file.write_all(line.as_bytes())
            .map_err(|source| LogWriteError::Write {
                path: path.clone(),
                source,
            })?;

        Ok(path)
    }

    /// Best-effort append: failures are reported and the entry is dropped.
    pub fn append(&self, entry: &AccessLogEntry, at: &DateTime<Tz>) {
        if let Err(e) = self.try_append(entry, at) {
            tracing::error!(error = %e, path = %entry.path, status = entry.status, "Dropping access log entry");
        }
    }
}

fn open_append(path: &Path) -> std::io::Result<std::fs::File> {
    let mut options = OpenOptions::new();
    options.append(true).create(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }

    options.open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use chrono::TimeZone;
    use chrono_tz::America::Chicago;

    fn entry(at: &DateTime<Tz>, path: &str) -> AccessLogEntry {
        AccessLogEntry::new(at, "GET", path, 200, 42, Duration::from_millis(3))
    }

    fn read_entries(path: &Path) -> Vec<AccessLogEntry> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_same_hour_appends_to_same_file() {
        let dir = tempfile::tempdir().unwrap();
        let writer = LogWriter::new(dir.path(), Chicago);

        let first = Chicago.with_ymd_and_hms(2025, 3, 10, 14, 37, 0).unwrap();
        let second = Chicago.with_ymd_and_hms(2025, 3, 10, 14, 59, 59).unwrap();

        let a = writer.try_append(&entry(&first, "/a.html"), &first).unwrap();
        let b = writer.try_append(&entry(&second, "/b.html"), &second).unwrap();

        assert_eq!(a, b);
        assert_eq!(a, dir.path().join("2025-03-10T14.log"));

        let entries = read_entries(&a);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, "/a.html");
        assert_eq!(entries[1].path, "/b.html");
    }

    #[test]
    fn test_next_hour_starts_new_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let writer = LogWriter::new(dir.path(), Chicago);

        let at = Chicago.with_ymd_and_hms(2025, 3, 10, 15, 0, 0).unwrap();
        let path = writer.try_append(&entry(&at, "/c.html"), &at).unwrap();
        assert_eq!(path, dir.path().join("2025-03-10T15.log"));
    }

    #[test]
    fn test_bucket_follows_writer_timezone() {
        let dir = tempfile::tempdir().unwrap();
        let writer = LogWriter::new(dir.path(), Chicago);

        let at = chrono_tz::UTC.with_ymd_and_hms(2025, 7, 1, 3, 15, 0).unwrap();
        assert_eq!(writer.bucket_path(&at), dir.path().join("2025-06-30T22.log"));
    }

    #[test]
    fn test_concurrent_appends_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let writer = Arc::new(LogWriter::new(dir.path(), Chicago));
        let at = Chicago.with_ymd_and_hms(2025, 3, 10, 14, 0, 0).unwrap();
        let long_path = format!("/{}.html", "x".repeat(4096));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let writer = writer.clone();
                let long_path = long_path.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        writer.try_append(&entry(&at, &long_path), &at).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let entries = read_entries(&writer.bucket_path(&at));
        assert_eq!(entries.len(), 400);
        assert!(entries.iter().all(|e| e.path == long_path));
    }

    #[test]
    fn test_append_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let writer = LogWriter::new(dir.path().join("missing"), Chicago);
        let at = Chicago.with_ymd_and_hms(2025, 3, 10, 14, 0, 0).unwrap();

        assert!(matches!(
            writer.try_append(&entry(&at, "/a.html"), &at),
            Err(LogWriteError::Open { .. })
        ));
        writer.append(&entry(&at, "/a.html"), &at);
    }
}
