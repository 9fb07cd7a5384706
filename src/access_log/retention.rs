//! Retention sweeping of expired log buckets.
//!
//! # Responsibilities
//! - List the log directory (non-recursive)
//! - Parse bucket names back into their start time
//! - Delete buckets that started before `now - retention`
//!
//! Unknown files are never touched. A file that vanished between listing and
//! deletion counts as already handled.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::access_log::bucket::parse_bucket_file_name;

/// Error type for a sweep that could not run at all.
#[derive(Debug, Error)]
pub enum RetentionError {
    #[error("failed to read log directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sweep task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Deletes log buckets older than the retention window.
#[derive(Debug, Clone)]
pub struct RetentionSweeper {
    directory: PathBuf,
    timezone: Tz,
    retention: TimeDelta,
}

impl RetentionSweeper {
    pub fn new(directory: impl Into<PathBuf>, timezone: Tz, retention_hours: u64) -> Self {
        let retention = i64::try_from(retention_hours)
            .ok()
            .and_then(TimeDelta::try_hours)
            .unwrap_or(TimeDelta::MAX);

        Self {
            directory: directory.into(),
            timezone,
            retention,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn retention(&self) -> TimeDelta {
        self.retention
    }

    /// Delete every bucket that started strictly before `now - retention`.
    ///
    /// Returns the number of files removed by this call.
    pub fn sweep(&self, now: DateTime<Tz>) -> Result<usize, RetentionError> {
        let Some(cutoff) = now.checked_sub_signed(self.retention) else {
            return Ok(0);
        };

        let entries = std::fs::read_dir(&self.directory).map_err(|source| RetentionError::ReadDir {
            path: self.directory.clone(),
            source,
        })?;

        let mut removed = 0;
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable log directory entry");
                    continue;
                }
            };

            if entry.file_type().map(|t| t.is_dir()).unwrap_or(true) {
                continue;
            }

            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let Some(bucket_start) = parse_bucket_file_name(name, self.timezone) else {
                continue;
            };

            if bucket_start >= cutoff {
                continue;
            }

            if remove_bucket(&entry.path()) {
                removed += 1;
            }
        }

        Ok(removed)
    }

    /// Run one sweep against the wall clock on the blocking pool.
    pub async fn sweep_now(self: &Arc<Self>) -> Result<usize, RetentionError> {
        let sweeper = Arc::clone(self);
        tokio::task::spawn_blocking(move || {
            let now = Utc::now().with_timezone(&sweeper.timezone);
            sweeper.sweep(now)
        })
        .await?
    }

    /// Sweep every `period` until shutdown. The first sweep happens one period from now.
    pub async fn run(self: Arc<Self>, period: Duration, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            directory = %self.directory.display(),
            retention_hours = self.retention.num_hours(),
            interval_secs = period.as_secs(),
            "Retention sweeper starting"
        );

        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    report(self.sweep_now().await);
                }
                _ = shutdown.recv() => {
                    tracing::info!("Retention sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

/// Delete one expired bucket. Returns true only if this call removed it.
///
/// A bucket that is already gone is fine, and any other failure is logged so
/// the sweep can move on to the next file.
fn remove_bucket(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::info!(file = %path.display(), "Removed expired log bucket");
            true
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(file = %path.display(), "Log bucket already gone");
            false
        }
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "Failed to remove expired log bucket");
            false
        }
    }
}

/// Log the outcome of a sweep. Failures are never fatal.
pub fn report(result: Result<usize, RetentionError>) {
    match result {
        Ok(0) => tracing::debug!("Retention sweep found nothing to remove"),
        Ok(removed) => tracing::info!(removed, "Retention sweep complete"),
        Err(e) => tracing::error!(error = %e, "Retention sweep failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_log::bucket::bucket_file_name;
    use chrono::TimeZone;
    use chrono_tz::America::Chicago;
    use std::fs;

    /// Create one bucket for each of the last `hours` hours before `now` (inclusive of now).
    fn seed_hourly(dir: &Path, now: DateTime<Tz>, hours: i64) -> Vec<String> {
        (0..=hours)
            .map(|k| {
                let at = now - TimeDelta::hours(k);
                let name = bucket_file_name(&at);
                fs::write(dir.join(&name), "{}\n").unwrap();
                name
            })
            .collect()
    }

    fn remaining(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_removes_only_buckets_older_than_window() {
        let dir = tempfile::tempdir().unwrap();
        let now = Chicago.with_ymd_and_hms(2025, 6, 20, 12, 30, 0).unwrap();
        let created = seed_hourly(dir.path(), now, 240);
        assert_eq!(created.len(), 241);

        let sweeper = RetentionSweeper::new(dir.path(), Chicago, 168);
        let removed = sweeper.sweep(now).unwrap();

        // Buckets 168..=240 hours back start before now - 168h.
        assert_eq!(removed, 73);

        let left = remaining(dir.path());
        assert_eq!(left.len(), 168);
        assert_eq!(left.first().map(String::as_str), Some("2025-06-13T13.log"));
        assert_eq!(left.last().map(String::as_str), Some("2025-06-20T12.log"));
    }

    #[test]
    fn test_bucket_exactly_at_cutoff_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let now = Chicago.with_ymd_and_hms(2025, 6, 20, 12, 0, 0).unwrap();
        fs::write(dir.path().join("2025-06-13T12.log"), "").unwrap();
        fs::write(dir.path().join("2025-06-13T11.log"), "").unwrap();

        let sweeper = RetentionSweeper::new(dir.path(), Chicago, 168);
        assert_eq!(sweeper.sweep(now).unwrap(), 1);
        assert_eq!(remaining(dir.path()), vec!["2025-06-13T12.log".to_string()]);
    }

    #[test]
    fn test_unknown_files_and_directories_are_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let now = Chicago.with_ymd_and_hms(2025, 6, 20, 12, 0, 0).unwrap();

        for name in ["notes.txt", "2020-01-01T00.log.gz", "2020-1-1T0.log", "old.log", "2020-01-01T00"] {
            fs::write(dir.path().join(name), "keep").unwrap();
        }
        fs::create_dir(dir.path().join("2020-01-01T01.log")).unwrap();

        let sweeper = RetentionSweeper::new(dir.path(), Chicago, 168);
        assert_eq!(sweeper.sweep(now).unwrap(), 0);
        assert_eq!(remaining(dir.path()).len(), 6);
    }

    #[test]
    fn test_sweep_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let now = Chicago.with_ymd_and_hms(2025, 6, 20, 12, 30, 0).unwrap();
        seed_hourly(dir.path(), now, 240);

        let sweeper = RetentionSweeper::new(dir.path(), Chicago, 168);
        assert_eq!(sweeper.sweep(now).unwrap(), 73);
        assert_eq!(sweeper.sweep(now).unwrap(), 0);
        assert_eq!(remaining(dir.path()).len(), 168);
    }

    #[test]
    fn test_bucket_names_are_read_in_sweeper_timezone() {
        let dir = tempfile::tempdir().unwrap();
        // Read as Chicago time the bucket starts at 15:00 UTC, inside a 2 hour
        // window ending 16:30 UTC. Read as UTC it would start at 10:00 and expire.
        fs::write(dir.path().join("2025-06-20T10.log"), "").unwrap();
        let now = Chicago.with_ymd_and_hms(2025, 6, 20, 11, 30, 0).unwrap();

        let chicago_sweeper = RetentionSweeper::new(dir.path(), Chicago, 2);
        assert_eq!(chicago_sweeper.sweep(now).unwrap(), 0);

        let utc_sweeper = RetentionSweeper::new(dir.path(), chrono_tz::UTC, 2);
        assert_eq!(utc_sweeper.sweep(now).unwrap(), 1);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let sweeper = RetentionSweeper::new(dir.path().join("gone"), Chicago, 168);
        let now = Chicago.with_ymd_and_hms(2025, 6, 20, 12, 0, 0).unwrap();
        assert!(matches!(sweeper.sweep(now), Err(RetentionError::ReadDir { .. })));
    }

    #[test]
    fn test_huge_retention_removes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("1971-01-01T00.log"), "").unwrap();
        let sweeper = RetentionSweeper::new(dir.path(), Chicago, u64::MAX);
        let now = Chicago.with_ymd_and_hms(2025, 6, 20, 12, 0, 0).unwrap();
        assert_eq!(sweeper.sweep(now).unwrap(), 0);
    }

    #[test]
    fn test_remove_bucket_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!remove_bucket(&dir.path().join("2001-01-01T00.log")));
    }

    #[test]
    fn test_remove_bucket_failure_does_not_stop_later_removals() {
        let dir = tempfile::tempdir().unwrap();
        let stuck = dir.path().join("2001-01-01T00.log");
        fs::create_dir(&stuck).unwrap();
        fs::write(stuck.join("inner"), "x").unwrap();
        let expired = dir.path().join("2001-01-01T01.log");
        fs::write(&expired, "").unwrap();

        assert!(!remove_bucket(&stuck));
        assert!(stuck.exists());

        assert!(remove_bucket(&expired));
        assert!(!expired.exists());
    }

    #[tokio::test]
    async fn test_sweep_now_uses_wall_clock() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("2001-01-01T00.log"), "").unwrap();
        let current = bucket_file_name(&Utc::now().with_timezone(&Chicago));
        fs::write(dir.path().join(&current), "").unwrap();

        let sweeper = Arc::new(RetentionSweeper::new(dir.path(), Chicago, 168));
        assert_eq!(sweeper.sweep_now().await.unwrap(), 1);
        assert_eq!(remaining(dir.path()), vec![current]);
    }

    #[tokio::test]
    async fn test_run_sweeps_every_period() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "keep").unwrap();
        let sweeper = Arc::new(RetentionSweeper::new(dir.path(), Chicago, 168));
        let (tx, rx) = broadcast::channel(1);
        let task = tokio::spawn(sweeper.run(Duration::from_millis(50), rx));

        // Two buckets appearing at different times are both collected by later ticks.
        for name in ["2001-01-01T00.log", "2001-01-01T01.log"] {
            fs::write(dir.path().join(name), "").unwrap();
            let mut gone = false;
            for _ in 0..100 {
                tokio::time::sleep(Duration::from_millis(20)).await;
                if !dir.path().join(name).exists() {
                    gone = true;
                    break;
                }
            }
            assert!(gone, "{name} was not swept");
        }
        assert_eq!(remaining(dir.path()), vec!["notes.txt".to_string()]);

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let sweeper = Arc::new(RetentionSweeper::new(dir.path(), Chicago, 168));
        let (tx, rx) = broadcast::channel(1);

        let task = tokio::spawn(sweeper.run(Duration::from_secs(3600), rx));
        tx.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }
}
