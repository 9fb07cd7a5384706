//! Access log subsystem.
//!
//! # Data Flow
//! ```text
//! Completed request (http/recorder.rs):
//!     → entry.rs (AccessLogEntry, one JSON line)
//!     → writer.rs (append to bucket named by bucket.rs)
//!     → <log_dir>/YYYY-MM-DDTHH.log
//!
//! Periodic timer (retention.rs):
//!     → list <log_dir>
//!     → parse names with bucket.rs
//!     → delete buckets older than the retention window
//! ```
//!
//! # Design Decisions
//! - Buckets are named in one fixed civil timezone, never host-local time
//! - Logging is best effort: a failed append never affects the response
//! - Writer and sweeper share nothing but the directory

pub mod bucket;
pub mod entry;
pub mod retention;
pub mod writer;

pub use bucket::{bucket_file_name, parse_bucket_file_name, BUCKET_SUFFIX};
pub use entry::AccessLogEntry;
pub use retention::{RetentionError, RetentionSweeper};
pub use writer::{LogWriteError, LogWriter};
