//! Hour bucket naming.
//!
//! A bucket file is `YYYY-MM-DDTHH.log`, named from wall-clock time in the
//! configured zone. Parsing is the exact inverse; names that do not
//! round-trip are not buckets.

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

/// File suffix of every bucket.
pub const BUCKET_SUFFIX: &str = ".log";

const BUCKET_FORMAT: &str = "%Y-%m-%dT%H";

/// File name of the bucket containing `at`, in `at`'s own zone.
pub fn bucket_file_name(at: &DateTime<Tz>) -> String {
    format!("{}{}", at.format(BUCKET_FORMAT), BUCKET_SUFFIX)
}

/// Start of the bucket named `name`, interpreted in `tz`.
///
/// Returns `None` for anything that is not a bucket name, and for local
/// hours skipped by a DST transition. A repeated hour resolves to its later
/// occurrence, since both occurrences append to the same file.
pub fn parse_bucket_file_name(name: &str, tz: Tz) -> Option<DateTime<Tz>> {
    let stem = name.strip_suffix(BUCKET_SUFFIX)?;
    let naive = NaiveDateTime::parse_from_str(&format!("{stem}:00"), "%Y-%m-%dT%H:%M").ok()?;

    if naive.format(BUCKET_FORMAT).to_string() != stem {
        return None;
    }

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(start) => Some(start),
        LocalResult::Ambiguous(_, later) => Some(later),
        LocalResult::None => None,
    }
}
