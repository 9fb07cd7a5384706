//! File extension allowlist / blocklist.

use std::collections::HashSet;
use std::path::Path;

use crate::config::FilesConfig;

/// Extensions that are blocked no matter what the configuration says.
///
/// `log` is the access log bucket suffix.
pub const RESERVED_BLOCKED: &[&str] = &["log"];

/// Decides which files may be served by their extension.
///
/// The blocklist is consulted first and always wins; anything not on the
/// allowlist is refused.
#[derive(Debug, Clone)]
pub struct ExtensionPolicy {
    allowed: HashSet<String>,
    blocked: HashSet<String>,
}

impl ExtensionPolicy {
    pub fn new<A, B>(allowed: A, blocked: B) -> Self
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        B: IntoIterator,
        B::Item: AsRef<str>,
    {
        let mut blocked: HashSet<String> = blocked.into_iter().map(|e| fold(e.as_ref())).collect();
        blocked.extend(RESERVED_BLOCKED.iter().map(|e| e.to_string()));

        Self {
            allowed: allowed.into_iter().map(|e| fold(e.as_ref())).collect(),
            blocked,
        }
    }

    pub fn from_config(config: &FilesConfig) -> Self {
        Self::new(&config.allowed_extensions, &config.blocked_extensions)
    }

    /// Return a copy with one more allowed extension.
    pub fn with_allowed(mut self, ext: &str) -> Self {
        self.allowed.insert(fold(ext));
        self
    }

    /// Whether the file at `path` may be served.
    pub fn is_servable(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        match extension_of(name) {
            Some(ext) => self.allows(&ext),
            None => false,
        }
    }

    /// Check an already extracted, lowercase extension.
    pub fn allows(&self, ext: &str) -> bool {
        if self.blocked.contains(ext) {
            return false;
        }
        self.allowed.contains(ext)
    }
}

/// Lowercase extension of a file name: everything after the last dot.
///
/// A name with no dot, or ending in a dot, has no extension.
pub fn extension_of(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

fn fold(ext: &str) -> String {
    ext.trim_start_matches('.').to_lowercase()
}
