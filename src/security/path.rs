//! Request path sanitization.
//!
//! The served root is a flat namespace: a request may only name a direct
//! child of the root. Every check below short-circuits to a rejection, and
//! the final prefix check always runs even though the earlier ones should
//! already make it unreachable.

use std::borrow::Cow;
use std::ffi::OsString;
use std::path::{Path, PathBuf, MAIN_SEPARATOR_STR};

use percent_encoding::percent_decode_str;
use thiserror::Error;

/// Why a candidate path was refused.
///
/// Only used for diagnostics; every variant is answered with the same 403.
#[derive(Debug, Error)]
pub enum PathRejection {
    #[error("directory access not allowed")]
    DirectoryAccess,

    #[error("subdirectories not allowed")]
    Subdirectory,

    #[error("directory traversal detected")]
    TraversalToken,

    #[error("directory traversal detected after normalization")]
    TraversalAfterNormalize,

    #[error("control character in path")]
    ControlCharacter,

    #[error("path is not valid percent-encoded UTF-8")]
    InvalidEncoding,

    #[error("path escapes served root")]
    EscapesRoot,

    #[error("failed to resolve absolute path: {0}")]
    Unresolvable(#[source] std::io::Error),
}

/// A filesystem path proven to sit directly under the served root (or be the root).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath(PathBuf);

impl ResolvedPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for ResolvedPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Validates request paths against a fixed served root.
#[derive(Debug, Clone)]
pub struct PathValidator {
    root: PathBuf,
}

impl PathValidator {
    /// Create a validator, making `root` absolute once up front.
    ///
    /// Symlinks are not resolved; the root is taken as configured.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self {
            root: std::path::absolute(root.as_ref())?,
        })
    }

    /// The absolute served root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate a decoded request path.
    pub fn validate(&self, candidate: &str) -> Result<ResolvedPath, PathRejection> {
        validate(candidate, &self.root)
    }
}

/// Percent-decode the raw URI path. Non-UTF-8 results are rejected.
pub fn decode_request_path(raw: &str) -> Result<String, PathRejection> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(Cow::into_owned)
        .map_err(|_| PathRejection::InvalidEncoding)
}

/// Turn an untrusted, already decoded request path into a path under `root`.
pub fn validate(candidate: &str, root: &Path) -> Result<ResolvedPath, PathRejection> {
    let name = candidate.strip_prefix('/').unwrap_or(candidate);

    if name.is_empty() || name == "." {
        return Err(PathRejection::DirectoryAccess);
    }

    // Flat namespace: any separator is an attack, not a feature.
    if name.contains(['/', '\\']) {
        return Err(PathRejection::Subdirectory);
    }

    if name.contains("..") {
        return Err(PathRejection::TraversalToken);
    }

    if name.contains('\0') {
        return Err(PathRejection::ControlCharacter);
    }

    let clean = normalize(name);
    if clean.contains("..") {
        return Err(PathRejection::TraversalAfterNormalize);
    }

    let joined = root.join(&*clean);

    let abs_root = std::path::absolute(root).map_err(PathRejection::Unresolvable)?;
    let abs_path = std::path::absolute(&joined).map_err(PathRejection::Unresolvable)?;

    if !is_within(&abs_root, &abs_path) {
        return Err(PathRejection::EscapesRoot);
    }

    Ok(ResolvedPath(abs_path))
}

/// Lexically collapse empty, `.` and `..` segments.
fn normalize(path: &str) -> Cow<'_, str> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|s| *s != "..") {
                    segments.pop();
                } else {
                    segments.push("..");
                }
            }
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        Cow::Borrowed(".")
    } else if segments.len() == 1 && segments[0] == path {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(segments.join("/"))
    }
}

/// True if `path` equals `root` or starts with `root` plus a separator, compared literally.
fn is_within(root: &Path, path: &Path) -> bool {
    if path.as_os_str() == root.as_os_str() {
        return true;
    }

    let mut prefix = OsString::from(root.as_os_str());
    if !root.as_os_str().as_encoded_bytes().ends_with(MAIN_SEPARATOR_STR.as_bytes()) {
        prefix.push(MAIN_SEPARATOR_STR);
    }

    path.as_os_str()
        .as_encoded_bytes()
        .starts_with(prefix.as_encoded_bytes())
}
