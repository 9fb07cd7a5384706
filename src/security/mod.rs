//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path:
//!     → path.rs (percent-decode, flat-namespace checks, root prefix check)
//!     → extensions.rs (blocklist, then allowlist)
//!     → handler decides 403 / 404 / serve
//! ```
//!
//! # Design Decisions
//! - Defense in depth: the root prefix check runs even when earlier checks passed
//! - Fail closed: unknown extensions are refused
//! - No trust in client input; rejection reasons never reach the client

pub mod extensions;
pub mod path;

pub use extensions::ExtensionPolicy;
pub use path::{decode_request_path, validate, PathRejection, PathValidator, ResolvedPath};
