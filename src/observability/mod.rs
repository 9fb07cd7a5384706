//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (startup, rejections, sweep results, I/O failures)
//!     → logging.rs subscriber → stderr (pretty or JSON)
//! ```
//!
//! # Design Decisions
//! - Structured fields rather than formatted messages
//! - Request ID recorded on every request span
//! - Kept apart from the access log so diagnostics never land in bucket files

pub mod logging;

pub use logging::init_logging;
