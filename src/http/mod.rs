//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, tracing span)
//!     → recorder.rs (completion hook opened, response body wrapped)
//!     → handler.rs (method, path, extension, stat, serve)
//!     → response.rs (generic refusals)
//!     → Send to client, then one access log line
//! ```

pub mod handler;
pub mod recorder;
pub mod request;
pub mod response;
pub mod server;

pub use handler::{serve_static, AppState};
pub use recorder::{RecordingBody, RequestCompletion, ResponseRecorder};
pub use request::X_REQUEST_ID;
pub use response::Denial;
pub use server::HttpServer;
