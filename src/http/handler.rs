//! Static file request handler.
//!
//! # State Machine
//! ```text
//! Received → MethodChecked → PathValidated → ExtensionChecked → Stat'd
//!     → NotFound | Forbidden | Serving
//! ```
//! Logging happens outside this handler, in the access log middleware, so
//! every branch below is recorded without an explicit call.

use std::io::ErrorKind;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::Method,
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::http::response::Denial;
use crate::security::{decode_request_path, ExtensionPolicy, PathValidator};

/// Shared, read-only handler state.
#[derive(Clone)]
pub struct AppState {
    pub validator: Arc<PathValidator>,
    pub policy: Arc<ExtensionPolicy>,
}

/// Serve a single file from the flat served root.
pub async fn serve_static(State(state): State<AppState>, request: Request) -> Response {
    if !matches!(*request.method(), Method::GET | Method::HEAD) {
        tracing::debug!(method = %request.method(), "Method not allowed");
        return Denial::MethodNotAllowed.into_response();
    }

    let raw_path = request.uri().path();
    let resolved = match decode_request_path(raw_path).and_then(|p| state.validator.validate(&p)) {
        Ok(resolved) => resolved,
        Err(reason) => {
            tracing::warn!(path = %raw_path, reason = %reason, "Rejected request path");
            return Denial::Forbidden.into_response();
        }
    };

    let servable = state.policy.is_servable(resolved.as_path());

    let metadata = match tokio::fs::metadata(resolved.as_path()).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Denial::NotFound.into_response();
        }
        Err(e) => {
            tracing::error!(file = %resolved.as_path().display(), error = %e, "Failed to stat file");
            return Denial::Internal.into_response();
        }
    };

    // The root itself passes validation; it is refused here.
    if metadata.is_dir() {
        tracing::debug!(file = %resolved.as_path().display(), "Refusing directory");
        return Denial::Forbidden.into_response();
    }

    if !servable {
        tracing::debug!(file = %resolved.as_path().display(), "Extension not servable");
        return Denial::Forbidden.into_response();
    }

    // The file sender reports unreadable files as missing; refuse them here instead.
    if let Err(e) = tokio::fs::File::open(resolved.as_path()).await {
        return match e.kind() {
            ErrorKind::PermissionDenied => {
                tracing::debug!(file = %resolved.as_path().display(), "File not readable");
                Denial::Forbidden.into_response()
            }
            ErrorKind::NotFound => Denial::NotFound.into_response(),
            _ => {
                tracing::error!(file = %resolved.as_path().display(), error = %e, "Failed to open file");
                Denial::Internal.into_response()
            }
        };
    }

    match ServeFile::new(resolved.as_path()).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}
