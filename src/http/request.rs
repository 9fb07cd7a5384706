//! Request identification.
//!
//! # Responsibilities
//! - Assign a UUID request ID as early as possible
//! - Echo it back in the response
//! - Attach it to the per-request tracing span

use axum::extract::Request;
use axum::http::HeaderName;
use tracing::Span;

/// Header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Span for one request, used by the trace layer.
pub fn request_span(request: &Request) -> Span {
    let request_id = request
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    )
}
