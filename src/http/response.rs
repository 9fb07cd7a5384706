//! Error responses.
//!
//! # Design Decisions
//! - Every refusal carries only the canonical reason phrase
//! - Which internal rule fired is logged, never sent to the client

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

/// Terminal outcomes other than serving a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    MethodNotAllowed,
    Forbidden,
    NotFound,
    Internal,
}

impl Denial {
    pub fn status(self) -> StatusCode {
        match self {
            Denial::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Denial::Forbidden => StatusCode::FORBIDDEN,
            Denial::NotFound => StatusCode::NOT_FOUND,
            Denial::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Denial {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = format!("{}\n", status.canonical_reason().unwrap_or("Error"));

        let mut response = (status, body).into_response();
        let headers = response.headers_mut();
        headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        if self == Denial::MethodNotAllowed {
            headers.insert(header::ALLOW, HeaderValue::from_static("GET, HEAD"));
        }
        response
    }
}
