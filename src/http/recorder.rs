//! Response recording and the per-request completion hook.
//!
//! The access log middleware opens a [`RequestCompletion`] before the handler
//! runs. It rides along inside the response body as a [`RecordingBody`], so its
//! `Drop` fires exactly once, after the body has been sent or abandoned, and
//! writes the log entry with whatever the recorder saw.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::Response,
};
use bytes::Buf;
use http_body::{Body as HttpBody, Frame, SizeHint};

use crate::access_log::{AccessLogEntry, LogWriter};

/// Observed response metadata: first status set and total body bytes.
#[derive(Debug, Default)]
pub struct ResponseRecorder {
    status: Option<StatusCode>,
    bytes_written: u64,
}

impl ResponseRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the response status. Only the first call takes effect.
    pub fn write_header(&mut self, status: StatusCode) -> bool {
        if self.status.is_some() {
            return false;
        }
        self.status = Some(status);
        true
    }

    pub fn record_bytes(&mut self, n: usize) {
        self.bytes_written += n as u64;
    }

    /// Status recorded so far; a response that never set one is an implicit 200.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

/// Writes one access log entry when dropped.
pub struct RequestCompletion {
    writer: Arc<LogWriter>,
    method: Method,
    path: String,
    started: Instant,
    recorder: ResponseRecorder,
}

impl RequestCompletion {
    pub fn begin(writer: Arc<LogWriter>, method: Method, path: String) -> Self {
        Self {
            writer,
            method,
            path,
            started: Instant::now(),
            recorder: ResponseRecorder::new(),
        }
    }

    pub fn recorder(&self) -> &ResponseRecorder {
        &self.recorder
    }

    pub fn recorder_mut(&mut self) -> &mut ResponseRecorder {
        &mut self.recorder
    }
}

impl Drop for RequestCompletion {
    fn drop(&mut self) {
        let now = self.writer.now();
        let entry = AccessLogEntry::new(
            &now,
            self.method.as_str(),
            &self.path,
            self.recorder.status().as_u16(),
            self.recorder.bytes_written(),
            self.started.elapsed(),
        );
        self.writer.append(&entry, &now);
    }
}

/// Body decorator that counts data bytes and otherwise forwards everything.
pub struct RecordingBody<B> {
    inner: B,
    completion: RequestCompletion,
}

impl<B> RecordingBody<B> {
    pub fn new(inner: B, completion: RequestCompletion) -> Self {
        Self { inner, completion }
    }
}

impl<B> HttpBody for RecordingBody<B>
where
    B: HttpBody + Unpin,
{
    type Data = B::Data;
    type Error = B::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = &mut *self;
        let polled = Pin::new(&mut this.inner).poll_frame(cx);

        if let Poll::Ready(Some(Ok(frame))) = &polled {
            if let Some(data) = frame.data_ref() {
                this.completion.recorder.record_bytes(data.remaining());
            }
        }

        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

/// Middleware guaranteeing one access log entry per request.
pub async fn access_log_middleware(
    State(writer): State<Arc<LogWriter>>,
    request: Request,
    next: Next,
) -> Response {
    let mut completion = RequestCompletion::begin(
        writer,
        request.method().clone(),
        request.uri().path().to_string(),
    );

    let response = next.run(request).await;
    completion.recorder_mut().write_header(response.status());

    let (parts, body) = response.into_parts();
    Response::from_parts(parts, Body::new(RecordingBody::new(body, completion)))
}
