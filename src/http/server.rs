//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create a locally scoped Axum Router with the single static handler
//! - Wire up middleware (request ID, tracing, access log, timeout, panics)
//! - Bind server to listener
//! - Drain connections on shutdown

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::access_log::LogWriter;
use crate::config::ServerConfig;
use crate::http::handler::{serve_static, AppState};
use crate::http::recorder::access_log_middleware;
use crate::http::request::{request_span, X_REQUEST_ID};
use crate::http::response::Denial;
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::lifecycle::startup::{parse_timezone, StartupError};
use crate::security::{ExtensionPolicy, PathValidator};

/// HTTP server for the static file tree.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
    writer: Arc<LogWriter>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Result<Self, StartupError> {
        let timezone = parse_timezone(&config.access_log.timezone)?;

        let validator = PathValidator::new(&config.files.root).map_err(|source| StartupError::Root {
            path: config.files.root.clone(),
            source,
        })?;
        if !validator.root().is_dir() {
            tracing::warn!(root = %validator.root().display(), "Served root is not a directory; every request will fail");
        }

        let state = AppState {
            validator: Arc::new(validator),
            policy: Arc::new(ExtensionPolicy::from_config(&config.files)),
        };
        let writer = Arc::new(LogWriter::new(&config.access_log.directory, timezone));

        let router = Self::build_router(&config, state, writer.clone());
        Ok(Self {
            router,
            config,
            writer,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The router is built fresh here; nothing is registered anywhere else, so
    /// no endpoint exists beyond the static handler.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState, writer: Arc<LogWriter>) -> Router {
        Router::new()
            .fallback(serve_static)
            .with_state(state)
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(TimeoutLayer::new(Duration::from_secs(config.listener.request_timeout_secs)))
            .layer(middleware::from_fn_with_state(writer, access_log_middleware))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: ShutdownSignal) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            root = %self.config.files.root.display(),
            log_directory = %self.writer.directory().display(),
            timezone = %self.writer.timezone(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.recv().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// A clone of the fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn log_writer(&self) -> &Arc<LogWriter> {
        &self.writer
    }
}

fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("Request handler panicked");
    Denial::Internal.into_response()
}
