//! Router assembly and the serve loop.

use std::future::IntoFuture;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use dirsum_diff::Comparator;
use dirsum_scan::Walker;

use crate::config::ServeConfig;
use crate::error::ServeError;
use crate::handlers;
use crate::oplog::OperationLog;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<StateInner>,
}

struct StateInner {
    config: ServeConfig,
    walker: Walker,
    comparator: Comparator,
    log: OperationLog,
    shutdown: CancellationToken,
}

impl AppState {
    /// Create state with the default comparator.
    pub fn new(config: ServeConfig, log: OperationLog) -> Self {
        Self::with_comparator(config, log, Comparator::new())
    }

    pub fn with_comparator(config: ServeConfig, log: OperationLog, comparator: Comparator) -> Self {
        Self {
            inner: Arc::new(StateInner {
                config,
                walker: Walker::new(),
                comparator,
                log,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn config(&self) -> &ServeConfig {
        &self.inner.config
    }

    pub fn walker(&self) -> &Walker {
        &self.inner.walker
    }

    pub fn comparator(&self) -> &Comparator {
        &self.inner.comparator
    }

    pub fn log(&self) -> &OperationLog {
        &self.inner.log
    }

    /// Token cancelled when `/exit` is requested.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }

    /// Stop the serve loop without draining in-flight requests.
    pub fn request_shutdown(&self) {
        self.inner.shutdown.cancel();
    }
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config().max_body_bytes;

    Router::new()
        .route("/log", get(handlers::read_log))
        .route("/exit", get(handlers::exit))
        .route("/file-summary-diff", post(handlers::file_summary_diff))
        .route("/file-delete", post(handlers::file_delete))
        .route("/file-upload", post(handlers::file_upload))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Bind the configured address and serve until `/exit` is requested.
pub async fn serve(config: ServeConfig, log: OperationLog) -> Result<(), ServeError> {
    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })?;

    serve_with_listener(listener, AppState::new(config, log)).await
}

/// Serve on an already-bound listener until `/exit` is requested.
///
/// Returning does not wait for in-flight requests; they are dropped with
/// the runtime.
pub async fn serve_with_listener(listener: TcpListener, state: AppState) -> Result<(), ServeError> {
    let shutdown = state.shutdown_token();
    let addr = listener.local_addr()?;

    info!(
        %addr,
        root = %state.config().root.display(),
        threshold = state.config().big_file_threshold,
        "serving"
    );
    state
        .log()
        .record(format!("serving {} on {addr}", state.config().root.display()));

    let app = router(state);

    tokio::select! {
        result = axum::serve(listener, app).into_future() => {
            result?;
            Ok(())
        }
        _ = shutdown.cancelled() => {
            info!("exit requested, stopping");
            Ok(())
        }
    }
}
