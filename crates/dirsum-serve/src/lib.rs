//! HTTP service for dirsum.
//!
//! Exposes snapshot diffing against a live directory plus raw upload and
//! delete, so a remote client can find out which paths differ and push
//! replacements:
//!
//! | Route | Purpose |
//! |---|---|
//! | `GET /log` | operation log text, appends an `end;` marker |
//! | `GET /exit` | stop serving immediately |
//! | `POST /file-summary-diff` | diff a posted snapshot against the live tree |
//! | `POST /file-delete` | remove a path under the root |
//! | `POST /file-upload` | write a base64-encoded file under the root |
//!
//! ```rust,no_run
//! use dirsum_serve::{OperationLog, ServeConfig, serve};
//!
//! # async fn run() -> Result<(), dirsum_serve::ServeError> {
//! let config = ServeConfig::new("/srv/data");
//! let log = OperationLog::new(config.log_capacity);
//! serve(config, log).await
//! # }
//! ```

mod config;
mod error;
mod handlers;
mod oplog;
mod server;

pub use config::{
    DEFAULT_LOG_CAPACITY, DEFAULT_MAX_BODY_BYTES, DEFAULT_PORT, ServeConfig, ServeConfigBuilder,
};
pub use error::{ApiError, ServeError};
pub use handlers::{DeleteForm, UploadRequest, resolve_target};
pub use oplog::{OperationLog, READ_MARKER};
pub use server::{AppState, router, serve, serve_with_listener};
