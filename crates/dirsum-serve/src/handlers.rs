//! Request handlers.
//!
//! Upload and delete act on the filesystem directly. They take no lock and
//! do not check against any earlier snapshot, so a client that diffs and
//! then uploads gets no atomicity between the two calls.

use std::io;
use std::path::{Component, Path, PathBuf};

use axum::Form;
use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Query, Request, State};
use axum::http::header;
use axum::response::IntoResponse;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use tokio::fs;
use tracing::{info, warn};

use dirsum_core::SnapshotStore;

use crate::error::ApiError;
use crate::server::AppState;

/// Form body of `POST /file-delete`.
#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub filename: Option<String>,
}

/// JSON body of `POST /file-upload`.
#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    #[serde(default)]
    pub filename: Option<String>,
    /// Base64-encoded file content.
    #[serde(default)]
    pub file: Option<String>,
}

/// `GET /log`
pub async fn read_log(State(state): State<AppState>) -> String {
    state.log().read_with_marker()
}

/// `GET /exit`
pub async fn exit(State(state): State<AppState>) -> &'static str {
    info!("exit requested over HTTP");
    state.log().record("exit requested");
    state.request_shutdown();
    "bye"
}

/// `POST /file-summary-diff`
///
/// Every failure here, including a malformed body, answers 500.
pub async fn file_summary_diff(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let baseline = SnapshotStore::from_slice(&body).map_err(|e| {
        warn!(error = %e, "rejecting diff request");
        ApiError::internal(e.to_string())
    })?;

    let walk_state = state.clone();
    let live = tokio::task::spawn_blocking(move || {
        walk_state.walker().walk(&walk_state.config().walk_config())
    })
    .await
    .map_err(|e| ApiError::internal(format!("walk task failed: {e}")))?
    .map_err(|e| {
        warn!(error = %e, "walk failed during diff");
        state.log().record(format!("diff failed: {e}"));
        ApiError::internal(e.to_string())
    })?;

    let changed = state.comparator().diff(&baseline, &live);
    info!(
        baseline = baseline.len(),
        live = live.len(),
        changed = changed.len(),
        "diff served"
    );
    state.log().record(format!(
        "diff: {} baseline entries, {} live entries, {} changed",
        baseline.len(),
        live.len(),
        changed.len()
    ));

    let json = serde_json::to_string_pretty(&changed)
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "application/json")], json))
}

/// `POST /file-delete`
///
/// `filename` is read from a urlencoded or multipart body, falling back to
/// the query string.
pub async fn file_delete(
    State(state): State<AppState>,
    request: Request,
) -> Result<&'static str, ApiError> {
    let filename = delete_filename(request)
        .await
        .ok_or_else(|| ApiError::bad_request("filename is required"))?;

    let target = resolve_target(&state.config().root, &filename)?;
    info!(path = %target.display(), "delete file");
    state.log().record(format!("delete file: {}", target.display()));

    remove_entry(&target).await.map_err(|e| {
        warn!(path = %target.display(), error = %e, "delete failed");
        state.log().record(format!("delete failed: {e}"));
        ApiError::internal(e.to_string())
    })?;

    Ok("ok")
}

/// `POST /file-upload`
pub async fn file_upload(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<&'static str, ApiError> {
    let request: UploadRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("decode body failed: {e}")))?;

    let filename = request
        .filename
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::bad_request("filename is required"))?;
    let encoded = request
        .file
        .filter(|file| !file.is_empty())
        .ok_or_else(|| ApiError::bad_request("file is required"))?;
    let content = STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| ApiError::bad_request(format!("decode file failed: {e}")))?;

    let target = resolve_target(&state.config().root, &filename)?;
    info!(path = %target.display(), bytes = content.len(), "upload file");
    state.log().record(format!("upload file: {}", target.display()));

    write_entry(&target, &content).await.map_err(|e| {
        warn!(path = %target.display(), error = %e, "upload failed");
        state.log().record(format!("upload failed: {e}"));
        ApiError::internal(format!("write file failed: {e}"))
    })?;

    Ok("ok")
}

/// Look up a non-empty `filename`. Body values win over the query string.
async fn delete_filename(request: Request) -> Option<String> {
    let from_query = Query::<DeleteForm>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(form)| form.filename)
        .filter(|value| !value.is_empty());

    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"));

    let from_body = if is_multipart {
        multipart_field(request, "filename").await
    } else {
        Form::<DeleteForm>::from_request(request, &())
            .await
            .ok()
            .and_then(|Form(form)| form.filename)
    };

    from_body.filter(|value| !value.is_empty()).or(from_query)
}

async fn multipart_field(request: Request, name: &str) -> Option<String> {
    let mut multipart = Multipart::from_request(request, &()).await.ok()?;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some(name) {
            return field.text().await.ok();
        }
    }
    None
}

/// Resolve a client-supplied relative name under `root`.
///
/// Accepts `/` or the platform separator. Absolute names, `..` and names
/// that resolve to the root itself are rejected.
pub fn resolve_target(root: &Path, filename: &str) -> Result<PathBuf, ApiError> {
    let normalized = filename.replace('\\', "/");
    if normalized.starts_with('/') {
        return Err(ApiError::bad_request(format!("absolute filename not allowed: {filename}")));
    }

    let mut target = root.to_path_buf();
    let mut depth = 0usize;
    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => {
                target.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ApiError::bad_request(format!(
                    "filename escapes the served directory: {filename}"
                )));
            }
        }
    }

    if depth == 0 {
        return Err(ApiError::bad_request("filename is required"));
    }
    Ok(target)
}

/// Remove a file, symlink or directory tree. A missing path is not an error.
async fn remove_entry(path: &Path) -> io::Result<()> {
    let metadata = match fs::symlink_metadata(path).await {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    };

    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Replace whatever is at `path` with a regular file holding `content`.
async fn write_entry(path: &Path, content: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    remove_entry(path).await?;
    fs::write(path, content).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_target_nested() {
        let root = Path::new("/srv");
        assert_eq!(
            resolve_target(root, "a/b.txt").unwrap(),
            root.join("a").join("b.txt")
        );
        assert_eq!(resolve_target(root, "./a").unwrap(), root.join("a"));
        assert_eq!(resolve_target(root, "a\\b").unwrap(), root.join("a").join("b"));
    }

    #[test]
    fn test_resolve_target_rejects_escape() {
        let root = Path::new("/srv");
        assert!(resolve_target(root, "../etc/passwd").is_err());
        assert!(resolve_target(root, "a/../../b").is_err());
        assert!(resolve_target(root, "/etc/passwd").is_err());
        assert!(resolve_target(root, ".").is_err());
        assert!(resolve_target(root, "").is_err());
    }
}
