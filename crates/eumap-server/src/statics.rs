//! Static files from the public directory.
//!
//! `/` serves `index.html`; the query string is ignored. Paths are resolved
//! lexically and anything that climbs out of the root is refused before the
//! filesystem is touched.

use std::{
  io::ErrorKind,
  path::{Path, PathBuf},
};

use axum::{
  extract::State,
  http::{Uri, header},
  response::{IntoResponse, Response},
};

use crate::{AppState, error::Error};

const INDEX: &str = "index.html";

/// Content type served for a file extension (lowercased, with the dot).
pub fn mime_type(path: &Path) -> &'static str {
  let extension = path
    .extension()
    .and_then(|e| e.to_str())
    .map(str::to_ascii_lowercase)
    .unwrap_or_default();
  match extension.as_str() {
    "html" => "text/html",
    "js" => "text/javascript",
    "css" => "text/css",
    "json" => "application/json",
    "png" => "image/png",
    "jpg" => "image/jpg",
    "wav" => "audio/wav",
    "mp4" => "video/mp4",
    "woff" => "application/font-woff",
    "ttf" => "application/font-ttf",
    "eot" => "application/vnd.ms-fontobject",
    "otf" => "application/font-otf",
    "svg" => "application/image/svg+xml",
    _ => "application/octet-stream",
  }
}

/// Map a request path onto a file under `root`.
pub fn resolve(root: &Path, request_path: &str) -> Result<PathBuf, Error> {
  if request_path == "/" || request_path.is_empty() {
    return Ok(root.join(INDEX));
  }

  let mut parts: Vec<&str> = Vec::new();
  for segment in request_path.split('/') {
    match segment {
      "" | "." => {}
      ".." => {
        if parts.pop().is_none() {
          return Err(Error::PathEscape(request_path.to_string()));
        }
      }
      s if s.contains('\\') || s.contains('\0') => {
        return Err(Error::PathEscape(request_path.to_string()));
      }
      s => parts.push(s),
    }
  }

  Ok(parts.into_iter().fold(root.to_path_buf(), |path, part| path.join(part)))
}

/// Fallback handler: serve a file from the public directory.
pub async fn serve(State(state): State<AppState>, uri: Uri) -> Result<Response, Error> {
  let path = resolve(&state.public_dir, uri.path()).inspect_err(|_| {
    tracing::warn!(path = uri.path(), "refusing path outside the public directory");
  })?;
  tracing::debug!(?path, "serving file");

  let content = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
    ErrorKind::NotFound => Error::NotFound(uri.path().to_string()),
    _ => Error::Io(e),
  })?;

  Ok(([(header::CONTENT_TYPE, mime_type(&path))], content).into_response())
}
