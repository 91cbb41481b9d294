//! Error types and axum `IntoResponse` implementation.

use axum::{
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The request path resolves outside the public directory.
  #[error("path escapes the public directory: {0}")]
  PathEscape(String),

  #[error("file not found: {0}")]
  NotFound(String),

  #[error("i/o error: {0}")]
  Io(#[from] std::io::Error),

  /// A proxy path segment contained characters the provider never uses.
  #[error("bad proxy request: {0}")]
  BadProxyPath(String),

  /// The provider could not be reached.
  #[error("upstream error: {0}")]
  Upstream(String),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::PathEscape(_) => (
        StatusCode::FORBIDDEN,
        [(header::CONTENT_TYPE, "text/plain")],
        "Access Denied",
      )
        .into_response(),
      Error::NotFound(_) => (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/html")],
        "<h1>404 Not Found</h1>",
      )
        .into_response(),
      Error::Io(e) => {
        (StatusCode::INTERNAL_SERVER_ERROR, format!("Server Error: {}", e.kind()))
          .into_response()
      }
      Error::BadProxyPath(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
      Error::Upstream(_) => (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "text/plain")],
        "Server Error",
      )
        .into_response(),
    }
  }
}
