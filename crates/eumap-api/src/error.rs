//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The command is not allowed in the current data mode.
  #[error("conflict: {0}")]
  Conflict(String),

  #[error("unprocessable: {0}")]
  Unprocessable(String),

  #[error("internal error: {0}")]
  Internal(String),
}

impl From<eumap_core::Error> for ApiError {
  fn from(e: eumap_core::Error) -> Self {
    use eumap_core::Error as E;
    match e {
      E::UnknownCountry(_) | E::UnknownIndicator(_) | E::UnknownArtifact(_) => {
        Self::NotFound(e.to_string())
      }
      E::UnknownOperation(_) | E::InvalidYearRange { .. } => Self::BadRequest(e.to_string()),
    }
  }
}

impl From<eumap_cache::Error> for ApiError {
  fn from(e: eumap_cache::Error) -> Self {
    use eumap_cache::Error as E;
    match e {
      E::Core(e) => e.into(),
      E::InvalidFormat(_) | E::InvalidValue(_) => Self::BadRequest(e.to_string()),
      E::NotLive | E::NotCustom => Self::Conflict(e.to_string()),
    }
  }
}

impl From<eumap_view::Error> for ApiError {
  fn from(e: eumap_view::Error) -> Self {
    use eumap_view::Error as E;
    match e {
      E::Core(e) => e.into(),
      E::Cache(e) => e.into(),
      E::EmptySelection => Self::BadRequest(e.to_string()),
      E::DataUnavailable { .. } => Self::Unprocessable(e.to_string()),
      E::Render(_) => {
        tracing::error!(error = %e, "export failed");
        Self::Internal(e.to_string())
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Unprocessable(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
      ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m.clone()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
