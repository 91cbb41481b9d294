//! `GET /api/worldbank/{country}/{indicator}`: same-origin pass-through to the
//! provider's fixed-year query.

use axum::{
  body::Body,
  extract::{Path, State},
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use eumap_core::source::FetchError;

use crate::{AppState, error::Error};

/// Forward the provider's status and body, adding a permissive CORS header.
pub async fn forward(
  State(state): State<AppState>,
  Path((country, indicator)): Path<(String, String)>,
) -> Result<Response, Error> {
  let (status, body) = state
    .client
    .proxy(&country, &indicator)
    .await
    .map_err(|e| match e {
      FetchError::Malformed(msg) => Error::BadProxyPath(msg),
      other => {
        tracing::error!(%country, %indicator, error = %other, "proxy request failed");
        Error::Upstream(other.to_string())
      }
    })?;

  let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
  Ok(
    (
      status,
      [
        (header::CONTENT_TYPE, "application/json"),
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
      ],
      Body::from(body),
    )
      .into_response(),
  )
}
