//! Handler for `GET /export/{file}`.
//!
//! `file` is `map.png` or `{indicator}-chart.png`; charts take an optional
//! `?code=` (a country or `EU`, the default).

use axum::{
  extract::{Path, Query, State},
  http::header,
  response::IntoResponse,
};
use eumap_core::{export::Artifact, source::IndicatorSource};
use serde::Deserialize;

use crate::{Shared, error::ApiError};

#[derive(Debug, Deserialize, Default)]
pub struct ExportParams {
  pub code: Option<String>,
}

/// `GET /export/{file}[?code=..]`
pub async fn download<S: IndicatorSource + 'static>(
  State(view): State<Shared<S>>,
  Path(file): Path<String>,
  Query(params): Query<ExportParams>,
) -> Result<impl IntoResponse, ApiError> {
  let artifact: Artifact = file.parse()?;
  let png = view.export(artifact, params.code.as_deref()).await?;
  Ok((
    [
      (header::CONTENT_TYPE, "image/png".to_string()),
      (
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{artifact}\""),
      ),
    ],
    png,
  ))
}
