//! Handlers for user-supplied data.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/custom` | Body: `{"Germany": {"GDP": 3.8e12}, ...}`; 400 on a bad shape |
//! | `PUT`  | `/custom/{country}/{indicator}` | Body: `{"value": "4.1e12"}`; 409 before an upload |
//! | `PUT`  | `/custom/{country}/{indicator}/{year}` | Same body, edits one year of history |

use axum::{
  Json,
  body::Bytes,
  extract::{Path, State},
};
use eumap_core::{indicator::Indicator, observation::TimeSeries, source::IndicatorSource};
use eumap_view::{Command, ViewState};
use serde::Deserialize;
use serde_json::Value;

use crate::{Shared, error::ApiError, view::run};

/// `POST /custom`
///
/// The body is parsed here rather than by the `Json` extractor so a
/// malformed upload is reported like any other invalid document.
pub async fn load<S: IndicatorSource + 'static>(
  State(view): State<Shared<S>>,
  body: Bytes,
) -> Result<Json<ViewState>, ApiError> {
  let document: Value = serde_json::from_slice(&body)
    .map_err(|e| ApiError::BadRequest(format!("invalid data format: invalid JSON: {e}")))?;
  run(&view, Command::LoadCustomData(document)).await
}

/// A manual edit. The value is taken as typed by the user, so both `"12.5"`
/// and `12.5` are accepted and validated the same way.
#[derive(Debug, Deserialize)]
pub struct EditBody {
  pub value: Value,
}

impl EditBody {
  fn raw(self) -> String {
    match self.value {
      Value::String(s) => s,
      other => other.to_string(),
    }
  }
}

/// `PUT /custom/{country}/{indicator}`
pub async fn edit<S: IndicatorSource + 'static>(
  State(view): State<Shared<S>>,
  Path((country, indicator)): Path<(String, String)>,
  Json(body): Json<EditBody>,
) -> Result<Json<ViewState>, ApiError> {
  let indicator: Indicator = indicator.parse()?;
  run(&view, Command::EditValue { country, indicator, value: body.raw() }).await
}

/// `PUT /custom/{country}/{indicator}/{year}`
pub async fn edit_year<S: IndicatorSource + 'static>(
  State(view): State<Shared<S>>,
  Path((country, indicator, year)): Path<(String, String, i32)>,
  Json(body): Json<EditBody>,
) -> Result<Json<TimeSeries>, ApiError> {
  let indicator: Indicator = indicator.parse()?;
  let series = view
    .edit_history(&country, indicator, year, &body.raw())
    .await?;
  Ok(Json(series))
}
