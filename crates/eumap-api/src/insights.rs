//! Handlers for the derived, read-only views.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/eu` | 400 when nothing is selected |
//! | `GET`  | `/history` | `?code=AT\|EU&name=..&items=gdp,cpi` |
//! | `GET`  | `/compare` | `?a=AT&b=DE&indicator=gdp` |
//! | `GET`  | `/operation` | `?country=AT&left=gdp&op=divide&right=population` |

use axum::{
  Json,
  extract::{Query, State},
};
use eumap_core::{indicator::Indicator, operation::Operation, source::IndicatorSource};
use eumap_view::{Comparison, EuSummary, Handoff, HistoryView, OperationOutcome};
use serde::Deserialize;

use crate::{Shared, error::ApiError};

/// `GET /eu`
pub async fn eu<S: IndicatorSource + 'static>(
  State(view): State<Shared<S>>,
) -> Result<Json<EuSummary>, ApiError> {
  Ok(Json(view.eu_summary().await?))
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
  pub code:  String,
  #[serde(default)]
  pub name:  String,
  /// Comma-separated indicator keys.
  #[serde(default)]
  pub items: String,
}

/// `GET /history?code=..&name=..&items=..`
pub async fn history<S: IndicatorSource + 'static>(
  State(view): State<Shared<S>>,
  Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryView>, ApiError> {
  let handoff = Handoff {
    code:  params.code,
    name:  params.name,
    items: Handoff::parse_items(&params.items)?,
  };
  Ok(Json(view.history(&handoff).await?))
}

#[derive(Debug, Deserialize)]
pub struct CompareParams {
  pub a:         String,
  pub b:         String,
  pub indicator: String,
}

/// `GET /compare?a=..&b=..&indicator=..`
pub async fn compare<S: IndicatorSource + 'static>(
  State(view): State<Shared<S>>,
  Query(params): Query<CompareParams>,
) -> Result<Json<Comparison>, ApiError> {
  let indicator: Indicator = params.indicator.parse()?;
  Ok(Json(view.compare(&params.a, &params.b, indicator).await?))
}

#[derive(Debug, Deserialize)]
pub struct OperationParams {
  pub country: String,
  pub left:    String,
  pub op:      String,
  pub right:   String,
}

/// `GET /operation?country=..&left=..&op=..&right=..`
pub async fn operation<S: IndicatorSource + 'static>(
  State(view): State<Shared<S>>,
  Query(params): Query<OperationParams>,
) -> Result<Json<OperationOutcome>, ApiError> {
  let left: Indicator = params.left.parse()?;
  let right: Indicator = params.right.parse()?;
  let op: Operation = params.op.parse()?;
  Ok(Json(view.operate(&params.country, left, op, right).await?))
}
