//! Handlers for the static registry.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/countries` | Every member state with its aliases |
//! | `GET`  | `/indicators` | Codes, colours, labels and bucket thresholds |

use axum::Json;
use eumap_core::{
  country::{self, Country},
  indicator::{AggregationKind, Indicator},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct IndicatorInfo {
  pub key:             &'static str,
  pub name:            &'static str,
  pub code:            &'static str,
  pub kind:            AggregationKind,
  pub color:           &'static str,
  pub chart_label:     &'static str,
  pub aggregate_label: &'static str,
  pub thresholds:      [f64; 6],
}

impl From<Indicator> for IndicatorInfo {
  fn from(i: Indicator) -> Self {
    Self {
      key:             i.key(),
      name:            i.display_name(),
      code:            i.code(),
      kind:            i.kind(),
      color:           i.color(),
      chart_label:     i.chart_label(),
      aggregate_label: i.aggregate_label(),
      thresholds:      i.thresholds(),
    }
  }
}

/// `GET /countries`
pub async fn countries() -> Json<Vec<&'static Country>> { Json(country::all()) }

/// `GET /indicators`
pub async fn indicators() -> Json<Vec<IndicatorInfo>> {
  Json(Indicator::ALL.into_iter().map(IndicatorInfo::from).collect())
}
