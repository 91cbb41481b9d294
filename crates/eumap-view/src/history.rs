//! Historical charts and the hand-off that opens them.

use eumap_core::{
  Error as CoreError,
  country::{Country, EU_NAME, EU_SENTINEL},
  indicator::Indicator,
};
use serde::{Deserialize, Serialize};

/// Navigation parameters for the historical view: a country (or the `EU`
/// sentinel), the name to show, and which indicators to chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handoff {
  pub code:  String,
  pub name:  String,
  pub items: Vec<Indicator>,
}

impl Handoff {
  pub fn eu(items: impl IntoIterator<Item = Indicator>) -> Self {
    Self {
      code:  EU_SENTINEL.to_string(),
      name:  EU_NAME.to_string(),
      items: items.into_iter().collect(),
    }
  }

  pub fn country(country: &Country, items: impl IntoIterator<Item = Indicator>) -> Self {
    Self {
      code:  country.iso_alpha2_code.to_string(),
      name:  country.name.to_string(),
      items: items.into_iter().collect(),
    }
  }

  pub fn is_eu(&self) -> bool { self.code.eq_ignore_ascii_case(EU_SENTINEL) }

  /// Parse a comma-separated list of indicators (`gdp,cpi`). Blank entries
  /// are ignored.
  pub fn parse_items(raw: &str) -> Result<Vec<Indicator>, CoreError> {
    raw
      .split(',')
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::parse::<Indicator>)
      .collect()
  }

  /// The comma-separated form accepted by [`parse_items`](Self::parse_items).
  pub fn items_param(&self) -> String {
    self
      .items
      .iter()
      .map(|i| i.key())
      .collect::<Vec<_>>()
      .join(",")
  }
}

/// One line chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDataset {
  pub indicator: Indicator,
  pub label:     &'static str,
  pub years:     Vec<i32>,
  pub values:    Vec<f64>,
}

impl ChartDataset {
  pub fn is_empty(&self) -> bool { self.years.is_empty() }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryView {
  pub code:   String,
  pub name:   String,
  pub charts: Vec<ChartDataset>,
}

impl HistoryView {
  pub fn chart(&self, indicator: Indicator) -> Option<&ChartDataset> {
    self.charts.iter().find(|c| c.indicator == indicator)
  }
}
