//! The published view state.

use eumap_cache::Provenance;
use eumap_core::{
  format::{bucket, format_number},
  indicator::Indicator,
  observation::ObservedValue,
};
use serde::Serialize;

use crate::history::Handoff;

/// The displayed form of one (country, indicator) value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresentationRecord {
  pub country_code:  &'static str,
  pub indicator:     Indicator,
  pub year:          Option<i32>,
  pub value:         Option<f64>,
  pub display_value: String,
  /// Choropleth bucket, `0..BUCKETS`. `None` when there is no data.
  pub bucket:        Option<u8>,
}

impl PresentationRecord {
  pub fn new(observed: &ObservedValue) -> Self {
    Self {
      country_code:  observed.country_code,
      indicator:     observed.indicator,
      year:          observed.year,
      value:         observed.value,
      display_value: format_number(observed.value),
      bucket:        observed.value.map(|v| bucket(observed.indicator, v)),
    }
  }
}

/// One map layer per selected indicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
  pub indicator:           Indicator,
  pub color:               &'static str,
  pub countries_with_data: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopupRow {
  pub indicator:     Indicator,
  pub label:         &'static str,
  pub value:         Option<f64>,
  pub display_value: String,
}

/// Details of the focused country.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Popup {
  pub country_code: &'static str,
  pub name:         &'static str,
  pub rows:         Vec<PopupRow>,
  /// Values may be edited in place once custom data is loaded.
  pub editable:     bool,
  pub history:      Handoff,
}

/// Everything the map surface needs to draw itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewState {
  pub provenance: Provenance,
  /// Selected indicators, in display order.
  pub selection:  Vec<Indicator>,
  pub layers:     Vec<Layer>,
  /// Sorted by indicator, then by registry order of countries.
  pub records:    Vec<PresentationRecord>,
  pub popup:      Option<Popup>,
}

impl ViewState {
  pub fn records_for(
    &self,
    indicator: Indicator,
  ) -> impl Iterator<Item = &PresentationRecord> + '_ {
    self.records.iter().filter(move |r| r.indicator == indicator)
  }

  pub fn layer(&self, indicator: Indicator) -> Option<&Layer> {
    self.layers.iter().find(|l| l.indicator == indicator)
  }
}
