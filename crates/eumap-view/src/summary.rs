//! Read-only questions answered from the cache: the EU summary, historical
//! charts, two-country comparison, country operations and exports.

use eumap_core::{
  aggregate::{accumulate, aggregate},
  country::{self, Country},
  export::Artifact,
  format::format_number,
  indicator::Indicator,
  observation::{HISTORY_WINDOW, ObservedValue},
  operation::Operation,
  source::IndicatorSource,
};
use futures::future::join_all;
use serde::Serialize;

use crate::{
  Error, Result, ViewSynchronizer,
  history::{ChartDataset, Handoff, HistoryView},
  render,
};

// ─── EU summary ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EuIndicator {
  pub indicator:     Indicator,
  /// `Total …` for extensive indicators, `Average …` for intensive ones.
  pub label:         &'static str,
  pub value:         Option<f64>,
  pub display_value: String,
  /// Member states that reported a value.
  pub contributors:  usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EuSummary {
  pub indicators: Vec<EuIndicator>,
  pub history:    Handoff,
}

// ─── Comparison ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparedValue {
  pub country_code:  &'static str,
  pub name:          &'static str,
  pub year:          Option<i32>,
  pub value:         Option<f64>,
  pub display_value: String,
}

impl ComparedValue {
  fn new(country: &'static Country, observed: &ObservedValue) -> Self {
    Self {
      country_code:  country.iso_alpha2_code,
      name:          country.name,
      year:          observed.year,
      value:         observed.value,
      display_value: format_number(observed.value),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
  pub indicator: Indicator,
  pub left:      ComparedValue,
  pub right:     ComparedValue,
}

// ─── Country operation ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationOutcome {
  pub country_code:  &'static str,
  pub name:          &'static str,
  pub left:          Indicator,
  pub operation:     Operation,
  pub right:         Indicator,
  /// `None` when dividing by zero.
  pub value:         Option<f64>,
  pub display_value: String,
}

impl OperationOutcome {
  /// `GDP ÷ Population`
  pub fn expression(&self) -> String {
    format!("{} {} {}", self.left, self.operation.symbol(), self.right)
  }
}

impl<S: IndicatorSource + 'static> ViewSynchronizer<S> {
  /// Union-wide latest value of every selected indicator.
  pub async fn eu_summary(&self) -> Result<EuSummary> {
    let selection = self.selected().await?;
    let countries = country::all();
    let countries = &countries;

    let indicators = join_all(selection.iter().map(|&indicator| async move {
      let values = self.cache().latest_many(countries, indicator).await;
      let acc = accumulate(&values);
      let value = acc.combine(indicator.kind());
      EuIndicator {
        indicator,
        label: indicator.aggregate_label(),
        value,
        display_value: format_number(value),
        contributors: acc.count,
      }
    }))
    .await;

    Ok(EuSummary { indicators, history: Handoff::eu(selection) })
  }

  /// Resolve a hand-off into chart datasets over the history window.
  ///
  /// For the union every listed indicator is aggregated across member
  /// states. For a single country, years without data are dropped and an
  /// empty item list means every indicator.
  pub async fn history(&self, handoff: &Handoff) -> Result<HistoryView> {
    if handoff.is_eu() {
      if handoff.items.is_empty() {
        return Err(Error::EmptySelection);
      }
      let countries = country::all();
      let countries = &countries;
      let charts = join_all(handoff.items.iter().map(|&indicator| async move {
        let series = self
          .cache()
          .series_many(countries, indicator, HISTORY_WINDOW)
          .await;
        let union = aggregate(indicator, &series);
        ChartDataset {
          indicator,
          label: indicator.aggregate_label(),
          years: union.years(),
          values: union.values(),
        }
      }))
      .await;
      return Ok(HistoryView {
        code: handoff.code.to_ascii_uppercase(),
        name: handoff.name.clone(),
        charts,
      });
    }

    let country = country::resolve(&handoff.code)?;
    let items = if handoff.items.is_empty() {
      Indicator::ALL.to_vec()
    } else {
      handoff.items.clone()
    };
    let charts = join_all(items.into_iter().map(|indicator| async move {
      let series = self.cache().series(country, indicator, HISTORY_WINDOW).await;
      let (years, values) = series.reported();
      ChartDataset { indicator, label: indicator.chart_label(), years, values }
    }))
    .await;

    let name = if handoff.name.trim().is_empty() {
      country.name.to_string()
    } else {
      handoff.name.clone()
    };
    Ok(HistoryView { code: country.iso_alpha2_code.to_string(), name, charts })
  }

  /// Latest value of one indicator for two countries.
  pub async fn compare(
    &self,
    left: &str,
    right: &str,
    indicator: Indicator,
  ) -> Result<Comparison> {
    let left = country::resolve(left)?;
    let right = country::resolve(right)?;
    let values = self.cache().latest_many(&[left, right], indicator).await;
    let missing = ObservedValue::missing(left.iso_alpha2_code, indicator);
    let l = values.first().unwrap_or(&missing);
    let r = values.get(1).unwrap_or(&missing);
    Ok(Comparison {
      indicator,
      left: ComparedValue::new(left, l),
      right: ComparedValue::new(right, r),
    })
  }

  /// Combine two indicators of one country. Both operands must have data.
  pub async fn operate(
    &self,
    country: &str,
    left: Indicator,
    operation: Operation,
    right: Indicator,
  ) -> Result<OperationOutcome> {
    let target = country::resolve(country)?;
    let (l, r) = tokio::join!(
      self.cache().latest(target, left),
      self.cache().latest(target, right),
    );
    let operand = |observed: &ObservedValue| {
      observed.value.ok_or_else(|| Error::DataUnavailable {
        country:   target.name.to_string(),
        indicator: observed.indicator,
      })
    };
    let value = operation.apply(operand(&l)?, operand(&r)?);

    Ok(OperationOutcome {
      country_code: target.iso_alpha2_code,
      name: target.name,
      left,
      operation,
      right,
      value,
      display_value: format_number(value),
    })
  }

  /// Render an export artifact as PNG. Charts are drawn for `code` (a
  /// country or `EU`, the default).
  pub async fn export(&self, artifact: Artifact, code: Option<&str>) -> Result<Vec<u8>> {
    match artifact {
      Artifact::Map => Ok(render::map_png(&self.current())?),
      Artifact::Chart(indicator) => {
        let handoff = match code.filter(|c| !c.trim().is_empty()) {
          Some(code) if !code.trim().eq_ignore_ascii_case(country::EU_SENTINEL) => {
            Handoff::country(country::resolve(code)?, [indicator])
          }
          _ => Handoff::eu([indicator]),
        };
        let view = self.history(&handoff).await?;
        let dataset = view.chart(indicator).cloned().unwrap_or(ChartDataset {
          indicator,
          label: indicator.chart_label(),
          years: Vec::new(),
          values: Vec::new(),
        });
        tracing::debug!(
          file = %artifact,
          points = dataset.years.len(),
          "rendering chart"
        );
        Ok(render::chart_png(&dataset)?)
      }
    }
  }
}
