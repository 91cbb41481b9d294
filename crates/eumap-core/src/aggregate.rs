//! Combining per-country values into union-wide values.
//!
//! Extensive indicators sum over reporting countries, intensive ones take the
//! mean over reporting countries. Missing values contribute nothing to either
//! the total or the count.

use std::collections::BTreeMap;

use crate::{
  indicator::{AggregationKind, Indicator},
  observation::{AggregatePoint, AggregateSeries, ObservedValue, TimeSeries},
};

/// Running total and number of contributing countries.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Accumulator {
  pub total: f64,
  pub count: usize,
}

impl Accumulator {
  /// Fold in one value; `None` is ignored.
  pub fn push(&mut self, value: Option<f64>) {
    if let Some(v) = value {
      self.total += v;
      self.count += 1;
    }
  }

  /// The combined value, or `None` if nothing contributed.
  pub fn combine(&self, kind: AggregationKind) -> Option<f64> {
    if self.count == 0 {
      return None;
    }
    Some(match kind {
      AggregationKind::Extensive => self.total,
      AggregationKind::Intensive => self.total / self.count as f64,
    })
  }
}

/// Combine per-country series into one series for the union.
///
/// A year appears in the output only if at least one country reported a value
/// for it. Output is ascending by year whatever order the input arrives in.
pub fn aggregate<'a>(
  indicator: Indicator,
  per_country: impl IntoIterator<Item = &'a TimeSeries>,
) -> AggregateSeries {
  let mut years: BTreeMap<i32, Accumulator> = BTreeMap::new();
  for series in per_country {
    for point in series.points() {
      years.entry(point.year).or_default().push(point.value);
    }
  }

  let kind = indicator.kind();
  let points = years
    .into_iter()
    .filter_map(|(year, acc)| {
      acc.combine(kind).map(|value| AggregatePoint {
        year,
        value,
        contributors: acc.count,
      })
    })
    .collect();

  AggregateSeries { indicator, points }
}

/// The same rule as [`aggregate`], applied to one value per country.
pub fn aggregate_latest<'a>(
  indicator: Indicator,
  values: impl IntoIterator<Item = &'a ObservedValue>,
) -> Option<f64> {
  accumulate(values).combine(indicator.kind())
}

/// Fold observations into an [`Accumulator`], for callers that also need the
/// contributor count.
pub fn accumulate<'a>(
  values: impl IntoIterator<Item = &'a ObservedValue>,
) -> Accumulator {
  let mut acc = Accumulator::default();
  for v in values {
    acc.push(v.value);
  }
  acc
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use super::*;
  use crate::observation::YearValue;

  fn series(code: &'static str, indicator: Indicator, points: &[(i32, Option<f64>)]) -> TimeSeries {
    TimeSeries::from_points(
      code,
      indicator,
      points.iter().map(|&(year, value)| YearValue { year, value }),
    )
  }

  fn observed(code: &'static str, indicator: Indicator, value: Option<f64>) -> ObservedValue {
    ObservedValue { country_code: code, indicator, year: Some(2010), value }
  }

  #[test]
  fn extensive_sums_reporting_countries() {
    let input = [
      series("AT", Indicator::Gdp, &[(2010, Some(400e9))]),
      series("BE", Indicator::Gdp, &[(2010, None)]),
      series("DE", Indicator::Gdp, &[(2010, Some(4000e9))]),
    ];
    let out = aggregate(Indicator::Gdp, &input);
    assert_eq!(out.value_at(2010), Some(4400e9));
    assert_eq!(out.points[0].contributors, 2);
  }

  #[test]
  fn intensive_averages_over_reporting_countries_only() {
    let input = [
      series("AT", Indicator::Gini, &[(2010, Some(30.0))]),
      series("BE", Indicator::Gini, &[(2010, None)]),
      series("DE", Indicator::Gini, &[(2010, Some(32.0))]),
    ];
    let out = aggregate(Indicator::Gini, &input);
    assert_eq!(out.value_at(2010), Some(31.0));
  }

  #[test]
  fn all_null_year_is_omitted() {
    let input = [
      series("AT", Indicator::Cpi, &[(2009, None), (2010, Some(1.0))]),
      series("BE", Indicator::Cpi, &[(2009, None), (2010, Some(3.0))]),
    ];
    let out = aggregate(Indicator::Cpi, &input);
    assert_eq!(out.years(), vec![2010]);
    assert_eq!(out.values(), vec![2.0]);
  }

  #[test]
  fn result_ignores_input_order() {
    let a = series("AT", Indicator::Population, &[(2001, Some(8e6)), (2000, Some(7.9e6))]);
    let b = series("BE", Indicator::Population, &[(2000, Some(10e6)), (2002, Some(10.3e6))]);
    let c = series("BG", Indicator::Population, &[(2002, Some(7.8e6))]);

    let forward = aggregate(Indicator::Population, [&a, &b, &c]);
    let backward = aggregate(Indicator::Population, [&c, &b, &a]);
    assert_eq!(forward, backward);

    let mut map = HashMap::new();
    map.insert("BG", c.clone());
    map.insert("AT", a.clone());
    map.insert("BE", b.clone());
    assert_eq!(aggregate(Indicator::Population, map.values()), forward);
    assert_eq!(forward.years(), vec![2000, 2001, 2002]);
  }

  #[test]
  fn latest_uses_same_rule() {
    let gdp = [
      observed("AT", Indicator::Gdp, Some(400e9)),
      observed("BE", Indicator::Gdp, None),
      observed("DE", Indicator::Gdp, Some(4000e9)),
    ];
    assert_eq!(aggregate_latest(Indicator::Gdp, &gdp), Some(4400e9));

    let gini = [
      observed("AT", Indicator::Gini, Some(30.0)),
      observed("BE", Indicator::Gini, None),
      observed("DE", Indicator::Gini, Some(32.0)),
    ];
    assert_eq!(aggregate_latest(Indicator::Gini, &gini), Some(31.0));
  }

  #[test]
  fn latest_with_no_data_is_none() {
    let empty = [observed("AT", Indicator::Cpi, None)];
    assert_eq!(aggregate_latest(Indicator::Cpi, &empty), None);
    assert_eq!(aggregate_latest(Indicator::Gdp, &[] as &[ObservedValue]), None);
  }
}
