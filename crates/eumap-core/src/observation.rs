//! Observations, time series and aggregate series.
//!
//! A `None` value always means "no data reported". It is never the same as
//! zero: aggregation skips it and presentation renders the no-data sentinel.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, indicator::Indicator};

// ─── Year window ─────────────────────────────────────────────────────────────

/// An inclusive range of years with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawYearRange")]
pub struct YearRange {
  start: i32,
  end:   i32,
}

#[derive(Deserialize)]
struct RawYearRange {
  start: i32,
  end:   i32,
}

impl TryFrom<RawYearRange> for YearRange {
  type Error = Error;

  fn try_from(raw: RawYearRange) -> Result<Self> { Self::new(raw.start, raw.end) }
}

/// Window of the historical charts.
pub const HISTORY_WINDOW: YearRange = YearRange { start: 2000, end: 2020 };

/// Window searched for "most recent value" lookups.
pub const LATEST_WINDOW: YearRange = YearRange { start: 2015, end: 2021 };

impl YearRange {
  pub fn new(start: i32, end: i32) -> Result<Self> {
    if start > end {
      return Err(Error::InvalidYearRange { start, end });
    }
    Ok(Self { start, end })
  }

  /// A window covering a single year.
  pub fn single(year: i32) -> Self { Self { start: year, end: year } }

  pub fn start(self) -> i32 { self.start }

  pub fn end(self) -> i32 { self.end }

  pub fn contains(self, year: i32) -> bool {
    (self.start..=self.end).contains(&year)
  }

  /// Whether every year of `other` lies inside `self`.
  pub fn covers(self, other: YearRange) -> bool {
    self.start <= other.start && other.end <= self.end
  }
}

/// Formats as the provider's `date` parameter, e.g. `2000:2020`.
impl fmt::Display for YearRange {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.start, self.end)
  }
}

// ─── Single observations ─────────────────────────────────────────────────────

/// One reported (or missing) value for a country and indicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservedValue {
  pub country_code: &'static str,
  pub indicator:    Indicator,
  /// Year of the observation; unknown for hand-entered values.
  pub year:         Option<i32>,
  pub value:        Option<f64>,
}

impl ObservedValue {
  /// An observation that carries no data.
  pub fn missing(country_code: &'static str, indicator: Indicator) -> Self {
    Self { country_code, indicator, year: None, value: None }
  }

  pub fn has_data(&self) -> bool { self.value.is_some() }
}

/// A point of a [`TimeSeries`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearValue {
  pub year:  i32,
  pub value: Option<f64>,
}

// ─── Time series ─────────────────────────────────────────────────────────────

/// The history of one indicator for one country.
///
/// Points are ascending by year with no duplicate years; the constructors
/// enforce this regardless of the order the provider used.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
  pub country_code: &'static str,
  pub indicator:    Indicator,
  points:           Vec<YearValue>,
}

impl TimeSeries {
  pub fn empty(country_code: &'static str, indicator: Indicator) -> Self {
    Self { country_code, indicator, points: Vec::new() }
  }

  /// Build from points in any order. When a year occurs more than once the
  /// first occurrence wins.
  pub fn from_points(
    country_code: &'static str,
    indicator: Indicator,
    points: impl IntoIterator<Item = YearValue>,
  ) -> Self {
    let mut points: Vec<YearValue> = points.into_iter().collect();
    points.sort_by_key(|p| p.year);
    points.dedup_by_key(|p| p.year);
    Self { country_code, indicator, points }
  }

  pub fn points(&self) -> &[YearValue] { &self.points }

  pub fn is_empty(&self) -> bool { self.points.is_empty() }

  pub fn len(&self) -> usize { self.points.len() }

  /// Value reported for `year`, flattening "absent" and "null" together.
  pub fn value_at(&self, year: i32) -> Option<f64> {
    self
      .points
      .binary_search_by_key(&year, |p| p.year)
      .ok()
      .and_then(|i| self.points[i].value)
  }

  /// Only the points with data, as parallel year/value vectors.
  pub fn reported(&self) -> (Vec<i32>, Vec<f64>) {
    self
      .points
      .iter()
      .filter_map(|p| p.value.map(|v| (p.year, v)))
      .unzip()
  }

  /// The latest point that has data.
  pub fn latest(&self) -> ObservedValue {
    self
      .points
      .iter()
      .rev()
      .find(|p| p.value.is_some())
      .map(|p| ObservedValue {
        country_code: self.country_code,
        indicator:    self.indicator,
        year:         Some(p.year),
        value:        p.value,
      })
      .unwrap_or_else(|| ObservedValue::missing(self.country_code, self.indicator))
  }

  /// Restrict to the years inside `window`.
  pub fn clipped(&self, window: YearRange) -> Self {
    Self {
      country_code: self.country_code,
      indicator:    self.indicator,
      points:       self
        .points
        .iter()
        .copied()
        .filter(|p| window.contains(p.year))
        .collect(),
    }
  }

  /// Insert or overwrite the value for `year`, keeping the ordering.
  pub fn set(&mut self, year: i32, value: Option<f64>) {
    match self.points.binary_search_by_key(&year, |p| p.year) {
      Ok(i) => self.points[i].value = value,
      Err(i) => self.points.insert(i, YearValue { year, value }),
    }
  }

  /// Smallest window covering every point, if there are any.
  pub fn span(&self) -> Option<YearRange> {
    let first = self.points.first()?;
    let last = self.points.last()?;
    Some(YearRange { start: first.year, end: last.year })
  }
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

/// One year of an [`AggregateSeries`]. Only years with at least one reporting
/// country exist, so the value is never missing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregatePoint {
  pub year:         i32,
  pub value:        f64,
  /// Number of countries that reported a value for this year.
  pub contributors: usize,
}

/// The union-wide history of one indicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateSeries {
  pub indicator: Indicator,
  pub points:    Vec<AggregatePoint>,
}

impl AggregateSeries {
  pub fn value_at(&self, year: i32) -> Option<f64> {
    self
      .points
      .iter()
      .find(|p| p.year == year)
      .map(|p| p.value)
  }

  pub fn years(&self) -> Vec<i32> { self.points.iter().map(|p| p.year).collect() }

  pub fn values(&self) -> Vec<f64> { self.points.iter().map(|p| p.value).collect() }
}
