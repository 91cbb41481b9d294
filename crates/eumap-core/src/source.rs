//! The `IndicatorSource` trait: where observations come from.
//!
//! Implemented by the World Bank client (`eumap-worldbank`) and by
//! [`MemorySource`]. Higher layers (`eumap-cache`, `eumap-view`) depend on this
//! abstraction, not on any concrete provider.

use std::{
  collections::HashMap,
  future::Future,
  sync::atomic::{AtomicUsize, Ordering},
};

use thiserror::Error;

use crate::{
  country::Country,
  indicator::Indicator,
  observation::{ObservedValue, TimeSeries, YearRange},
};

/// Why a fetch produced nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
  /// The request never produced a usable response (connect, timeout, status).
  #[error("network failure: {0}")]
  NetworkFailure(String),

  /// The provider answered correctly but had no observations for the query.
  #[error("provider returned no observations")]
  ProviderEmptyResult,

  /// The response body did not have the expected shape.
  #[error("malformed provider response: {0}")]
  Malformed(String),
}

impl FetchError {
  /// Whether the outcome is a real "no data" answer, as opposed to a failure
  /// that may succeed on retry.
  pub fn is_definitive(&self) -> bool { matches!(self, Self::ProviderEmptyResult) }
}

/// A provider of indicator observations.
///
/// Implementations do not touch any cache: populating one is the caller's job.
/// Returned maps are keyed by country code and never contain countries that
/// were not requested; requested countries that are absent have no data.
///
/// All methods return `Send` futures so fetches can be spawned onto a
/// multi-threaded runtime.
pub trait IndicatorSource: Send + Sync {
  /// Most recent reported value of `indicator` for each of `countries`.
  fn latest<'a>(
    &'a self,
    countries: &'a [&'static Country],
    indicator: Indicator,
  ) -> impl Future<Output = Result<HashMap<&'static str, ObservedValue>, FetchError>>
  + Send
  + 'a;

  /// History of `indicator` over `years` for each of `countries`, ascending.
  fn series<'a>(
    &'a self,
    countries: &'a [&'static Country],
    indicator: Indicator,
    years: YearRange,
  ) -> impl Future<Output = Result<HashMap<&'static str, TimeSeries>, FetchError>>
  + Send
  + 'a;
}

// ─── In-memory source ────────────────────────────────────────────────────────

/// A source backed by fixed in-memory data, for tests and offline
/// use. Counts every call so tests can assert how often the network would
/// have been hit.
#[derive(Debug, Default)]
pub struct MemorySource {
  latest:  HashMap<(&'static str, Indicator), ObservedValue>,
  series:  HashMap<(&'static str, Indicator), TimeSeries>,
  failure: Option<FetchError>,
  calls:   AtomicUsize,
}

impl MemorySource {
  pub fn new() -> Self { Self::default() }

  pub fn with_latest(
    mut self,
    country_code: &'static str,
    indicator: Indicator,
    year: i32,
    value: Option<f64>,
  ) -> Self {
    self.latest.insert(
      (country_code, indicator),
      ObservedValue { country_code, indicator, year: Some(year), value },
    );
    self
  }

  pub fn with_series(mut self, series: TimeSeries) -> Self {
    self
      .series
      .insert((series.country_code, series.indicator), series);
    self
  }

  /// Make every call fail with `error`.
  pub fn failing(mut self, error: FetchError) -> Self {
    self.failure = Some(error);
    self
  }

  /// Number of fetch calls made so far (batch calls count once).
  pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

  fn begin(&self) -> Result<(), FetchError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    match &self.failure {
      Some(e) => Err(e.clone()),
      None => Ok(()),
    }
  }
}

impl IndicatorSource for MemorySource {
  async fn latest<'a>(
    &'a self,
    countries: &'a [&'static Country],
    indicator: Indicator,
  ) -> Result<HashMap<&'static str, ObservedValue>, FetchError> {
    self.begin()?;
    let found: HashMap<_, _> = countries
      .iter()
      .filter_map(|c| {
        self
          .latest
          .get(&(c.iso_alpha2_code, indicator))
          .map(|v| (c.iso_alpha2_code, v.clone()))
      })
      .collect();
    if found.is_empty() {
      return Err(FetchError::ProviderEmptyResult);
    }
    Ok(found)
  }

  async fn series<'a>(
    &'a self,
    countries: &'a [&'static Country],
    indicator: Indicator,
    years: YearRange,
  ) -> Result<HashMap<&'static str, TimeSeries>, FetchError> {
    self.begin()?;
    let found: HashMap<_, _> = countries
      .iter()
      .filter_map(|c| {
        self
          .series
          .get(&(c.iso_alpha2_code, indicator))
          .map(|s| (c.iso_alpha2_code, s.clipped(years)))
      })
      .collect();
    if found.is_empty() {
      return Err(FetchError::ProviderEmptyResult);
    }
    Ok(found)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{country, observation::YearValue};

  #[tokio::test]
  async fn memory_source_counts_calls_and_filters_countries() {
    let source = MemorySource::new()
      .with_latest("AT", Indicator::Gdp, 2020, Some(4.3e11))
      .with_latest("DE", Indicator::Gdp, 2020, Some(3.9e12));
    let picked = [country::by_code("AT").unwrap(), country::by_code("BE").unwrap()];

    let got = source.latest(&picked, Indicator::Gdp).await.unwrap();
    assert_eq!(got.len(), 1);
    assert_eq!(got["AT"].value, Some(4.3e11));
    assert_eq!(source.calls(), 1);
  }

  #[tokio::test]
  async fn memory_source_clips_series_to_window() {
    let series = TimeSeries::from_points(
      "AT",
      Indicator::Cpi,
      (1995..=2022).map(|year| YearValue { year, value: Some(1.0) }),
    );
    let source = MemorySource::new().with_series(series);
    let at = [country::by_code("AT").unwrap()];
    let window = YearRange::new(2000, 2002).unwrap();

    let got = source.series(&at, Indicator::Cpi, window).await.unwrap();
    assert_eq!(got["AT"].len(), 3);
  }

  #[tokio::test]
  async fn failing_source_reports_error() {
    let source = MemorySource::new()
      .failing(FetchError::NetworkFailure("connection refused".into()));
    let at = [country::by_code("AT").unwrap()];
    let err = source.latest(&at, Indicator::Gdp).await.unwrap_err();
    assert!(!err.is_definitive());
    assert_eq!(source.calls(), 1);
  }
}
