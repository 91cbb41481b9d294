//! Async HTTP client for the World Bank indicator API.

use std::{
  collections::HashMap,
  sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
  },
  time::Duration,
};

use bytes::Bytes;
use eumap_core::{
  country::{self, Country},
  indicator::Indicator,
  observation::{LATEST_WINDOW, ObservedValue, TimeSeries, YearRange},
  source::{FetchError, IndicatorSource},
};
use reqwest::Client;
use serde::Deserialize;

use crate::{
  Result,
  parse::{RawObservation, into_latest, into_series, parse_observations},
};

/// Connection and query settings for the provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
  /// API root, without a trailing `/country`.
  pub base_url:        String,
  pub timeout_secs:    u64,
  /// Years searched by "most recent value" lookups.
  pub latest_window:   YearRange,
  pub latest_per_page: u32,
  pub series_per_page: u32,
  /// The single year the pass-through proxy asks for.
  pub proxy_year:      i32,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      base_url:        "https://api.worldbank.org/v2".to_string(),
      timeout_secs:    30,
      latest_window:   LATEST_WINDOW,
      latest_per_page: 1000,
      series_per_page: 5000,
      proxy_year:      2020,
    }
  }
}

/// Client for the World Bank indicator API.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based and clones
/// share the failure counter.
#[derive(Clone)]
pub struct WorldBankClient {
  client:   Client,
  config:   Arc<ClientConfig>,
  failures: Arc<AtomicU64>,
}

impl WorldBankClient {
  pub fn new(config: ClientConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self {
      client,
      config: Arc::new(config),
      failures: Arc::new(AtomicU64::new(0)),
    })
  }

  pub fn config(&self) -> &ClientConfig { &self.config }

  /// Number of fetches that failed (transport, status or parse) so far.
  pub fn failures(&self) -> u64 { self.failures.load(Ordering::Relaxed) }

  fn url(&self, countries: &str, indicator_code: &str) -> String {
    format!(
      "{}/country/{countries}/indicator/{indicator_code}",
      self.config.base_url.trim_end_matches('/'),
    )
  }

  /// `GET /country/{codes}/indicator/{code}?format=json&date=..&per_page=..`
  async fn observations(
    &self,
    countries: &[&'static Country],
    indicator: Indicator,
    date: YearRange,
    per_page: u32,
    most_recent: bool,
  ) -> Result<Vec<RawObservation>, FetchError> {
    let mut query = vec![
      ("format", "json".to_string()),
      ("date", date.to_string()),
      ("per_page", per_page.to_string()),
    ];
    if most_recent {
      query.push(("MRV", "1".to_string()));
    }

    let url = self.url(&country::batch_code(countries), indicator.code());
    tracing::debug!(%url, ?query, "fetching observations");

    let resp = self
      .client
      .get(&url)
      .query(&query)
      .send()
      .await
      .map_err(|e| FetchError::NetworkFailure(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
      return Err(FetchError::NetworkFailure(format!("GET {url} → {status}")));
    }

    let body = resp
      .bytes()
      .await
      .map_err(|e| FetchError::NetworkFailure(e.to_string()))?;
    parse_observations(&body)
  }

  fn record(&self, indicator: Indicator, error: &FetchError) {
    if error.is_definitive() {
      tracing::debug!(indicator = indicator.key(), "no observations");
    } else {
      self.failures.fetch_add(1, Ordering::Relaxed);
      tracing::warn!(indicator = indicator.key(), %error, "fetch failed");
    }
  }

  // ── Normalised lookups ────────────────────────────────────────────────────

  /// History of one country, ascending by year. Failures yield an empty
  /// series.
  pub async fn fetch_series(
    &self,
    country: &'static Country,
    indicator: Indicator,
    years: YearRange,
  ) -> TimeSeries {
    self
      .fetch_series_batch(&[country], indicator, years)
      .await
      .remove(country.iso_alpha2_code)
      .unwrap_or_else(|| TimeSeries::empty(country.iso_alpha2_code, indicator))
  }

  /// History of several countries in one request. Failures yield an empty
  /// map.
  pub async fn fetch_series_batch(
    &self,
    countries: &[&'static Country],
    indicator: Indicator,
    years: YearRange,
  ) -> HashMap<&'static str, TimeSeries> {
    self
      .series(countries, indicator, years)
      .await
      .unwrap_or_else(|e| {
        self.record(indicator, &e);
        HashMap::new()
      })
  }

  /// Most recent value for each country. Failures yield an empty map.
  pub async fn fetch_latest(
    &self,
    countries: &[&'static Country],
    indicator: Indicator,
  ) -> HashMap<&'static str, ObservedValue> {
    self.latest(countries, indicator).await.unwrap_or_else(|e| {
      self.record(indicator, &e);
      HashMap::new()
    })
  }

  // ── Pass-through ──────────────────────────────────────────────────────────

  /// Fetch the raw provider answer for the fixed proxy year, returning the
  /// upstream status and body untouched.
  pub async fn proxy(
    &self,
    country_code: &str,
    indicator_code: &str,
  ) -> Result<(u16, Bytes), FetchError> {
    let valid = |s: &str| {
      !s.is_empty()
        && s
          .chars()
          .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | ';' | '_' | '-'))
    };
    if !valid(country_code) || !valid(indicator_code) {
      return Err(FetchError::Malformed(format!(
        "invalid proxy path {country_code}/{indicator_code}"
      )));
    }

    let url = self.url(country_code, indicator_code);
    let resp = self
      .client
      .get(&url)
      .query(&[
        ("format", "json".to_string()),
        ("date", self.config.proxy_year.to_string()),
      ])
      .send()
      .await
      .map_err(|e| {
        self.failures.fetch_add(1, Ordering::Relaxed);
        FetchError::NetworkFailure(e.to_string())
      })?;

    let status = resp.status().as_u16();
    let body = resp
      .bytes()
      .await
      .map_err(|e| FetchError::NetworkFailure(e.to_string()))?;
    Ok((status, body))
  }
}

impl IndicatorSource for WorldBankClient {
  async fn latest<'a>(
    &'a self,
    countries: &'a [&'static Country],
    indicator: Indicator,
  ) -> Result<HashMap<&'static str, ObservedValue>, FetchError> {
    let records = self
      .observations(
        countries,
        indicator,
        self.config.latest_window,
        self.config.latest_per_page,
        true,
      )
      .await?;
    Ok(into_latest(countries, indicator, records))
  }

  async fn series<'a>(
    &'a self,
    countries: &'a [&'static Country],
    indicator: Indicator,
    years: YearRange,
  ) -> Result<HashMap<&'static str, TimeSeries>, FetchError> {
    let records = self
      .observations(countries, indicator, years, self.config.series_per_page, false)
      .await?;
    Ok(into_series(countries, indicator, records))
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use axum::{
    Router,
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
  };
  use eumap_core::observation::HISTORY_WINDOW;

  use super::*;

  const META: &str = r#"{"page":1,"pages":1,"per_page":5000,"total":3}"#;

  async fn mock_provider(
    Path((codes, indicator)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
  ) -> impl IntoResponse {
    if params.get("format").map(String::as_str) != Some("json") {
      return (StatusCode::BAD_REQUEST, "format missing".to_string());
    }
    let records = match (codes.as_str(), indicator.as_str(), params.get("MRV")) {
      ("AT", "NY.GDP.MKTP.CD", None) => {
        r#"[
          {"countryiso2code":"AT","date":"2019","value":4.4e11},
          {"countryiso2code":"AT","date":"2018","value":4.5e11},
          {"countryiso2code":"AT","date":"2017","value":4.2e11}
        ]"#
      }
      ("AT;BE;DE", "SI.POV.GINI", Some(mrv)) if mrv == "1" => {
        assert_eq!(params.get("date").map(String::as_str), Some("2015:2021"));
        r#"[
          {"countryiso2code":"AT","date":"2020","value":30.0},
          {"countryiso2code":"BE","date":"2020","value":null},
          {"countryiso2code":"DE","date":"2019","value":32.0}
        ]"#
      }
      ("XX", _, _) => return (StatusCode::NOT_FOUND, "no such country".to_string()),
      _ => "null",
    };
    (StatusCode::OK, format!("[{META},{records}]"))
  }

  async fn serve() -> String {
    let app = Router::new().route("/country/{codes}/indicator/{indicator}", get(mock_provider));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
  }

  fn client(base_url: String) -> WorldBankClient {
    WorldBankClient::new(ClientConfig { base_url, timeout_secs: 5, ..Default::default() })
      .unwrap()
  }

  #[tokio::test]
  async fn series_is_returned_ascending() {
    let wb = client(serve().await);
    let at = country::by_code("AT").unwrap();
    let series = wb.fetch_series(at, Indicator::Gdp, HISTORY_WINDOW).await;
    let years: Vec<_> = series.points().iter().map(|p| p.year).collect();
    assert_eq!(years, vec![2017, 2018, 2019]);
    assert_eq!(wb.failures(), 0);
  }

  #[tokio::test]
  async fn batch_latest_uses_most_recent_flag() {
    let wb = client(serve().await);
    let picked: Vec<_> = ["AT", "BE", "DE"]
      .into_iter()
      .map(|c| country::by_code(c).unwrap())
      .collect();
    let latest = wb.fetch_latest(&picked, Indicator::Gini).await;
    assert_eq!(latest.len(), 3);
    assert_eq!(latest["AT"].value, Some(30.0));
    assert_eq!(latest["BE"].value, None);
    assert_eq!(latest["DE"].year, Some(2019));
  }

  #[tokio::test]
  async fn empty_provider_answer_is_not_a_failure() {
    let wb = client(serve().await);
    let mt = country::by_code("MT").unwrap();
    let series = wb.fetch_series(mt, Indicator::Cpi, HISTORY_WINDOW).await;
    assert!(series.is_empty());
    assert_eq!(wb.failures(), 0);

    let err = wb.series(&[mt], Indicator::Cpi, HISTORY_WINDOW).await.unwrap_err();
    assert_eq!(err, FetchError::ProviderEmptyResult);
  }

  #[tokio::test]
  async fn unreachable_provider_yields_no_data() {
    let wb = client("http://127.0.0.1:1".to_string());
    let at = country::by_code("AT").unwrap();
    let series = wb.fetch_series(at, Indicator::Gdp, HISTORY_WINDOW).await;
    assert!(series.is_empty());
    assert!(wb.fetch_latest(&[at], Indicator::Gdp).await.is_empty());
    assert_eq!(wb.failures(), 2);
  }

  #[tokio::test]
  async fn proxy_forwards_status_and_body() {
    let wb = client(serve().await);
    let (status, body) = wb.proxy("XX", "NY.GDP.MKTP.CD").await.unwrap();
    assert_eq!(status, 404);
    assert_eq!(&body[..], b"no such country");

    let (status, _) = wb.proxy("AT", "NY.GDP.MKTP.CD").await.unwrap();
    assert_eq!(status, 200);
  }

  #[tokio::test]
  async fn proxy_rejects_injected_segments() {
    let wb = client(serve().await);
    let err = wb.proxy("AT?x=1", "NY.GDP.MKTP.CD").await.unwrap_err();
    assert!(matches!(err, FetchError::Malformed(_)));
  }
}
