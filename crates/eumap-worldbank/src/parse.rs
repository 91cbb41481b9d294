//! Provider response parsing.
//!
//! A successful response is a two-element array: pagination metadata, then
//! the observation records (or `null` when the query matched nothing). Error
//! envelopes are a single-element array carrying a `message`.

use std::collections::HashMap;

use eumap_core::{
  country::Country,
  indicator::Indicator,
  observation::{ObservedValue, TimeSeries, YearValue},
  source::FetchError,
};
use serde::Deserialize;
use serde_json::Value;

/// One observation record as the provider sends it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawObservation {
  #[serde(default)]
  pub countryiso2code: Option<String>,
  #[serde(default)]
  pub country:         Option<RawRef>,
  /// Year, as a string.
  pub date:            String,
  #[serde(default)]
  pub value:           Option<f64>,
}

/// An `{id, value}` reference object.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRef {
  pub id:    String,
  #[serde(default)]
  pub value: Option<String>,
}

impl RawObservation {
  /// Two-letter country code, from `countryiso2code` or else `country.id`.
  pub fn country_code(&self) -> Option<&str> {
    self
      .countryiso2code
      .as_deref()
      .filter(|c| !c.is_empty())
      .or_else(|| self.country.as_ref().map(|c| c.id.as_str()))
  }

  pub fn year(&self) -> Option<i32> { self.date.trim().parse().ok() }
}

/// Validate the response envelope and extract the observation records.
pub(crate) fn parse_observations(body: &[u8]) -> Result<Vec<RawObservation>, FetchError> {
  let root: Value = serde_json::from_slice(body)
    .map_err(|e| FetchError::Malformed(format!("invalid JSON: {e}")))?;

  let Value::Array(parts) = root else {
    return Err(FetchError::Malformed("top level is not an array".into()));
  };

  match parts.get(1) {
    None | Some(Value::Null) => Err(FetchError::ProviderEmptyResult),
    Some(Value::Array(records)) if records.is_empty() => {
      Err(FetchError::ProviderEmptyResult)
    }
    Some(records @ Value::Array(_)) => {
      Vec::<RawObservation>::deserialize(records)
        .map_err(|e| FetchError::Malformed(format!("bad observation record: {e}")))
    }
    Some(other) => Err(FetchError::Malformed(format!(
      "expected an array of observations, got {other}"
    ))),
  }
}

fn requested(countries: &[&'static Country], code: &str) -> Option<&'static Country> {
  countries
    .iter()
    .copied()
    .find(|c| c.iso_alpha2_code.eq_ignore_ascii_case(code))
}

/// Group records into one ascending series per requested country.
pub(crate) fn into_series(
  countries: &[&'static Country],
  indicator: Indicator,
  records: Vec<RawObservation>,
) -> HashMap<&'static str, TimeSeries> {
  let mut grouped: HashMap<&'static str, Vec<YearValue>> = HashMap::new();
  for record in records {
    let (Some(country), Some(year)) = (
      record.country_code().and_then(|c| requested(countries, c)),
      record.year(),
    ) else {
      continue;
    };
    grouped
      .entry(country.iso_alpha2_code)
      .or_default()
      .push(YearValue { year, value: record.value });
  }

  grouped
    .into_iter()
    .map(|(code, points)| (code, TimeSeries::from_points(code, indicator, points)))
    .collect()
}

/// Pick one record per requested country: the latest year with data, or the
/// latest year at all if every record is null.
pub(crate) fn into_latest(
  countries: &[&'static Country],
  indicator: Indicator,
  records: Vec<RawObservation>,
) -> HashMap<&'static str, ObservedValue> {
  let mut latest: HashMap<&'static str, ObservedValue> = HashMap::new();
  for record in records {
    let Some(country) = record.country_code().and_then(|c| requested(countries, c)) else {
      continue;
    };
    let candidate = ObservedValue {
      country_code: country.iso_alpha2_code,
      indicator,
      year: record.year(),
      value: record.value,
    };
    let replace = match latest.get(country.iso_alpha2_code) {
      None => true,
      Some(current) => {
        (candidate.has_data(), candidate.year) > (current.has_data(), current.year)
      }
    };
    if replace {
      latest.insert(country.iso_alpha2_code, candidate);
    }
  }
  latest
}

#[cfg(test)]
mod tests {
  use eumap_core::country;

  use super::*;

  fn body(records: &str) -> Vec<u8> {
    format!(r#"[{{"page":1,"pages":1,"per_page":50,"total":3}},{records}]"#).into_bytes()
  }

  #[test]
  fn descending_provider_order_becomes_ascending() {
    let raw = body(
      r#"[
        {"countryiso2code":"AT","date":"2019","value":3.0},
        {"countryiso2code":"AT","date":"2018","value":2.0},
        {"countryiso2code":"AT","date":"2017","value":1.0}
      ]"#,
    );
    let at = [country::by_code("AT").unwrap()];
    let records = parse_observations(&raw).unwrap();
    let series = into_series(&at, Indicator::Gdp, records);
    let years: Vec<_> = series["AT"].points().iter().map(|p| p.year).collect();
    assert_eq!(years, vec![2017, 2018, 2019]);
  }

  #[test]
  fn null_records_mean_empty_result() {
    let raw = br#"[{"page":0,"pages":0,"per_page":50,"total":0},null]"#;
    assert_eq!(parse_observations(raw).unwrap_err(), FetchError::ProviderEmptyResult);
    assert_eq!(
      parse_observations(&body("[]")).unwrap_err(),
      FetchError::ProviderEmptyResult
    );
  }

  #[test]
  fn error_envelope_means_empty_result() {
    let raw = br#"[{"message":[{"id":"120","key":"Invalid value","value":"The provided parameter value is not valid"}]}]"#;
    assert_eq!(parse_observations(raw).unwrap_err(), FetchError::ProviderEmptyResult);
  }

  #[test]
  fn non_array_is_malformed() {
    assert!(matches!(
      parse_observations(br#"{"oops":true}"#),
      Err(FetchError::Malformed(_))
    ));
    assert!(matches!(parse_observations(b"<html>"), Err(FetchError::Malformed(_))));
  }

  #[test]
  fn country_id_is_used_when_iso2_field_is_absent() {
    let raw = body(
      r#"[{"country":{"id":"BE","value":"Belgium"},"countryiso3code":"BEL","date":"2020","value":27.2}]"#,
    );
    let be = [country::by_code("BE").unwrap()];
    let latest = into_latest(&be, Indicator::Gini, parse_observations(&raw).unwrap());
    assert_eq!(latest["BE"].value, Some(27.2));
    assert_eq!(latest["BE"].year, Some(2020));
  }

  #[test]
  fn latest_prefers_reported_values_then_recent_years() {
    let raw = body(
      r#"[
        {"countryiso2code":"DE","date":"2021","value":null},
        {"countryiso2code":"DE","date":"2019","value":31.7},
        {"countryiso2code":"DE","date":"2018","value":31.1},
        {"countryiso2code":"FR","date":"2021","value":null},
        {"countryiso2code":"US","date":"2021","value":41.5}
      ]"#,
    );
    let picked = [country::by_code("DE").unwrap(), country::by_code("FR").unwrap()];
    let latest = into_latest(&picked, Indicator::Gini, parse_observations(&raw).unwrap());
    assert_eq!(latest.len(), 2);
    assert_eq!(latest["DE"].year, Some(2019));
    assert_eq!(latest["FR"].value, None);
  }
}
