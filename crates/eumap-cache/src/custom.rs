//! Parsing of user-supplied datasets.
//!
//! ```json
//! {
//!   "Germany": { "GDP": 3.8e12, "Gini Coefficient": null },
//!   "AT":      { "cpi": { "years": [2019, 2020], "values": [1.5, null] } }
//! }
//! ```
//!
//! Countries and indicators are matched by name, alias, key or code. Unknown
//! ones are skipped; anything with the wrong shape rejects the whole document.

use std::collections::HashMap;

use eumap_core::{
  country,
  indicator::Indicator,
  observation::{ObservedValue, TimeSeries, YearValue},
};
use serde_json::{Map, Value};

use crate::{
  Error, Result,
  cache::{Entry, Key},
};

pub(crate) fn parse_document(document: &Value) -> Result<HashMap<Key, Entry>> {
  let Value::Object(countries) = document else {
    return Err(Error::InvalidFormat(format!(
      "expected an object keyed by country, got {}",
      kind(document)
    )));
  };

  let mut entries = HashMap::new();
  for (name, indicators) in countries {
    let Some(country) = country::by_name(name).or_else(|| country::by_code(name)) else {
      tracing::warn!(country = %name, "skipping unknown country in custom data");
      continue;
    };
    let Value::Object(indicators) = indicators else {
      return Err(Error::InvalidFormat(format!(
        "{name}: expected an object keyed by indicator, got {}",
        kind(indicators)
      )));
    };
    parse_country(country.iso_alpha2_code, indicators, &mut entries)?;
  }
  Ok(entries)
}

fn parse_country(
  code: &'static str,
  indicators: &Map<String, Value>,
  entries: &mut HashMap<Key, Entry>,
) -> Result<()> {
  for (name, leaf) in indicators {
    let Some(indicator) = Indicator::lookup(name) else {
      tracing::warn!(
        country = code,
        indicator = %name,
        "skipping unknown indicator in custom data"
      );
      continue;
    };
    match leaf {
      Value::Null => {
        let entry = Entry::Latest(ObservedValue::missing(code, indicator));
        entries.insert(entry.key(), entry);
      }
      Value::Number(n) => {
        let value = n.as_f64().filter(|v| v.is_finite()).ok_or_else(|| {
          Error::InvalidFormat(format!("{code}/{name}: {n} is not a finite number"))
        })?;
        let entry = Entry::Latest(ObservedValue {
          country_code: code,
          indicator,
          year: None,
          value: Some(value),
        });
        entries.insert(entry.key(), entry);
      }
      Value::Object(fields) => {
        let series = parse_series(code, indicator, fields)
          .map_err(|msg| Error::InvalidFormat(format!("{code}/{name}: {msg}")))?;
        let latest = Entry::Latest(series.latest());
        entries.insert(latest.key(), latest);
        if let Some(window) = series.span() {
          let entry = Entry::Series { window, series };
          entries.insert(entry.key(), entry);
        }
      }
      other => {
        return Err(Error::InvalidFormat(format!(
          "{code}/{name}: expected a number, null or a series, got {}",
          kind(other)
        )));
      }
    }
  }
  Ok(())
}

fn parse_series(
  code: &'static str,
  indicator: Indicator,
  fields: &Map<String, Value>,
) -> Result<TimeSeries, String> {
  let array = |field: &str| match fields.get(field) {
    Some(Value::Array(items)) => Ok(items),
    _ => Err(format!("missing `{field}` array")),
  };
  let years = array("years")?;
  let values = array("values")?;
  if years.len() != values.len() {
    return Err(format!("{} years but {} values", years.len(), values.len()));
  }

  let mut points = Vec::with_capacity(years.len());
  for (year, value) in years.iter().zip(values) {
    let year = match year {
      Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
      Value::String(s) => s.trim().parse().ok(),
      _ => None,
    }
    .ok_or_else(|| format!("bad year {year}"))?;
    let value = match value {
      Value::Null => None,
      Value::Number(n) => Some(
        n.as_f64()
          .filter(|v| v.is_finite())
          .ok_or_else(|| format!("bad value {n}"))?,
      ),
      other => return Err(format!("bad value {other}")),
    };
    points.push(YearValue { year, value });
  }

  // Later duplicates win, matching how a hand-edited table reads.
  points.reverse();
  Ok(TimeSeries::from_points(code, indicator, points))
}

fn kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}
