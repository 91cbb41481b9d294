//! The indicator enumeration and everything statically bound to it.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// How values of one indicator combine across countries.
///
/// This is a fixed property of the indicator and never inferred from data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationKind {
  /// Stock quantities: the union value is the sum over countries.
  Extensive,
  /// Rates and ratios: the union value is the mean over reporting countries.
  Intensive,
}

/// One of the macro-economic series the map can display.
///
/// Serialises as its short key (`gdp`, `population`, `cpi`, `gini`).
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
  Gdp,
  Population,
  Cpi,
  Gini,
}

impl Indicator {
  pub const ALL: [Indicator; 4] =
    [Self::Gdp, Self::Population, Self::Cpi, Self::Gini];

  /// World Bank indicator code.
  pub fn code(self) -> &'static str {
    match self {
      Self::Gdp => "NY.GDP.MKTP.CD",
      Self::Population => "SP.POP.TOTL",
      Self::Cpi => "FP.CPI.TOTL.ZG",
      Self::Gini => "SI.POV.GINI",
    }
  }

  /// Name shown in controls and used as the key in custom data files.
  pub fn display_name(self) -> &'static str {
    match self {
      Self::Gdp => "GDP",
      Self::Population => "Population",
      Self::Cpi => "CPI",
      Self::Gini => "Gini Coefficient",
    }
  }

  /// Short key used in URLs and export file names.
  pub fn key(self) -> &'static str {
    match self {
      Self::Gdp => "gdp",
      Self::Population => "population",
      Self::Cpi => "cpi",
      Self::Gini => "gini",
    }
  }

  pub fn kind(self) -> AggregationKind {
    match self {
      Self::Gdp | Self::Population => AggregationKind::Extensive,
      Self::Cpi | Self::Gini => AggregationKind::Intensive,
    }
  }

  /// Outline colour of the map layer, as `#RRGGBB`.
  pub fn color(self) -> &'static str {
    match self {
      Self::Gdp => "#FFD700",
      Self::Population => "#32CD32",
      Self::Cpi => "#1E90FF",
      Self::Gini => "#FF69B4",
    }
  }

  /// [`Self::color`] as RGB bytes.
  pub fn rgb(self) -> [u8; 3] {
    match self {
      Self::Gdp => [0xFF, 0xD7, 0x00],
      Self::Population => [0x32, 0xCD, 0x32],
      Self::Cpi => [0x1E, 0x90, 0xFF],
      Self::Gini => [0xFF, 0x69, 0xB4],
    }
  }

  /// Axis label of a single-country chart.
  pub fn chart_label(self) -> &'static str {
    match self {
      Self::Gdp => "GDP (current US$)",
      Self::Population => "Population",
      Self::Cpi => "CPI Inflation (%)",
      Self::Gini => "Gini Coefficient",
    }
  }

  /// Axis label of the EU aggregate chart.
  pub fn aggregate_label(self) -> &'static str {
    match self {
      Self::Gdp => "Total GDP (current US$)",
      Self::Population => "Total Population",
      Self::Cpi => "Average CPI Inflation (%)",
      Self::Gini => "Average Gini Coefficient",
    }
  }

  /// Lower bounds of buckets 1 through 6; bucket 0 is everything below the
  /// first entry and bucket 6 is open-ended.
  pub fn thresholds(self) -> [f64; 6] {
    match self {
      Self::Gdp => [1e10, 5e10, 1e11, 2.5e11, 5e11, 1e12],
      Self::Population => [1e6, 2.5e6, 5e6, 1e7, 2.5e7, 5e7],
      Self::Cpi => [0.0, 1.0, 2.0, 3.0, 5.0, 8.0],
      Self::Gini => [25.0, 27.5, 30.0, 32.5, 35.0, 37.5],
    }
  }

  /// Accepts the short key, the display name or the provider code.
  pub fn lookup(s: &str) -> Option<Self> {
    let s = s.trim();
    Self::ALL.into_iter().find(|i| {
      i.key().eq_ignore_ascii_case(s)
        || i.display_name().eq_ignore_ascii_case(s)
        || i.code().eq_ignore_ascii_case(s)
    })
  }
}

impl fmt::Display for Indicator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.display_name())
  }
}

impl FromStr for Indicator {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::lookup(s).ok_or_else(|| Error::UnknownIndicator(s.to_string()))
  }
}
