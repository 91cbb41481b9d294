//! Names of the raster artifacts a user can download.

use std::{fmt, str::FromStr};

use crate::{Error, indicator::Indicator};

pub const MAP_FILE_NAME: &str = "map.png";

const CHART_SUFFIX: &str = "-chart.png";

/// A downloadable image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
  /// Line chart of one indicator's history.
  Chart(Indicator),
  /// The choropleth map with every active layer.
  Map,
}

impl Artifact {
  pub fn file_name(self) -> String {
    match self {
      Self::Chart(indicator) => format!("{}{CHART_SUFFIX}", indicator.key()),
      Self::Map => MAP_FILE_NAME.to_string(),
    }
  }
}

impl fmt::Display for Artifact {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.file_name())
  }
}

impl FromStr for Artifact {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s == MAP_FILE_NAME {
      return Ok(Self::Map);
    }
    s.strip_suffix(CHART_SUFFIX)
      .and_then(|key| Indicator::ALL.into_iter().find(|i| i.key() == key))
      .map(Self::Chart)
      .ok_or_else(|| Error::UnknownArtifact(s.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn file_names_follow_fixed_pattern() {
    assert_eq!(Artifact::Chart(Indicator::Gini).file_name(), "gini-chart.png");
    assert_eq!(Artifact::Map.file_name(), "map.png");
    assert_eq!("cpi-chart.png".parse::<Artifact>().unwrap(), Artifact::Chart(Indicator::Cpi));
    assert!("hdi-chart.png".parse::<Artifact>().is_err());
  }
}
