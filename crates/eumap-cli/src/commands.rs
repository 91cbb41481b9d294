//! Subcommand implementations. Each one renders either a plain-text table or
//! pretty JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use eumap_core::{
  country,
  export::Artifact,
  format::format_number,
  indicator::Indicator,
  operation::Operation,
  source::IndicatorSource,
};
use eumap_view::{Command as ViewCommand, Handoff, ViewSynchronizer};
use serde::Serialize;

use crate::lookup::{resolve_code, resolve_country};

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Latest value of one indicator per member state.
  Latest {
    /// `gdp`, `population`, `cpi`, `gini`, or a provider code.
    indicator: Indicator,
    /// Countries to show (default: all 27).
    countries: Vec<String>,
  },

  /// Union-wide totals and averages for the given indicators.
  Eu {
    #[arg(required = true)]
    indicators: Vec<Indicator>,
  },

  /// Year-by-year history of a country, or `EU` for aggregates.
  History {
    #[arg(default_value = "EU")]
    country: String,
    /// Comma-separated indicators (default: all for a country).
    #[arg(long, value_delimiter = ',')]
    items: Vec<Indicator>,
  },

  /// One indicator for two countries side by side.
  Compare {
    a:         String,
    b:         String,
    indicator: Indicator,
  },

  /// Combine two indicators of one country: `calc DE gdp divide population`.
  Calc {
    country: String,
    left:    Indicator,
    op:      Operation,
    right:   Indicator,
  },

  /// Write `map.png` or `{indicator}-chart.png`.
  Export {
    file:   Artifact,
    /// Country for charts (default: EU).
    #[arg(long)]
    code:   Option<String>,
    /// Layers drawn on the map.
    #[arg(long, value_delimiter = ',')]
    select: Vec<Indicator>,
    /// Output path (default: the artifact's file name).
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
}

/// Run `command` against `view` and return what should be printed.
pub async fn run<S>(view: &ViewSynchronizer<S>, command: Command, json: bool) -> Result<String>
where
  S: IndicatorSource + 'static,
{
  match command {
    Command::Latest { indicator, countries } => {
      let targets = if countries.is_empty() {
        country::all()
      } else {
        countries
          .iter()
          .map(|c| resolve_country(c))
          .collect::<Result<Vec<_>>>()?
      };
      let values = view.cache().latest_many(&targets, indicator).await;
      if json {
        return to_json(&values);
      }
      let rows = targets.iter().zip(&values).map(|(c, v)| {
        let year = v.year.map(|y| y.to_string()).unwrap_or_default();
        format!("{:<16} {:>4}  {}", c.name, year, format_number(v.value))
      });
      Ok(table(indicator.display_name(), rows))
    }

    Command::Eu { indicators } => {
      for indicator in indicators {
        view.apply(ViewCommand::SelectIndicator(indicator)).await?;
      }
      let summary = view.eu_summary().await?;
      if json {
        return to_json(&summary);
      }
      let rows = summary.indicators.iter().map(|i| {
        format!(
          "{:<28} {:>18}  ({} countries)",
          i.label, i.display_value, i.contributors
        )
      });
      Ok(table(country::EU_NAME, rows))
    }

    Command::History { country, items } => {
      let code = resolve_code(&country)?;
      let handoff = if code == country::EU_SENTINEL {
        Handoff::eu(items)
      } else {
        Handoff::country(resolve_country(&code)?, items)
      };
      let history = view.history(&handoff).await?;
      if json {
        return to_json(&history);
      }
      let mut out = String::new();
      for chart in &history.charts {
        let rows = chart
          .years
          .iter()
          .zip(&chart.values)
          .map(|(year, value)| format!("{year}  {}", format_number(Some(*value))));
        out.push_str(&table(&format!("{}: {}", history.name, chart.label), rows));
      }
      Ok(out)
    }

    Command::Compare { a, b, indicator } => {
      let a = resolve_country(&a)?.iso_alpha2_code;
      let b = resolve_country(&b)?.iso_alpha2_code;
      let comparison = view.compare(a, b, indicator).await?;
      if json {
        return to_json(&comparison);
      }
      let rows = [&comparison.left, &comparison.right]
        .into_iter()
        .map(|v| format!("{:<16} {}", v.name, v.display_value));
      Ok(table(indicator.display_name(), rows))
    }

    Command::Calc { country, left, op, right } => {
      let code = resolve_country(&country)?.iso_alpha2_code;
      let outcome = view.operate(code, left, op, right).await?;
      if json {
        return to_json(&outcome);
      }
      Ok(format!(
        "{}: {} = {}\n",
        outcome.name,
        outcome.expression(),
        outcome.display_value
      ))
    }

    Command::Export { file, code, select, output } => {
      for indicator in select {
        view.apply(ViewCommand::SelectIndicator(indicator)).await?;
      }
      let code = code.as_deref().map(resolve_code).transpose()?;
      let png = view.export(file, code.as_deref()).await?;
      let path = output.unwrap_or_else(|| PathBuf::from(file.file_name()));
      std::fs::write(&path, &png)
        .with_context(|| format!("writing {}", path.display()))?;
      tracing::info!(path = %path.display(), bytes = png.len(), "exported");
      Ok(format!("wrote {}\n", path.display()))
    }
  }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
  let mut out = serde_json::to_string_pretty(value).context("serialising output")?;
  out.push('\n');
  Ok(out)
}

fn table(title: &str, rows: impl Iterator<Item = String>) -> String {
  let mut out = format!("{title}\n{}\n", "─".repeat(title.chars().count()));
  for row in rows {
    out.push_str(&row);
    out.push('\n');
  }
  out
}

#[cfg(test)]
mod tests {
  use eumap_cache::DataCache;
  use eumap_core::{
    observation::{TimeSeries, YearValue},
    source::MemorySource,
  };
  use eumap_view::ViewSynchronizer;

  use super::*;

  fn view() -> ViewSynchronizer<MemorySource> {
    let source = MemorySource::new()
      .with_latest("DE", Indicator::Gdp, 2020, Some(3.9e12))
      .with_latest("DE", Indicator::Population, 2020, Some(8.3e7))
      .with_latest("FR", Indicator::Gdp, 2020, Some(2.6e12))
      .with_series(TimeSeries::from_points(
        "DE",
        Indicator::Cpi,
        [
          YearValue { year: 2018, value: Some(1.7) },
          YearValue { year: 2019, value: None },
          YearValue { year: 2020, value: Some(0.5) },
        ],
      ));
    ViewSynchronizer::new(DataCache::new(source))
  }

  #[tokio::test]
  async fn latest_lists_requested_countries() {
    let out = run(
      &view(),
      Command::Latest {
        indicator: Indicator::Gdp,
        countries: vec!["germany".into(), "fr".into()],
      },
      false,
    )
    .await
    .unwrap();
    assert!(out.starts_with("GDP\n"));
    assert!(out.contains("Germany"));
    assert!(out.contains("3.90 Trillion"));
    assert!(out.contains("France"));
    assert!(!out.contains("Austria"));
  }

  #[tokio::test]
  async fn eu_totals_as_json() {
    let out = run(&view(), Command::Eu { indicators: vec![Indicator::Gdp] }, true)
      .await
      .unwrap();
    let summary: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(summary["indicators"][0]["contributors"], 2);
    assert_eq!(summary["indicators"][0]["value"], 6.5e12);
  }

  #[tokio::test]
  async fn country_history_drops_missing_years() {
    let out = run(
      &view(),
      Command::History { country: "DE".into(), items: vec![Indicator::Cpi] },
      false,
    )
    .await
    .unwrap();
    assert!(out.contains("2018"));
    assert!(!out.contains("2019"));
    assert!(out.contains("2020"));
  }

  #[tokio::test]
  async fn calc_reports_expression() {
    let out = run(
      &view(),
      Command::Calc {
        country: "Germany".into(),
        left:    Indicator::Gdp,
        op:      Operation::Divide,
        right:   Indicator::Population,
      },
      false,
    )
    .await
    .unwrap();
    assert!(out.starts_with("Germany: GDP ÷ Population = "));
  }

  #[tokio::test]
  async fn calc_without_data_fails() {
    let err = run(
      &view(),
      Command::Calc {
        country: "FR".into(),
        left:    Indicator::Gdp,
        op:      Operation::Add,
        right:   Indicator::Gini,
      },
      false,
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("France"));
  }

  #[tokio::test]
  async fn export_writes_png() {
    let path = std::env::temp_dir().join(format!("eumap-cli-map-{}.png", std::process::id()));
    let out = run(
      &view(),
      Command::Export {
        file:   Artifact::Map,
        code:   None,
        select: vec![Indicator::Gdp],
        output: Some(path.clone()),
      },
      false,
    )
    .await
    .unwrap();
    assert!(out.starts_with("wrote "));
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    let _ = std::fs::remove_file(path);
  }
}
