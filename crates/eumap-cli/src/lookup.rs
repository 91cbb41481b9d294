//! Forgiving country lookup for command-line arguments.

use anyhow::{Result, anyhow};
use eumap_core::country::{self, Country, EU_COUNTRIES, EU_SENTINEL};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};

/// Resolve a code, a name or alias, or failing both the best fuzzy match
/// over names and aliases (`"czech"`, `"nethrlands"`).
pub fn resolve_country(query: &str) -> Result<&'static Country> {
  if let Ok(country) = country::resolve(query) {
    return Ok(country);
  }

  let matcher = SkimMatcherV2::default();
  EU_COUNTRIES
    .iter()
    .filter_map(|c| {
      std::iter::once(c.name)
        .chain(c.aliases.iter().copied())
        .filter_map(|name| matcher.fuzzy_match(name, query.trim()))
        .max()
        .map(|score| (score, c))
    })
    .max_by_key(|(score, _)| *score)
    .map(|(_, c)| c)
    .ok_or_else(|| anyhow!("no EU member state matches {query:?}"))
}

/// Like [`resolve_country`], but `EU` passes through for union-wide views.
pub fn resolve_code(query: &str) -> Result<String> {
  if query.trim().eq_ignore_ascii_case(EU_SENTINEL) {
    return Ok(EU_SENTINEL.to_string());
  }
  Ok(resolve_country(query)?.iso_alpha2_code.to_string())
}
