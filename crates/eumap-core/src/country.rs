//! The fixed registry of EU member states.
//!
//! The set is a membership snapshot of 27 entries. Codes are ISO 3166-1
//! alpha-2 and double as the World Bank country identifiers.

use serde::Serialize;

use crate::{Error, Result};

/// Code used wherever the union as a whole is meant instead of one member.
pub const EU_SENTINEL: &str = "EU";

/// Display name paired with [`EU_SENTINEL`].
pub const EU_NAME: &str = "European Union";

/// One EU member state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Country {
  pub name:            &'static str,
  pub iso_alpha2_code: &'static str,
  /// Alternative spellings used by map boundary datasets.
  pub aliases:         &'static [&'static str],
}

const fn country(
  name: &'static str,
  iso_alpha2_code: &'static str,
  aliases: &'static [&'static str],
) -> Country {
  Country { name, iso_alpha2_code, aliases }
}

/// All member states, ordered by name.
pub static EU_COUNTRIES: [Country; 27] = [
  country("Austria", "AT", &[]),
  country("Belgium", "BE", &[]),
  country("Bulgaria", "BG", &[]),
  country("Croatia", "HR", &[]),
  country("Cyprus", "CY", &[]),
  country("Czech Republic", "CZ", &["Czech Rep.", "Czechia"]),
  country("Denmark", "DK", &[]),
  country("Estonia", "EE", &[]),
  country("Finland", "FI", &[]),
  country("France", "FR", &[]),
  country("Germany", "DE", &[]),
  country("Greece", "GR", &[]),
  country("Hungary", "HU", &[]),
  country("Ireland", "IE", &[]),
  country("Italy", "IT", &[]),
  country("Latvia", "LV", &[]),
  country("Lithuania", "LT", &[]),
  country("Luxembourg", "LU", &[]),
  country("Malta", "MT", &[]),
  country("Netherlands", "NL", &[]),
  country("Poland", "PL", &[]),
  country("Portugal", "PT", &[]),
  country("Romania", "RO", &[]),
  country("Slovak Republic", "SK", &["Slovakia"]),
  country("Slovenia", "SI", &[]),
  country("Spain", "ES", &[]),
  country("Sweden", "SE", &[]),
];

/// Every member state as a list of references, the shape batch operations
/// take.
pub fn all() -> Vec<&'static Country> { EU_COUNTRIES.iter().collect() }

/// Look a member up by its two-letter code (case-insensitive).
pub fn by_code(code: &str) -> Option<&'static Country> {
  let code = code.trim();
  EU_COUNTRIES
    .iter()
    .find(|c| c.iso_alpha2_code.eq_ignore_ascii_case(code))
}

/// Look a member up by its canonical name or any alias (case-insensitive).
pub fn by_name(name: &str) -> Option<&'static Country> {
  let name = name.trim();
  EU_COUNTRIES.iter().find(|c| {
    c.name.eq_ignore_ascii_case(name)
      || c.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
  })
}

/// Resolve either a code or a name.
pub fn resolve(code_or_name: &str) -> Result<&'static Country> {
  by_code(code_or_name)
    .or_else(|| by_name(code_or_name))
    .ok_or_else(|| Error::UnknownCountry(code_or_name.to_string()))
}

/// Join codes the way the provider expects for batch queries (`AT;BE;BG`).
pub fn batch_code(countries: &[&Country]) -> String {
  countries
    .iter()
    .map(|c| c.iso_alpha2_code)
    .collect::<Vec<_>>()
    .join(";")
}
