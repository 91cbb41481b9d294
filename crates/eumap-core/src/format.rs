//! Human-readable numbers and colour buckets.

use crate::indicator::Indicator;

/// Rendered in place of a number when there is no data.
pub const NO_DATA: &str = "N/A";

/// Number of colour buckets; bucket indices run from 0 to `BUCKETS - 1`.
pub const BUCKETS: u8 = 7;

const SCALES: [(f64, &str); 4] = [
  (1e12, "Trillion"),
  (1e9, "Billion"),
  (1e6, "Million"),
  (1e3, "Thousand"),
];

/// Format a value with a magnitude suffix and two decimals, e.g.
/// `2.50 Billion`. Values below one thousand (including all negatives) are
/// printed as-is with two decimals.
pub fn format_number(value: Option<f64>) -> String {
  let Some(v) = value.filter(|v| v.is_finite()) else {
    return NO_DATA.to_string();
  };
  for (scale, suffix) in SCALES {
    if v >= scale {
      return format!("{:.2} {suffix}", v / scale);
    }
  }
  format!("{v:.2}")
}

/// Discretise `value` into one of [`BUCKETS`] ordered ranges using the
/// indicator's thresholds.
pub fn bucket(indicator: Indicator, value: f64) -> u8 {
  let thresholds = indicator.thresholds();
  thresholds.partition_point(|t| *t <= value) as u8
}
