//! Arithmetic between two indicators of the same country.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
  Add,
  Subtract,
  Multiply,
  Divide,
}

impl Operation {
  pub fn symbol(self) -> &'static str {
    match self {
      Self::Add => "+",
      Self::Subtract => "-",
      Self::Multiply => "×",
      Self::Divide => "÷",
    }
  }

  /// Apply to two operands. Division by zero has no result.
  pub fn apply(self, left: f64, right: f64) -> Option<f64> {
    match self {
      Self::Add => Some(left + right),
      Self::Subtract => Some(left - right),
      Self::Multiply => Some(left * right),
      Self::Divide => (right != 0.0).then(|| left / right),
    }
  }
}

impl fmt::Display for Operation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.symbol())
  }
}

impl FromStr for Operation {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "add" | "+" => Ok(Self::Add),
      "subtract" | "-" => Ok(Self::Subtract),
      "multiply" | "*" | "×" => Ok(Self::Multiply),
      "divide" | "/" | "÷" => Ok(Self::Divide),
      _ => Err(Error::UnknownOperation(s.to_string())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn divide_by_zero_has_no_result() {
    assert_eq!(Operation::Divide.apply(1.0, 0.0), None);
    assert_eq!(Operation::Divide.apply(9.0, 3.0), Some(3.0));
  }

  #[test]
  fn parses_names_and_symbols() {
    assert_eq!("multiply".parse::<Operation>().unwrap(), Operation::Multiply);
    assert_eq!("/".parse::<Operation>().unwrap(), Operation::Divide);
    assert!("modulo".parse::<Operation>().is_err());
  }
}
