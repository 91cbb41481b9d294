//! Error type for `eumap-cache`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] eumap_core::Error),

  /// A custom data document did not have the expected shape.
  #[error("invalid data format: {0}")]
  InvalidFormat(String),

  /// A manual edit was not a finite number.
  #[error("invalid number: {0:?}")]
  InvalidValue(String),

  #[error("custom data is loaded; live values can no longer be stored")]
  NotLive,

  #[error("values can only be edited after custom data is loaded")]
  NotCustom,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
