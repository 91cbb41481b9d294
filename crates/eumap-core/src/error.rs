//! Error types for `eumap-core`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("unknown country: {0:?}")]
  UnknownCountry(String),

  #[error("unknown indicator: {0:?}")]
  UnknownIndicator(String),

  #[error("unknown operation: {0:?}")]
  UnknownOperation(String),

  #[error("unknown export artifact: {0:?}")]
  UnknownArtifact(String),

  #[error("invalid year range {start}:{end}")]
  InvalidYearRange { start: i32, end: i32 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
