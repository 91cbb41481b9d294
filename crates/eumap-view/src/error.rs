//! Error type for `eumap-view`.

use eumap_core::indicator::Indicator;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] eumap_core::Error),

  #[error(transparent)]
  Cache(#[from] eumap_cache::Error),

  #[error("no indicators selected")]
  EmptySelection,

  /// An operand of a country operation has no reported value.
  #[error("no {indicator} data for {country}")]
  DataUnavailable { country: String, indicator: Indicator },

  #[error("image encoding failed: {0}")]
  Render(#[from] image::ImageError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
