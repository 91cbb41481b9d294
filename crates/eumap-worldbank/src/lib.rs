//! World Bank indicator API client.
//!
//! Fetches per-country indicator data, normalises the provider's JSON into
//! the typed [`eumap_core::observation`] model and implements
//! [`eumap_core::source::IndicatorSource`].

mod client;
mod parse;

pub mod error;

pub use client::{ClientConfig, WorldBankClient};
pub use error::{Error, Result};
pub use parse::RawObservation;
