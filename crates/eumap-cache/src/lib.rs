//! In-memory indicator cache for the EU map.
//!
//! Sits between the views and an [`eumap_core::source::IndicatorSource`].
//! While the cache is live, misses are fetched lazily and concurrent misses
//! for the same key share one request. Once custom data is loaded the cache
//! is the only source of truth for the rest of the session.

mod cache;
mod custom;

pub mod error;

pub use cache::{DataCache, Entry, Key, Provenance, Shape};
pub use error::{Error, Result};
