//! Core types for the EU indicator map.
//!
//! This crate holds the country and indicator registry, the observation data
//! model, the aggregation rules and the presentation helpers shared by every
//! other crate. It is deliberately free of HTTP and runtime dependencies; the
//! only seam to the outside world is the [`source::IndicatorSource`] trait.

// Native `async fn` in traits; see `source.rs`.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod country;
pub mod error;
pub mod export;
pub mod format;
pub mod indicator;
pub mod observation;
pub mod operation;
pub mod source;

pub use error::{Error, Result};
