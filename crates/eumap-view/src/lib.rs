//! Derived views over the indicator cache.
//!
//! [`ViewSynchronizer`] consumes [`Command`]s, keeps the indicator selection
//! and the focused country, and republishes a [`ViewState`] whenever the
//! derived presentation changes. It also answers the read-only questions the
//! front end asks: the EU summary, historical charts, comparisons, country
//! operations and raster exports.

pub mod command;
pub mod error;
pub mod history;
pub mod render;
pub mod state;
pub mod summary;
pub mod synchronizer;

pub use command::Command;
pub use error::{Error, Result};
pub use history::{ChartDataset, Handoff, HistoryView};
pub use state::{Layer, Popup, PopupRow, PresentationRecord, ViewState};
pub use summary::{Comparison, ComparedValue, EuIndicator, EuSummary, OperationOutcome};
pub use synchronizer::ViewSynchronizer;
