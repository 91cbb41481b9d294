//! Commands accepted by the [`ViewSynchronizer`](crate::ViewSynchronizer).

use eumap_core::indicator::Indicator;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
  SelectIndicator(Indicator),
  DeselectIndicator(Indicator),
  /// Replace all data with a user-supplied document.
  LoadCustomData(Value),
  /// Manual edit of one latest value. `value` is the raw user input.
  EditValue {
    country:   String,
    indicator: Indicator,
    value:     String,
  },
  /// Open the detail popup for a country, by code or name.
  Focus(String),
  ClearFocus,
  /// Recompute the view from the cache.
  Refresh,
  /// Fetch every selected indicator again, replacing cached live values.
  Reload,
}
