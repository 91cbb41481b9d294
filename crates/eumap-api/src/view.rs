//! Handlers that drive the map view.
//!
//! Every command answers with the resulting view state.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/view` | Last published state |
//! | `PUT`    | `/selection/{indicator}` | Key, display name or provider code |
//! | `DELETE` | `/selection/{indicator}` | Cached values are kept |
//! | `POST`   | `/refresh` | Recompute from the cache |
//! | `POST`   | `/reload` | Fetch the selected indicators again |
//! | `PUT`    | `/focus/{country}` | Open the detail popup |
//! | `DELETE` | `/focus` | Close it |

use axum::{
  Json,
  extract::{Path, State},
};
use eumap_core::{indicator::Indicator, source::IndicatorSource};
use eumap_view::{Command, ViewState};

use crate::{Shared, error::ApiError};

pub(crate) async fn run<S: IndicatorSource + 'static>(
  view: &Shared<S>,
  command: Command,
) -> Result<Json<ViewState>, ApiError> {
  let state = view.apply(command).await?;
  Ok(Json(ViewState::clone(&state)))
}

/// `GET /view`
pub async fn current<S: IndicatorSource + 'static>(
  State(view): State<Shared<S>>,
) -> Json<ViewState> {
  Json(ViewState::clone(&view.current()))
}

/// `PUT /selection/{indicator}`
pub async fn select<S: IndicatorSource + 'static>(
  State(view): State<Shared<S>>,
  Path(indicator): Path<String>,
) -> Result<Json<ViewState>, ApiError> {
  let indicator: Indicator = indicator.parse()?;
  run(&view, Command::SelectIndicator(indicator)).await
}

/// `DELETE /selection/{indicator}`
pub async fn deselect<S: IndicatorSource + 'static>(
  State(view): State<Shared<S>>,
  Path(indicator): Path<String>,
) -> Result<Json<ViewState>, ApiError> {
  let indicator: Indicator = indicator.parse()?;
  run(&view, Command::DeselectIndicator(indicator)).await
}

/// `POST /refresh`
pub async fn refresh<S: IndicatorSource + 'static>(
  State(view): State<Shared<S>>,
) -> Result<Json<ViewState>, ApiError> {
  run(&view, Command::Refresh).await
}

/// `POST /reload`
pub async fn reload<S: IndicatorSource + 'static>(
  State(view): State<Shared<S>>,
) -> Result<Json<ViewState>, ApiError> {
  run(&view, Command::Reload).await
}

/// `PUT /focus/{country}`
pub async fn focus<S: IndicatorSource + 'static>(
  State(view): State<Shared<S>>,
  Path(country): Path<String>,
) -> Result<Json<ViewState>, ApiError> {
  run(&view, Command::Focus(country)).await
}

/// `DELETE /focus`
pub async fn clear_focus<S: IndicatorSource + 'static>(
  State(view): State<Shared<S>>,
) -> Result<Json<ViewState>, ApiError> {
  run(&view, Command::ClearFocus).await
}
