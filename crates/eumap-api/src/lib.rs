//! JSON REST API for the EU indicator map.
//!
//! Exposes an axum [`Router`] backed by a shared
//! [`eumap_view::ViewSynchronizer`]. Static files, the provider proxy and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", eumap_api::api_router(view.clone()))
//! ```

pub mod custom;
pub mod error;
pub mod export;
pub mod insights;
pub mod registry;
pub mod view;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use eumap_core::source::IndicatorSource;
use eumap_view::ViewSynchronizer;

pub use error::ApiError;

/// Shared handler state.
pub type Shared<S> = Arc<ViewSynchronizer<S>>;

/// Build a fully-materialised API router for `view`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(view: Shared<S>) -> Router<()>
where
  S: IndicatorSource + 'static,
{
  Router::new()
    // Registry
    .route("/countries", get(registry::countries))
    .route("/indicators", get(registry::indicators))
    // View commands
    .route("/view", get(view::current::<S>))
    .route(
      "/selection/{indicator}",
      put(view::select::<S>).delete(view::deselect::<S>),
    )
    .route("/refresh", post(view::refresh::<S>))
    .route("/reload", post(view::reload::<S>))
    .route("/focus", axum::routing::delete(view::clear_focus::<S>))
    .route("/focus/{country}", put(view::focus::<S>))
    // Custom data
    .route("/custom", post(custom::load::<S>))
    .route("/custom/{country}/{indicator}", put(custom::edit::<S>))
    .route("/custom/{country}/{indicator}/{year}", put(custom::edit_year::<S>))
    // Derived views
    .route("/eu", get(insights::eu::<S>))
    .route("/history", get(insights::history::<S>))
    .route("/compare", get(insights::compare::<S>))
    .route("/operation", get(insights::operation::<S>))
    .route("/export/{file}", get(export::download::<S>))
    .with_state(view)
}
