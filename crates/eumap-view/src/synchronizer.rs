//! [`ViewSynchronizer`]: commands in, view state out.

use std::{collections::BTreeSet, sync::Arc};

use eumap_cache::{DataCache, Provenance};
use eumap_core::{
  country::{self, Country},
  indicator::Indicator,
  observation::TimeSeries,
  source::IndicatorSource,
};
use futures::future::join_all;
use tokio::sync::{Mutex, watch};

use crate::{
  Command, Error, Result,
  history::Handoff,
  state::{Layer, Popup, PopupRow, PresentationRecord, ViewState},
};

#[derive(Debug, Default)]
struct Session {
  selection: BTreeSet<Indicator>,
  focus:     Option<&'static Country>,
}

/// Owns the selection and focus, and keeps the published [`ViewState`] in
/// step with the cache.
///
/// Commands are applied one at a time. Each one ends with a refresh that
/// resolves every selected (country, indicator) pair through the cache, so
/// only cold keys reach the network.
pub struct ViewSynchronizer<S> {
  cache:   DataCache<S>,
  session: Mutex<Session>,
  state:   watch::Sender<Arc<ViewState>>,
}

impl<S: IndicatorSource + 'static> ViewSynchronizer<S> {
  pub fn new(cache: DataCache<S>) -> Self {
    let (state, _) = watch::channel(Arc::new(ViewState::default()));
    Self { cache, session: Mutex::new(Session::default()), state }
  }

  pub fn cache(&self) -> &DataCache<S> { &self.cache }

  /// The last published state.
  pub fn current(&self) -> Arc<ViewState> { self.state.borrow().clone() }

  /// Receive every future state change.
  pub fn subscribe(&self) -> watch::Receiver<Arc<ViewState>> { self.state.subscribe() }

  pub async fn selection(&self) -> BTreeSet<Indicator> {
    self.session.lock().await.selection.clone()
  }

  /// Apply one command and return the resulting state. A failed command
  /// leaves the selection, focus and cache as they were.
  pub async fn apply(&self, command: Command) -> Result<Arc<ViewState>> {
    let mut session = self.session.lock().await;
    tracing::debug!(?command, "applying view command");

    match command {
      Command::SelectIndicator(indicator) => {
        session.selection.insert(indicator);
      }
      Command::DeselectIndicator(indicator) => {
        session.selection.remove(&indicator);
      }
      Command::LoadCustomData(document) => {
        self.cache.load_custom(&document)?;
      }
      Command::EditValue { country, indicator, value } => {
        self.cache.edit_str(&country, indicator, &value)?;
      }
      Command::Focus(name) => {
        session.focus = Some(country::resolve(&name)?);
      }
      Command::ClearFocus => session.focus = None,
      Command::Refresh => {}
      Command::Reload => {
        let countries = country::all();
        join_all(
          session
            .selection
            .iter()
            .map(|&indicator| self.cache.refetch(&countries, indicator)),
        )
        .await;
      }
    }

    let state = self.build(&session).await;
    Ok(self.publish(state))
  }

  /// Edit one year of a country's custom history. `raw` is the user input.
  pub async fn edit_history(
    &self,
    country: &str,
    indicator: Indicator,
    year: i32,
    raw: &str,
  ) -> Result<TimeSeries> {
    let value: f64 = raw
      .trim()
      .parse()
      .map_err(|_| eumap_cache::Error::InvalidValue(raw.to_string()))?;
    let session = self.session.lock().await;
    let series = self.cache.edit_point(country, indicator, year, value)?;
    let state = self.build(&session).await;
    self.publish(state);
    Ok(series)
  }

  /// Presentation records for every member state and every indicator in
  /// `selection`. Calling this twice on an unchanged cache gives identical
  /// records.
  pub async fn refresh(&self, selection: &BTreeSet<Indicator>) -> Vec<PresentationRecord> {
    let countries = country::all();
    let per_indicator = join_all(
      selection
        .iter()
        .map(|&indicator| self.cache.latest_many(&countries, indicator)),
    )
    .await;

    per_indicator
      .iter()
      .flatten()
      .map(PresentationRecord::new)
      .collect()
  }

  async fn build(&self, session: &Session) -> ViewState {
    let records = self.refresh(&session.selection).await;
    let provenance = self.cache.provenance();

    let layers = session
      .selection
      .iter()
      .map(|&indicator| Layer {
        indicator,
        color: indicator.color(),
        countries_with_data: records
          .iter()
          .filter(|r| r.indicator == indicator && r.value.is_some())
          .count(),
      })
      .collect();

    let popup = session.focus.map(|country| Popup {
      country_code: country.iso_alpha2_code,
      name:         country.name,
      rows:         records
        .iter()
        .filter(|r| r.country_code == country.iso_alpha2_code)
        .map(|r| PopupRow {
          indicator:     r.indicator,
          label:         r.indicator.display_name(),
          value:         r.value,
          display_value: r.display_value.clone(),
        })
        .collect(),
      editable:     provenance == Provenance::Custom,
      history:      Handoff::country(country, session.selection.iter().copied()),
    });

    ViewState {
      provenance,
      selection: session.selection.iter().copied().collect(),
      layers,
      records,
      popup,
    }
  }

  fn publish(&self, state: ViewState) -> Arc<ViewState> {
    let changed = self.state.send_if_modified(|current| {
      if **current == state {
        return false;
      }
      *current = Arc::new(state);
      true
    });
    if changed {
      tracing::debug!("view state changed");
    }
    self.current()
  }

  pub(crate) async fn selected(&self) -> Result<BTreeSet<Indicator>> {
    let selection = self.selection().await;
    if selection.is_empty() {
      return Err(Error::EmptySelection);
    }
    Ok(selection)
  }
}

#[cfg(test)]
mod tests {
  use eumap_core::{format::NO_DATA, source::MemorySource};
  use serde_json::json;

  use super::*;

  fn source() -> MemorySource {
    MemorySource::new()
      .with_latest("AT", Indicator::Gdp, 2020, Some(4.3e11))
      .with_latest("DE", Indicator::Gdp, 2020, Some(3.9e12))
      .with_latest("AT", Indicator::Gini, 2019, Some(30.0))
      .with_latest("BE", Indicator::Gini, 2019, None)
  }

  fn synchronizer() -> ViewSynchronizer<MemorySource> {
    ViewSynchronizer::new(DataCache::new(source()))
  }

  #[tokio::test]
  async fn selecting_an_indicator_presents_every_member_state() {
    let view = synchronizer();
    let state = view.apply(Command::SelectIndicator(Indicator::Gdp)).await.unwrap();

    assert_eq!(state.records.len(), 27);
    assert_eq!(state.records[0].country_code, "AT");
    assert_eq!(state.records[0].display_value, "430.00 Billion");
    assert_eq!(state.layer(Indicator::Gdp).unwrap().countries_with_data, 2);

    let be = state.records_for(Indicator::Gdp).find(|r| r.country_code == "BE").unwrap();
    assert_eq!(be.display_value, NO_DATA);
    assert_eq!(be.bucket, None);
  }

  #[tokio::test]
  async fn refresh_is_idempotent_and_warm() {
    let view = synchronizer();
    let selection: BTreeSet<_> = [Indicator::Gini, Indicator::Gdp].into_iter().collect();

    let first = view.refresh(&selection).await;
    let second = view.refresh(&selection).await;
    assert_eq!(first, second);
    assert_eq!(first.len(), 54);
    assert_eq!(first[0].indicator, Indicator::Gdp);
    assert_eq!(view.cache().source().calls(), 2);
  }

  #[tokio::test]
  async fn deselecting_keeps_cached_values() {
    let view = synchronizer();
    view.apply(Command::SelectIndicator(Indicator::Gdp)).await.unwrap();
    let cached = view.cache().len();

    let state = view.apply(Command::DeselectIndicator(Indicator::Gdp)).await.unwrap();
    assert!(state.records.is_empty());
    assert!(state.layers.is_empty());
    assert_eq!(view.cache().len(), cached);

    view.apply(Command::SelectIndicator(Indicator::Gdp)).await.unwrap();
    assert_eq!(view.cache().source().calls(), 1);
  }

  #[tokio::test]
  async fn unchanged_state_is_not_republished() {
    let view = synchronizer();
    let mut rx = view.subscribe();

    view.apply(Command::SelectIndicator(Indicator::Gini)).await.unwrap();
    assert!(rx.has_changed().unwrap());
    rx.borrow_and_update();

    view.apply(Command::Refresh).await.unwrap();
    view.apply(Command::SelectIndicator(Indicator::Gini)).await.unwrap();
    assert!(!rx.has_changed().unwrap());
  }

  #[tokio::test]
  async fn reload_fetches_selected_indicators_again() {
    let view = synchronizer();
    view.apply(Command::SelectIndicator(Indicator::Gdp)).await.unwrap();
    view.apply(Command::Refresh).await.unwrap();
    assert_eq!(view.cache().source().calls(), 1);

    let state = view.apply(Command::Reload).await.unwrap();
    assert_eq!(view.cache().source().calls(), 2);
    assert_eq!(state.records.len(), 27);

    view.apply(Command::LoadCustomData(json!({}))).await.unwrap();
    view.apply(Command::Reload).await.unwrap();
    assert_eq!(view.cache().source().calls(), 2);
  }

  #[tokio::test]
  async fn popup_follows_focus_and_selection() {
    let view = synchronizer();
    view.apply(Command::SelectIndicator(Indicator::Gini)).await.unwrap();
    let state = view.apply(Command::Focus("austria".into())).await.unwrap();

    let popup = state.popup.as_ref().unwrap();
    assert_eq!(popup.country_code, "AT");
    assert!(!popup.editable);
    assert_eq!(popup.rows.len(), 1);
    assert_eq!(popup.rows[0].display_value, "30.00");
    assert_eq!(popup.history.items, vec![Indicator::Gini]);

    let err = view.apply(Command::Focus("Atlantis".into())).await.unwrap_err();
    assert!(matches!(err, Error::Core(_)));
    assert_eq!(view.current().popup.as_ref().unwrap().country_code, "AT");

    let state = view.apply(Command::ClearFocus).await.unwrap();
    assert!(state.popup.is_none());
  }

  #[tokio::test]
  async fn custom_data_makes_values_editable() {
    let view = synchronizer();
    view.apply(Command::SelectIndicator(Indicator::Gdp)).await.unwrap();
    view.apply(Command::Focus("DE".into())).await.unwrap();

    let doc = json!({ "Germany": { "GDP": 1.0e12 } });
    let state = view.apply(Command::LoadCustomData(doc)).await.unwrap();
    assert_eq!(state.provenance, Provenance::Custom);
    assert!(state.popup.as_ref().unwrap().editable);
    assert_eq!(state.layer(Indicator::Gdp).unwrap().countries_with_data, 1);

    let bad = Command::EditValue {
      country:   "DE".into(),
      indicator: Indicator::Gdp,
      value:     "lots".into(),
    };
    assert!(matches!(
      view.apply(bad).await,
      Err(Error::Cache(eumap_cache::Error::InvalidValue(_)))
    ));

    let good = Command::EditValue {
      country:   "DE".into(),
      indicator: Indicator::Gdp,
      value:     "2500000000".into(),
    };
    let state = view.apply(good).await.unwrap();
    let de = state.popup.as_ref().unwrap().rows[0].clone();
    assert_eq!(de.display_value, "2.50 Billion");
  }

  #[tokio::test]
  async fn array_upload_is_rejected() {
    let view = synchronizer();
    let err = view.apply(Command::LoadCustomData(json!([1, 2]))).await.unwrap_err();
    assert!(matches!(err, Error::Cache(eumap_cache::Error::InvalidFormat(_))));
    assert_eq!(view.cache().provenance(), Provenance::Live);
  }

  #[tokio::test]
  async fn history_edits_are_published() {
    let view = synchronizer();
    view.apply(Command::LoadCustomData(json!({}))).await.unwrap();
    let series = view.edit_history("AT", Indicator::Cpi, 2015, "1.5").await.unwrap();
    assert_eq!(series.value_at(2015), Some(1.5));
    assert!(view.edit_history("AT", Indicator::Cpi, 2015, "x").await.is_err());
  }
}
