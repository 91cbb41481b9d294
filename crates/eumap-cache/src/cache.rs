//! [`DataCache`]: provenance, lazy fetching and request coalescing.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use eumap_core::{
  country::{self, Country},
  indicator::Indicator,
  observation::{ObservedValue, TimeSeries, YearRange},
  source::{FetchError, IndicatorSource},
};
use futures::future::{BoxFuture, FutureExt, Shared, join_all};
use serde::Serialize;
use serde_json::Value;

use crate::{Error, Result, custom};

// ─── Keys and entries ────────────────────────────────────────────────────────

/// Where the cached values come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
  /// Values are fetched from the provider on demand.
  #[default]
  Live,
  /// A user-supplied dataset replaced the cache. Terminal for the session.
  Custom,
}

/// The shape of a cached value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
  Latest,
  Series,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
  pub country_code: &'static str,
  pub indicator:    Indicator,
  pub shape:        Shape,
}

impl Key {
  pub fn new(country_code: &'static str, indicator: Indicator, shape: Shape) -> Self {
    Self { country_code, indicator, shape }
  }
}

/// A cached value. A present entry whose value is missing is a definitive
/// "no data" answer and is not refetched.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
  Latest(ObservedValue),
  Series {
    /// The window that was requested when this series was stored.
    window: YearRange,
    series: TimeSeries,
  },
}

impl Entry {
  pub fn key(&self) -> Key {
    match self {
      Self::Latest(v) => Key::new(v.country_code, v.indicator, Shape::Latest),
      Self::Series { series, .. } => {
        Key::new(series.country_code, series.indicator, Shape::Series)
      }
    }
  }

  pub fn as_latest(&self) -> Option<&ObservedValue> {
    match self {
      Self::Latest(v) => Some(v),
      Self::Series { .. } => None,
    }
  }

  pub fn as_series(&self) -> Option<&TimeSeries> {
    match self {
      Self::Series { series, .. } => Some(series),
      Self::Latest(_) => None,
    }
  }
}

#[derive(Debug, Clone, Copy)]
enum Request {
  Latest,
  Series(YearRange),
}

impl Request {
  fn shape(self) -> Shape {
    match self {
      Self::Latest => Shape::Latest,
      Self::Series(_) => Shape::Series,
    }
  }

  /// Whether a stored entry can answer this request without a fetch.
  fn satisfied_by(self, entry: &Entry) -> bool {
    match (self, entry) {
      (Self::Latest, Entry::Latest(_)) => true,
      (Self::Series(wanted), Entry::Series { window, .. }) => window.covers(wanted),
      _ => false,
    }
  }

  /// Trim a stored entry down to what was asked for.
  fn fit(self, entry: Entry) -> Entry {
    match (self, entry) {
      (Self::Series(wanted), Entry::Series { series, .. }) => {
        Entry::Series { window: wanted, series: series.clipped(wanted) }
      }
      (_, entry) => entry,
    }
  }

  /// Whether a fetch already running for `running` will answer this
  /// request too.
  fn served_by(self, running: Request) -> bool {
    match (self, running) {
      (Self::Latest, Self::Latest) => true,
      (Self::Series(wanted), Self::Series(window)) => window.covers(wanted),
      _ => false,
    }
  }

  fn no_data(self, country_code: &'static str, indicator: Indicator) -> Entry {
    match self {
      Self::Latest => Entry::Latest(ObservedValue::missing(country_code, indicator)),
      Self::Series(window) => {
        Entry::Series { window, series: TimeSeries::empty(country_code, indicator) }
      }
    }
  }
}

// ─── State ───────────────────────────────────────────────────────────────────

type Pending = Shared<BoxFuture<'static, Option<Entry>>>;

struct InFlight {
  fetch_id: u64,
  request:  Request,
  pending:  Pending,
}

#[derive(Default)]
struct State {
  provenance: Provenance,
  entries:    HashMap<Key, Entry>,
  in_flight:  HashMap<Key, InFlight>,
  next_fetch: u64,
}

struct Inner<S> {
  source: S,
  state:  Mutex<State>,
}

impl<S> Inner<S> {
  fn lock(&self) -> MutexGuard<'_, State> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Store the outcome of fetch `fetch_id`, but only for keys it still owns.
  /// A key is lost when a newer fetch replaced it or custom data was loaded.
  fn complete(
    &self,
    fetch_id: u64,
    countries: &[&'static Country],
    indicator: Indicator,
    shape: Shape,
    outcome: &HashMap<&'static str, Entry>,
  ) {
    let mut state = self.lock();
    for country in countries {
      let key = Key::new(country.iso_alpha2_code, indicator, shape);
      let owned = state
        .in_flight
        .get(&key)
        .is_some_and(|f| f.fetch_id == fetch_id);
      if !owned {
        tracing::debug!(
          country = country.iso_alpha2_code,
          indicator = indicator.key(),
          fetch_id,
          "discarding superseded fetch result"
        );
        continue;
      }
      state.in_flight.remove(&key);
      if state.provenance != Provenance::Live {
        continue;
      }
      if let Some(entry) = outcome.get(country.iso_alpha2_code) {
        state.entries.insert(key, entry.clone());
      }
    }
  }
}

// ─── Cache ───────────────────────────────────────────────────────────────────

/// Shared cache of indicator values. Cheap to clone; clones share state.
///
/// At most one fetch per key is in flight at any time: concurrent readers of
/// a missing key wait on the same request. Readers never block each other on
/// a fetch, only on the short critical sections that touch the maps.
pub struct DataCache<S> {
  inner: Arc<Inner<S>>,
}

impl<S> Clone for DataCache<S> {
  fn clone(&self) -> Self { Self { inner: Arc::clone(&self.inner) } }
}

impl<S> DataCache<S> {
  pub fn source(&self) -> &S { &self.inner.source }

  pub fn provenance(&self) -> Provenance { self.inner.lock().provenance }

  /// Number of stored entries.
  pub fn len(&self) -> usize { self.inner.lock().entries.len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  /// Read a stored entry without fetching.
  pub fn peek(&self, country_code: &str, indicator: Indicator, shape: Shape) -> Option<Entry> {
    let country = country::by_code(country_code)?;
    self
      .inner
      .lock()
      .entries
      .get(&Key::new(country.iso_alpha2_code, indicator, shape))
      .cloned()
  }

  /// Store a fetched value directly. Rejected once custom data is loaded.
  pub fn put_live(&self, entry: Entry) -> Result<()> {
    let mut state = self.inner.lock();
    if state.provenance != Provenance::Live {
      return Err(Error::NotLive);
    }
    let key = entry.key();
    state.in_flight.remove(&key);
    state.entries.insert(key, entry);
    Ok(())
  }

  /// Replace the whole cache with a user-supplied dataset.
  ///
  /// The document is an object of country name (or code) to an object of
  /// indicator name to a number, `null`, or `{"years": [..], "values": [..]}`.
  /// On error nothing changes. On success the cache becomes
  /// [`Provenance::Custom`] for good, pending fetches are disowned, and the
  /// number of stored entries is returned.
  pub fn load_custom(&self, document: &Value) -> Result<usize> {
    let entries = custom::parse_document(document)?;
    let count = entries.len();

    let mut state = self.inner.lock();
    let disowned = state.in_flight.len();
    state.entries = entries;
    state.in_flight.clear();
    state.provenance = Provenance::Custom;
    tracing::info!(entries = count, disowned, "custom data loaded");
    Ok(count)
  }

  /// [`load_custom`](Self::load_custom) from JSON text.
  pub fn load_custom_str(&self, text: &str) -> Result<usize> {
    let document: Value = serde_json::from_str(text)
      .map_err(|e| Error::InvalidFormat(format!("invalid JSON: {e}")))?;
    self.load_custom(&document)
  }

  /// Overwrite one country's latest value. Only allowed on custom data.
  ///
  /// When the pair also has a custom history, the edit lands on the latest
  /// value's year in that history (its last year if the value had none), so
  /// the map and the chart agree.
  pub fn edit(
    &self,
    country_code: &str,
    indicator: Indicator,
    value: f64,
  ) -> Result<ObservedValue> {
    if !value.is_finite() {
      return Err(Error::InvalidValue(value.to_string()));
    }
    let country = country::resolve(country_code)?;
    let key = Key::new(country.iso_alpha2_code, indicator, Shape::Latest);
    let series_key = Key::new(country.iso_alpha2_code, indicator, Shape::Series);

    let mut state = self.inner.lock();
    if state.provenance != Provenance::Custom {
      return Err(Error::NotCustom);
    }
    let mut year = state
      .entries
      .get(&key)
      .and_then(Entry::as_latest)
      .and_then(|v| v.year);
    if let Some(Entry::Series { window, series }) = state.entries.get_mut(&series_key) {
      if let Some(target) = year.or_else(|| series.span().map(|span| span.end())) {
        series.set(target, Some(value));
        *window = YearRange::new(window.start().min(target), window.end().max(target))?;
        year = Some(target);
      }
    }
    let edited = ObservedValue {
      country_code: country.iso_alpha2_code,
      indicator,
      year,
      value: Some(value),
    };
    state.entries.insert(key, Entry::Latest(edited.clone()));
    tracing::debug!(
      country = country.iso_alpha2_code,
      indicator = indicator.key(),
      value,
      "value edited"
    );
    Ok(edited)
  }

  /// [`edit`](Self::edit) with unparsed user input.
  pub fn edit_str(
    &self,
    country_code: &str,
    indicator: Indicator,
    raw: &str,
  ) -> Result<ObservedValue> {
    let value: f64 = raw
      .trim()
      .parse()
      .map_err(|_| Error::InvalidValue(raw.to_string()))?;
    if !value.is_finite() {
      return Err(Error::InvalidValue(raw.to_string()));
    }
    self.edit(country_code, indicator, value)
  }

  /// Overwrite one year of a country's history. Only allowed on custom data.
  /// The latest value is derived again from the edited history.
  pub fn edit_point(
    &self,
    country_code: &str,
    indicator: Indicator,
    year: i32,
    value: f64,
  ) -> Result<TimeSeries> {
    if !value.is_finite() {
      return Err(Error::InvalidValue(value.to_string()));
    }
    let country = country::resolve(country_code)?;
    let key = Key::new(country.iso_alpha2_code, indicator, Shape::Series);

    let mut state = self.inner.lock();
    if state.provenance != Provenance::Custom {
      return Err(Error::NotCustom);
    }
    let (window, mut series) = match state.entries.remove(&key) {
      Some(Entry::Series { window, series }) => (window, series),
      _ => (
        YearRange::single(year),
        TimeSeries::empty(country.iso_alpha2_code, indicator),
      ),
    };
    series.set(year, Some(value));
    let window = YearRange::new(window.start().min(year), window.end().max(year))?;
    state
      .entries
      .insert(key, Entry::Series { window, series: series.clone() });
    let latest = Entry::Latest(series.latest());
    state.entries.insert(latest.key(), latest);
    Ok(series)
  }
}

impl<S: IndicatorSource + 'static> DataCache<S> {
  pub fn new(source: S) -> Self {
    Self {
      inner: Arc::new(Inner { source, state: Mutex::new(State::default()) }),
    }
  }

  /// Latest value of one country, fetching on a miss.
  pub async fn latest(&self, country: &'static Country, indicator: Indicator) -> ObservedValue {
    self
      .latest_many(&[country], indicator)
      .await
      .pop()
      .unwrap_or_else(|| ObservedValue::missing(country.iso_alpha2_code, indicator))
  }

  /// Latest values for several countries, in the given order. All misses
  /// are fetched in a single batch request.
  pub async fn latest_many(
    &self,
    countries: &[&'static Country],
    indicator: Indicator,
  ) -> Vec<ObservedValue> {
    self.latest_values(countries, indicator, false).await
  }

  /// Fetch latest values again even if they are cached. The result replaces
  /// the stored values, and a newer refetch of the same key wins over an
  /// older one. Does nothing but read the cache once custom data is loaded.
  pub async fn refetch(
    &self,
    countries: &[&'static Country],
    indicator: Indicator,
  ) -> Vec<ObservedValue> {
    self.latest_values(countries, indicator, true).await
  }

  async fn latest_values(
    &self,
    countries: &[&'static Country],
    indicator: Indicator,
    force: bool,
  ) -> Vec<ObservedValue> {
    self
      .resolve(countries, indicator, Request::Latest, force)
      .await
      .into_iter()
      .zip(countries)
      .map(|(entry, country)| match entry {
        Some(Entry::Latest(v)) => v,
        _ => ObservedValue::missing(country.iso_alpha2_code, indicator),
      })
      .collect()
  }

  /// History of one country over `years`, fetching on a miss.
  pub async fn series(
    &self,
    country: &'static Country,
    indicator: Indicator,
    years: YearRange,
  ) -> TimeSeries {
    self
      .series_many(&[country], indicator, years)
      .await
      .pop()
      .unwrap_or_else(|| TimeSeries::empty(country.iso_alpha2_code, indicator))
  }

  /// Histories of several countries, in the given order, clipped to `years`.
  pub async fn series_many(
    &self,
    countries: &[&'static Country],
    indicator: Indicator,
    years: YearRange,
  ) -> Vec<TimeSeries> {
    self
      .resolve(countries, indicator, Request::Series(years), false)
      .await
      .into_iter()
      .zip(countries)
      .map(|(entry, country)| match entry {
        Some(Entry::Series { series, .. }) => series,
        _ => TimeSeries::empty(country.iso_alpha2_code, indicator),
      })
      .collect()
  }

  async fn resolve(
    &self,
    countries: &[&'static Country],
    indicator: Indicator,
    request: Request,
    force: bool,
  ) -> Vec<Option<Entry>> {
    let shape = request.shape();
    let mut out: Vec<Option<Entry>> = vec![None; countries.len()];
    let mut waiting: Vec<(usize, Pending)> = Vec::new();

    {
      let mut state = self.inner.lock();
      let mut missing: Vec<&'static Country> = Vec::new();

      for (i, &country) in countries.iter().enumerate() {
        let key = Key::new(country.iso_alpha2_code, indicator, shape);
        if state.provenance == Provenance::Custom {
          out[i] = state.entries.get(&key).cloned();
          continue;
        }
        if !force {
          if let Some(entry) = state.entries.get(&key).filter(|e| request.satisfied_by(e)) {
            out[i] = Some(entry.clone());
            continue;
          }
          // A running fetch for a narrower window is not joined; the new
          // fetch takes the key over and the older result is discarded.
          if let Some(flight) = state
            .in_flight
            .get(&key)
            .filter(|f| request.served_by(f.request))
          {
            waiting.push((i, flight.pending.clone()));
            continue;
          }
        }
        if !missing.contains(&country) {
          missing.push(country);
        }
      }

      if !missing.is_empty() {
        let fetch_id = state.next_fetch;
        state.next_fetch += 1;
        tracing::debug!(
          indicator = indicator.key(),
          countries = missing.len(),
          fetch_id,
          force,
          "cache miss"
        );

        let batch = self.spawn_fetch(fetch_id, missing.clone(), indicator, request);
        for country in missing {
          let code = country.iso_alpha2_code;
          let pending: Pending = batch
            .clone()
            .map(move |outcome| outcome.get(code).cloned())
            .boxed()
            .shared();
          state.in_flight.insert(
            Key::new(code, indicator, shape),
            InFlight { fetch_id, request, pending: pending.clone() },
          );
          for (i, c) in countries.iter().enumerate() {
            if c.iso_alpha2_code == code {
              waiting.push((i, pending.clone()));
            }
          }
        }
      }
    }

    if waiting.is_empty() {
      return fit_all(out, request);
    }

    let (slots, pending): (Vec<usize>, Vec<Pending>) = waiting.into_iter().unzip();
    let results = join_all(pending).await;

    // A dataset loaded while we waited replaces whatever the fetch produced.
    let state = self.inner.lock();
    let custom = state.provenance == Provenance::Custom;
    for (i, result) in slots.into_iter().zip(results) {
      out[i] = if custom {
        let key = Key::new(countries[i].iso_alpha2_code, indicator, shape);
        state.entries.get(&key).cloned()
      } else {
        result
      };
    }
    drop(state);

    fit_all(out, request)
  }

  /// Run one provider request on the runtime and share its outcome. The
  /// fetch keeps running if every waiter goes away, so its result still
  /// lands in the cache.
  fn spawn_fetch(
    &self,
    fetch_id: u64,
    countries: Vec<&'static Country>,
    indicator: Indicator,
    request: Request,
  ) -> Shared<BoxFuture<'static, Arc<HashMap<&'static str, Entry>>>> {
    let inner = Arc::clone(&self.inner);
    let task = tokio::spawn(async move {
      let fetched: Result<HashMap<&'static str, Entry>, FetchError> = match request {
        Request::Latest => inner
          .source
          .latest(&countries, indicator)
          .await
          .map(|found| found.into_iter().map(|(c, v)| (c, Entry::Latest(v))).collect()),
        Request::Series(window) => inner
          .source
          .series(&countries, indicator, window)
          .await
          .map(|found| {
            found
              .into_iter()
              .map(|(c, series)| (c, Entry::Series { window, series }))
              .collect()
          }),
      };

      let outcome = match fetched {
        Ok(mut found) => {
          for country in &countries {
            found
              .entry(country.iso_alpha2_code)
              .or_insert_with(|| request.no_data(country.iso_alpha2_code, indicator));
          }
          found
        }
        Err(e) if e.is_definitive() => countries
          .iter()
          .map(|c| (c.iso_alpha2_code, request.no_data(c.iso_alpha2_code, indicator)))
          .collect(),
        Err(e) => {
          tracing::warn!(indicator = indicator.key(), error = %e, fetch_id, "fetch failed; not cached");
          HashMap::new()
        }
      };

      inner.complete(fetch_id, &countries, indicator, request.shape(), &outcome);
      Arc::new(outcome)
    });

    task
      .map(|joined| {
        joined.unwrap_or_else(|e| {
          tracing::error!(error = %e, "fetch task did not complete");
          Arc::default()
        })
      })
      .boxed()
      .shared()
  }
}

fn fit_all(entries: Vec<Option<Entry>>, request: Request) -> Vec<Option<Entry>> {
  entries
    .into_iter()
    .map(|e| e.map(|e| request.fit(e)))
    .collect()
}
