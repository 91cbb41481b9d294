//! HTTP server for the EU indicator map.
//!
//! Serves the browser client from a public directory, the JSON API under
//! `/api`, and a same-origin pass-through to the World Bank API under
//! `/api/worldbank/{country}/{indicator}`.

pub mod error;
pub mod proxy;
pub mod statics;

pub use error::Error;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{Router, routing::get};
use eumap_cache::DataCache;
use eumap_view::ViewSynchronizer;
use eumap_worldbank::{ClientConfig, WorldBankClient};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `EUMAP_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub public_dir: PathBuf,
  pub worldbank:  ClientConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_string(),
      port:       3000,
      public_dir: PathBuf::from("public"),
      worldbank:  ClientConfig::default(),
    }
  }
}

/// Prefix of the environment variables that override the file.
pub const ENV_PREFIX: &str = "EUMAP";

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// Read `path` (optional) and overlay `EUMAP_*` environment variables.
  /// Nested keys use `__`, e.g. `EUMAP_WORLDBANK__TIMEOUT_SECS`.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    Self::load_with_env(path, None)
  }

  /// [`load`](Self::load) with an explicit environment instead of the
  /// process one.
  pub fn load_with_env(
    path: &Path,
    env: Option<config::Map<String, String>>,
  ) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix(ENV_PREFIX)
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true)
          .source(env),
      )
      .build()?
      .try_deserialize()
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through the static and proxy handlers.
#[derive(Clone)]
pub struct AppState {
  pub client:     WorldBankClient,
  pub view:       Arc<ViewSynchronizer<WorldBankClient>>,
  pub public_dir: Arc<PathBuf>,
}

impl AppState {
  /// Build the provider client and a view synchronizer on top of a fresh
  /// cache.
  pub fn new(config: &ServerConfig) -> eumap_worldbank::Result<Self> {
    let client = WorldBankClient::new(config.worldbank.clone())?;
    let view = ViewSynchronizer::new(DataCache::new(client.clone()));
    Ok(Self {
      client,
      view: Arc::new(view),
      public_dir: Arc::new(config.public_dir.clone()),
    })
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router(state: AppState) -> Router {
  let api = eumap_api::api_router(state.view.clone()).merge(
    Router::new()
      .route("/worldbank/{country}/{indicator}", get(proxy::forward))
      .with_state(state.clone()),
  );

  Router::new()
    .fallback(statics::serve)
    .with_state(state)
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use std::{collections::HashMap, path::Path};

  use axum::{
    body::Body,
    extract::Query,
    http::{Request, StatusCode, header},
    response::IntoResponse,
  };
  use tower::ServiceExt as _;

  use super::*;

  /// A throwaway public directory with an index, a script and a subfolder.
  fn public_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
      .join(format!("eumap-server-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(dir.join("data")).unwrap();
    std::fs::write(dir.join("index.html"), "<html>map</html>").unwrap();
    std::fs::write(dir.join("app.js"), "console.log(1)").unwrap();
    dir
  }

  fn state(public: &Path, base_url: String) -> AppState {
    AppState::new(&ServerConfig {
      public_dir: public.to_path_buf(),
      worldbank: ClientConfig { base_url, timeout_secs: 5, ..Default::default() },
      ..Default::default()
    })
    .unwrap()
  }

  async fn get_path(state: AppState, uri: &str) -> (StatusCode, Option<String>, String) {
    let resp = router(state)
      .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
      .await
      .unwrap();
    let status = resp.status();
    let content_type = resp
      .headers()
      .get(header::CONTENT_TYPE)
      .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8_lossy(&bytes).into_owned())
  }

  async fn upstream(
    axum::extract::Path((country, indicator)): axum::extract::Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
  ) -> impl IntoResponse {
    assert_eq!(params.get("format").map(String::as_str), Some("json"));
    assert_eq!(params.get("date").map(String::as_str), Some("2020"));
    match country.as_str() {
      "AT" => (StatusCode::OK, format!(r#"[{{"page":1}},[{{"indicator":"{indicator}"}}]]"#)),
      _ => (StatusCode::BAD_REQUEST, "bad country".to_string()),
    }
  }

  async fn serve_upstream() -> String {
    let app = Router::new().route("/country/{country}/indicator/{indicator}", get(upstream));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
  }

  fn env(vars: &[(&str, &str)]) -> Option<config::Map<String, String>> {
    Some(vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
  }

  #[test]
  fn environment_overrides_defaults() {
    let missing = std::env::temp_dir().join("eumap-server-no-such-config.toml");
    let cfg = ServerConfig::load_with_env(
      &missing,
      env(&[("EUMAP_PORT", "8080"), ("EUMAP_WORLDBANK__TIMEOUT_SECS", "10")]),
    )
    .unwrap();
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.worldbank.timeout_secs, 10);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.worldbank.proxy_year, 2020);
  }

  #[test]
  fn environment_wins_over_file() {
    let dir = public_dir("config");
    let path = dir.join("config.toml");
    std::fs::write(&path, "port = 4000\npublic_dir = \"site\"\n").unwrap();

    let cfg = ServerConfig::load_with_env(&path, env(&[])).unwrap();
    assert_eq!(cfg.port, 4000);
    assert_eq!(cfg.public_dir, PathBuf::from("site"));

    let cfg = ServerConfig::load_with_env(&path, env(&[("EUMAP_PORT", "8080")])).unwrap();
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.public_dir, PathBuf::from("site"));
  }

  #[tokio::test]
  async fn root_serves_index_html() {
    let dir = public_dir("index");
    let (status, content_type, body) =
      get_path(state(&dir, "http://127.0.0.1:1".into()), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/html"));
    assert_eq!(body, "<html>map</html>");
  }

  #[tokio::test]
  async fn query_string_is_ignored_and_mime_follows_extension() {
    let dir = public_dir("mime");
    let (status, content_type, body) =
      get_path(state(&dir, "http://127.0.0.1:1".into()), "/app.js?v=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/javascript"));
    assert_eq!(body, "console.log(1)");
  }

  #[tokio::test]
  async fn missing_file_is_404_html() {
    let dir = public_dir("missing");
    let (status, content_type, body) =
      get_path(state(&dir, "http://127.0.0.1:1".into()), "/nope.css").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(content_type.as_deref(), Some("text/html"));
    assert_eq!(body, "<h1>404 Not Found</h1>");
  }

  #[tokio::test]
  async fn escaping_the_public_dir_is_forbidden() {
    let dir = public_dir("escape");
    let (status, _, body) =
      get_path(state(&dir, "http://127.0.0.1:1".into()), "/../Cargo.toml").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, "Access Denied");
  }

  #[tokio::test]
  async fn directory_read_is_server_error() {
    let dir = public_dir("dir");
    let (status, _, body) =
      get_path(state(&dir, "http://127.0.0.1:1".into()), "/data").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with("Server Error: "));
  }

  #[tokio::test]
  async fn api_is_mounted_under_api() {
    let dir = public_dir("api");
    let (status, content_type, body) =
      get_path(state(&dir, "http://127.0.0.1:1".into()), "/api/countries").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let countries: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(countries.as_array().unwrap().len(), 27);
  }

  #[tokio::test]
  async fn proxy_forwards_upstream_answer_with_cors() {
    let dir = public_dir("proxy");
    let app = router(state(&dir, serve_upstream().await));
    let resp = app
      .oneshot(
        Request::builder()
          .uri("/api/worldbank/AT/NY.GDP.MKTP.CD")
          .body(Body::empty())
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body[1][0]["indicator"], "NY.GDP.MKTP.CD");
  }

  #[tokio::test]
  async fn proxy_keeps_upstream_status() {
    let dir = public_dir("proxy-status");
    let (status, content_type, body) =
      get_path(state(&dir, serve_upstream().await), "/api/worldbank/XX/SP.POP.TOTL").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body, "bad country");
  }

  #[tokio::test]
  async fn unreachable_upstream_is_server_error() {
    let dir = public_dir("proxy-down");
    let (status, _, body) = get_path(
      state(&dir, "http://127.0.0.1:1".into()),
      "/api/worldbank/AT/SP.POP.TOTL",
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Server Error");
  }
}
