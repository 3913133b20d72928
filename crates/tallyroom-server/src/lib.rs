//! HTTP server wiring for Tallyroom.
//!
//! Mounts the JSON API under `/api` with request tracing, and seeds the
//! constituency register from a gazetteer file on first start.

pub mod gazetteer;

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use serde::Deserialize;
use tallyroom_api::{ApiOptions, DEFAULT_MAX_UPLOAD_BYTES, api_router};
use tallyroom_core::{event::DEFAULT_BATCH_SIZE, store::ElectionStore};
use tower_http::trace::TraceLayer;

pub use gazetteer::{Gazetteer, seed_gazetteer};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `TALLYROOM_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  #[serde(default = "default_store_path")]
  pub store_path:       PathBuf,
  /// JSON gazetteer loaded into an empty store at startup.
  #[serde(default)]
  pub gazetteer_path:   Option<PathBuf>,
  #[serde(default = "default_max_upload_bytes")]
  pub max_upload_bytes: usize,
  #[serde(default = "default_batch_size")]
  pub batch_size:       usize,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8000 }
fn default_store_path() -> PathBuf { PathBuf::from("tallyroom.db") }
fn default_max_upload_bytes() -> usize { DEFAULT_MAX_UPLOAD_BYTES }
fn default_batch_size() -> usize { DEFAULT_BATCH_SIZE }

impl ServerConfig {
  pub fn api_options(&self) -> ApiOptions {
    ApiOptions {
      max_upload_bytes: self.max_upload_bytes,
      batch_size:       self.batch_size.max(1),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the application [`Router`]: the API nested under `/api`.
pub fn router<S>(store: Arc<S>, config: &ServerConfig) -> Router
where
  S: ElectionStore + 'static,
{
  Router::new()
    .nest("/api", api_router(store, config.api_options()))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use tallyroom_core::store::ElectionStore;
  use tallyroom_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  const GAZETTEER: &str = r#"{
    "region_order": ["North East", "London"],
    "regions": {
      "London": [
        { "name": "Bermondsey and Old Southwark", "pcon24_code": "E14001084" },
        { "name": "Hackney South and Shoreditch", "pcon24_code": "E14001262" }
      ],
      "North East": [
        { "name": "Blyth and Ashington", "pcon24_code": "E14001113" }
      ],
      "Wales": [
        { "name": "Ynys Môn", "pcon24_code": "W07000112" }
      ]
    }
  }"#;

  fn config_from(toml: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn config_fills_defaults() {
    let cfg = config_from(r#"store_path = "/tmp/results.db""#);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 8000);
    assert_eq!(cfg.store_path, PathBuf::from("/tmp/results.db"));
    assert!(cfg.gazetteer_path.is_none());
    assert_eq!(cfg.max_upload_bytes, 100 * 1024 * 1024);
    assert_eq!(cfg.batch_size, 10);
  }

  #[test]
  fn config_overrides() {
    let cfg = config_from(
      r#"
      port = 9000
      batch_size = 0
      gazetteer_path = "gazetteer.json"
      "#,
    );
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.gazetteer_path, Some(PathBuf::from("gazetteer.json")));
    assert_eq!(cfg.api_options().batch_size, 1);
  }

  #[tokio::test]
  async fn seeds_regions_and_constituencies_once() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let gazetteer = Gazetteer::from_json(GAZETTEER).unwrap();

    assert_eq!(seed_gazetteer(&store, &gazetteer).await.unwrap(), 4);
    assert_eq!(seed_gazetteer(&store, &gazetteer).await.unwrap(), 0);

    let regions = store.list_regions().await.unwrap();
    let names: Vec<&str> = regions.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["North East", "London", "Wales"]);
    assert_eq!(regions[1].constituency_count, 2);

    let rows = store.list_constituency_rows().await.unwrap();
    assert_eq!(rows.len(), 4);
    let ynys = rows.iter().find(|c| c.name == "Ynys Môn").unwrap();
    assert_eq!(ynys.pcon24_code.as_deref(), Some("W07000112"));
    assert_eq!(ynys.region_id, Some(regions[2].region_id));
  }

  #[tokio::test]
  async fn failed_seed_leaves_store_empty_and_retries() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    // Same name under two regions trips the unique constraint partway through.
    let clashing = Gazetteer::from_json(
      r#"{
        "region_order": ["London", "Wales"],
        "regions": {
          "London": [{ "name": "Bermondsey and Old Southwark" }],
          "Wales":  [{ "name": "Bermondsey and Old Southwark" }]
        }
      }"#,
    )
    .unwrap();

    assert!(seed_gazetteer(&store, &clashing).await.is_err());
    assert!(store.list_constituency_rows().await.unwrap().is_empty());
    assert!(store.list_regions().await.unwrap().is_empty());

    let gazetteer = Gazetteer::from_json(GAZETTEER).unwrap();
    assert_eq!(seed_gazetteer(&store, &gazetteer).await.unwrap(), 4);
  }

  #[tokio::test]
  async fn api_is_nested_under_prefix() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let app = router(store, &config_from(""));

    let req = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
