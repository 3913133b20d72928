//! JSON REST API for Tallyroom.
//!
//! Exposes an axum [`Router`] backed by any
//! [`tallyroom_core::store::ElectionStore`]. TLS and transport concerns are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tallyroom_api::api_router(store.clone(), ApiOptions::default()))
//! ```

pub mod constituencies;
pub mod error;
pub mod geography;
pub mod totals;
pub mod uploads;

mod sse;

use std::sync::Arc;

use axum::{
  Json, Router,
  routing::{delete, get, post},
};
use serde_json::{Value, json};
use tallyroom_core::{event::DEFAULT_BATCH_SIZE, store::ElectionStore};

pub use error::ApiError;

/// Default request body limit for uploads: 100 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Tunables for the upload endpoints.
#[derive(Debug, Clone, Copy)]
pub struct ApiOptions {
  pub max_upload_bytes: usize,
  /// Records (or affected results) between streamed progress events.
  pub batch_size:       usize,
}

impl Default for ApiOptions {
  fn default() -> Self {
    Self {
      max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
      batch_size:       DEFAULT_BATCH_SIZE,
    }
  }
}

/// Shared state threaded through all axum handlers.
pub struct ApiState<S> {
  pub store:   Arc<S>,
  pub options: ApiOptions,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), options: self.options }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, options: ApiOptions) -> Router<()>
where
  S: ElectionStore + 'static,
{
  Router::new()
    .route("/health", get(health))
    // Uploads
    .route("/upload", post(uploads::upload::<S>))
    .route("/upload/stream", post(uploads::upload_stream::<S>))
    .route("/uploads", get(uploads::list::<S>))
    .route("/uploads/stats", get(uploads::stats::<S>))
    .route("/uploads/{id}", delete(uploads::delete_one::<S>))
    .route("/uploads/{id}/stream", delete(uploads::delete_stream::<S>))
    // Constituencies
    .route("/constituencies", get(constituencies::list::<S>))
    .route("/constituencies/summary", get(constituencies::summary::<S>))
    .route("/constituencies/{id}", get(constituencies::get_one::<S>))
    // Totals
    .route("/totals", get(totals::handler::<S>))
    // Geography
    .route("/geography/regions", get(geography::list::<S>))
    .route("/geography/regions/{id}", get(geography::get_one::<S>))
    .with_state(ApiState { store, options })
}

/// `GET /health`
async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }
