//! Handlers for upload and upload-log endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/upload?filename=` | Raw UTF-8 body; 201, or 500 if the attempt failed |
//! | `POST`   | `/upload/stream?filename=` | SSE: `created`, `progress`, `complete` / `error` |
//! | `GET`    | `/uploads` | `?page&page_size&status&search` |
//! | `GET`    | `/uploads/stats` | |
//! | `DELETE` | `/uploads/:id` | 404 if absent or already deleted |
//! | `DELETE` | `/uploads/:id/stream` | SSE: `started`, `progress`, `complete` / `error` |

use axum::{
  Json,
  body::Body,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use http_body_util::LengthLimitError;
use serde::Deserialize;
use serde_json::{Value, json};
use tallyroom_core::{
  event::{DeleteEvent, IngestEvent, UploadOutcome},
  store::{ElectionStore, MAX_UPLOAD_PAGE_SIZE, UploadQuery},
  upload::{UploadStats, UploadStatus},
  view::UploadPage,
};

use crate::{ApiState, error::ApiError, sse};

const FAILURE_DETAIL: &str = "File processing failed due to a database error";

/// Whether a body error, or anything in its source chain, is the length cap.
fn exceeded_limit(err: &(dyn std::error::Error + 'static)) -> bool {
  let mut current = Some(err);
  while let Some(e) = current {
    if e.is::<LengthLimitError>() {
      return true;
    }
    current = e.source();
  }
  false
}

/// Collect and validate an upload body.
async fn read_document(body: Body, limit: usize) -> Result<String, ApiError> {
  let bytes = axum::body::to_bytes(body, limit).await.map_err(|e| {
    let inner = e.into_inner();
    if exceeded_limit(&*inner) {
      ApiError::PayloadTooLarge(limit)
    } else {
      tracing::debug!(error = %inner, "upload body could not be read");
      ApiError::BadRequest("Could not read request body".into())
    }
  })?;
  let text = String::from_utf8(bytes.to_vec())
    .map_err(|_| ApiError::BadRequest("File must be UTF-8 encoded text".into()))?;
  if text.trim().is_empty() {
    return Err(ApiError::BadRequest("File is empty".into()));
  }
  Ok(text)
}

#[derive(Debug, Deserialize)]
pub struct UploadParams {
  pub filename: Option<String>,
}

// ─── Upload ───────────────────────────────────────────────────────────────────

/// `POST /upload?filename=<name>`
pub async fn upload<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<UploadParams>,
  body: Body,
) -> Result<impl IntoResponse, ApiError>
where
  S: ElectionStore + 'static,
{
  let text = read_document(body, state.options.max_upload_bytes).await?;
  let log = state
    .store
    .ingest(text, params.filename)
    .await
    .map_err(ApiError::store)?;

  if log.status == UploadStatus::Failed {
    return Err(ApiError::Internal(FAILURE_DETAIL.into()));
  }
  Ok((StatusCode::CREATED, Json(UploadOutcome::from(&log))))
}

/// `POST /upload/stream?filename=<name>`
///
/// Validation failures are ordinary JSON errors; once the stream starts the
/// outcome is carried by its terminal event.
pub async fn upload_stream<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<UploadParams>,
  body: Body,
) -> Result<impl IntoResponse, ApiError>
where
  S: ElectionStore + 'static,
{
  let text = read_document(body, state.options.max_upload_bytes).await?;
  let (tx, response) = sse::channel::<IngestEvent>();

  let store = state.store.clone();
  let batch_size = state.options.batch_size;
  tokio::spawn(async move {
    let outcome = store
      .ingest_streaming(text, params.filename, batch_size, move |event| {
        // The client may have gone away; the ingestion still runs to the end.
        let _ = tx.send(event);
      })
      .await;
    if let Err(e) = outcome {
      tracing::error!(error = %e, "streamed upload could not be recorded");
    }
  });

  Ok(response)
}

// ─── Upload log ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub page:      Option<usize>,
  pub page_size: Option<usize>,
  pub status:    Option<UploadStatus>,
  pub search:    Option<String>,
}

/// `GET /uploads`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<UploadPage>, ApiError>
where
  S: ElectionStore + 'static,
{
  let defaults = UploadQuery::default();
  let query = UploadQuery {
    status:    params.status,
    search:    params.search.filter(|s| !s.is_empty()),
    page:      params.page.unwrap_or(defaults.page),
    page_size: params.page_size.unwrap_or(defaults.page_size),
  };
  if query.page == 0 {
    return Err(ApiError::BadRequest("page must be at least 1".into()));
  }
  if !(1..=MAX_UPLOAD_PAGE_SIZE).contains(&query.page_size) {
    return Err(ApiError::BadRequest(format!(
      "page_size must be between 1 and {MAX_UPLOAD_PAGE_SIZE}"
    )));
  }

  let page = state
    .store
    .list_uploads(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(page))
}

/// `GET /uploads/stats`
pub async fn stats<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<UploadStats>, ApiError>
where
  S: ElectionStore + 'static,
{
  let stats = state.store.upload_stats().await.map_err(ApiError::store)?;
  Ok(Json(stats))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /uploads/:id`
pub async fn delete_one<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError>
where
  S: ElectionStore + 'static,
{
  state
    .store
    .soft_delete(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("Upload not found".into()))?;
  Ok(Json(json!({ "message": "Upload deleted" })))
}

/// `DELETE /uploads/:id/stream`
pub async fn delete_stream<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ElectionStore + 'static,
{
  let live = state
    .store
    .get_upload(id)
    .await
    .map_err(ApiError::store)?
    .is_some_and(|log| !log.is_deleted());
  if !live {
    return Err(ApiError::NotFound("Upload not found".into()));
  }

  let (tx, response) = sse::channel::<DeleteEvent>();
  let store = state.store.clone();
  let batch_size = state.options.batch_size;
  tokio::spawn(async move {
    let outcome = store
      .soft_delete_streaming(id, batch_size, move |event| {
        let _ = tx.send(event);
      })
      .await;
    if let Err(e) = outcome {
      tracing::error!(upload_id = id, error = %e, "streamed delete failed");
    }
  });

  Ok(response)
}
