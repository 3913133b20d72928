//! Handlers for `/geography` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/geography/regions` | Ordered by `sort_order` |
//! | `GET`  | `/geography/regions/:id` | 404 if not found |

use axum::{
  Json,
  extract::{Path, State},
};
use serde::Serialize;
use tallyroom_core::{
  store::ElectionStore,
  view::{RegionDetail, RegionSummary},
};

use crate::{ApiState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct RegionList {
  pub regions: Vec<RegionSummary>,
}

/// `GET /geography/regions`
pub async fn list<S>(State(state): State<ApiState<S>>) -> Result<Json<RegionList>, ApiError>
where
  S: ElectionStore + 'static,
{
  let regions = state.store.list_regions().await.map_err(ApiError::store)?;
  Ok(Json(RegionList { regions }))
}

/// `GET /geography/regions/:id`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<i64>,
) -> Result<Json<RegionDetail>, ApiError>
where
  S: ElectionStore + 'static,
{
  state
    .store
    .get_region(id)
    .await
    .map_err(ApiError::store)?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound("Region not found".into()))
}
