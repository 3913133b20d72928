//! Handler for `GET /totals`.

use axum::{Json, extract::State};
use tallyroom_core::{store::ElectionStore, view::NationalTotals};

use crate::{ApiState, error::ApiError};

/// `GET /totals`: votes and seats per party.
pub async fn handler<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<NationalTotals>, ApiError>
where
  S: ElectionStore + 'static,
{
  let totals = state.store.totals().await.map_err(ApiError::store)?;
  Ok(Json(totals))
}
