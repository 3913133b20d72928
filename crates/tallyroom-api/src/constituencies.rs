//! Handlers for `/constituencies` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/constituencies` | `?search&region_ids=1,2&page&page_size&sort_by&sort_dir` |
//! | `GET`  | `/constituencies/summary` | Every constituency with its winner |
//! | `GET`  | `/constituencies/:id` | 404 if not found |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;
use tallyroom_core::{
  store::{ConstituencyQuery, ElectionStore, MAX_CONSTITUENCY_PAGE_SIZE, SortBy, SortDir},
  view::{ConstituencyDetail, ConstituencyPage, ConstituencySummary},
};

use crate::{ApiState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub search:     Option<String>,
  /// Comma-separated region ids.
  pub region_ids: Option<String>,
  pub page:       Option<usize>,
  pub page_size:  Option<usize>,
  pub sort_by:    Option<SortBy>,
  pub sort_dir:   Option<SortDir>,
}

fn parse_region_ids(raw: Option<&str>) -> Result<Vec<i64>, ApiError> {
  let Some(raw) = raw else { return Ok(Vec::new()) };
  raw
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(|s| {
      s.parse::<i64>()
        .map_err(|_| ApiError::BadRequest(format!("invalid region id: {s:?}")))
    })
    .collect()
}

impl ListParams {
  fn into_query(self) -> Result<ConstituencyQuery, ApiError> {
    let defaults = ConstituencyQuery::default();
    let query = ConstituencyQuery {
      region_ids: parse_region_ids(self.region_ids.as_deref())?,
      search:     self.search.filter(|s| !s.is_empty()),
      page:       self.page.unwrap_or(defaults.page),
      page_size:  self.page_size.unwrap_or(defaults.page_size),
      sort_by:    self.sort_by.unwrap_or_default(),
      sort_dir:   self.sort_dir.unwrap_or_default(),
    };
    if query.page == 0 {
      return Err(ApiError::BadRequest("page must be at least 1".into()));
    }
    if !(1..=MAX_CONSTITUENCY_PAGE_SIZE).contains(&query.page_size) {
      return Err(ApiError::BadRequest(format!(
        "page_size must be between 1 and {MAX_CONSTITUENCY_PAGE_SIZE}"
      )));
    }
    Ok(query)
  }
}

/// `GET /constituencies`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<ConstituencyPage>, ApiError>
where
  S: ElectionStore + 'static,
{
  let query = params.into_query()?;
  let page = state
    .store
    .list_constituencies(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(page))
}

/// `GET /constituencies/summary`
pub async fn summary<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<ConstituencySummary>>, ApiError>
where
  S: ElectionStore + 'static,
{
  let summaries = state
    .store
    .constituency_summaries()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(summaries))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /constituencies/:id`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<i64>,
) -> Result<Json<ConstituencyDetail>, ApiError>
where
  S: ElectionStore + 'static,
{
  state
    .store
    .get_constituency(id)
    .await
    .map_err(ApiError::store)?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound("Constituency not found".into()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn region_ids_parse_from_csv() {
    assert_eq!(parse_region_ids(Some("1, 2,,3")).unwrap(), vec![1, 2, 3]);
    assert!(parse_region_ids(None).unwrap().is_empty());
    assert!(parse_region_ids(Some("1,x")).is_err());
  }
}
