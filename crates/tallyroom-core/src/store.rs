//! The `ElectionStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `tallyroom-store-sqlite`).
//! Higher layers (`tallyroom-api`, `tallyroom-server`) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{
  event::{DeleteEvent, IngestEvent},
  geography::{Constituency, NewConstituency, Region, RegionSeed},
  tally::{HistoryEntry, ResultRecord},
  upload::{UploadLog, UploadStats, UploadStatus},
  view::{
    ConstituencyDetail, ConstituencyPage, ConstituencySummary, NationalTotals,
    RegionDetail, RegionSummary, UploadPage,
  },
};

// ─── Query types ─────────────────────────────────────────────────────────────

pub const MAX_CONSTITUENCY_PAGE_SIZE: usize = 200;
pub const MAX_UPLOAD_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
  #[default]
  Name,
  TotalVotes,
  WinningParty,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
  #[default]
  Asc,
  Desc,
}

/// Parameters for [`ElectionStore::list_constituencies`].
#[derive(Debug, Clone)]
pub struct ConstituencyQuery {
  /// Case-insensitive substring filter on the canonical name.
  pub search:     Option<String>,
  pub region_ids: Vec<i64>,
  /// 1-based.
  pub page:       usize,
  pub page_size:  usize,
  pub sort_by:    SortBy,
  pub sort_dir:   SortDir,
}

impl Default for ConstituencyQuery {
  fn default() -> Self {
    Self {
      search:     None,
      region_ids: Vec::new(),
      page:       1,
      page_size:  50,
      sort_by:    SortBy::default(),
      sort_dir:   SortDir::default(),
    }
  }
}

/// Parameters for [`ElectionStore::list_uploads`].
#[derive(Debug, Clone)]
pub struct UploadQuery {
  pub status:    Option<UploadStatus>,
  /// Case-insensitive substring filter on the filename.
  pub search:    Option<String>,
  /// 1-based.
  pub page:      usize,
  pub page_size: usize,
}

impl Default for UploadQuery {
  fn default() -> Self {
    Self { status: None, search: None, page: 1, page_size: 20 }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Tallyroom storage backend.
///
/// Ingestion and rollback each run as one atomic unit: either every result
/// mutation of the attempt is applied, or none is. Streaming variants report
/// progress through `on_event` while the unit of work is still open; their
/// terminal event is emitted only after the outcome is durable.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ElectionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Reference data ────────────────────────────────────────────────────

  fn add_region(
    &self,
    name: String,
    sort_order: i64,
  ) -> impl Future<Output = Result<Region, Self::Error>> + Send + '_;

  /// Add a canonical constituency. Names are unique.
  fn add_constituency(
    &self,
    input: NewConstituency,
  ) -> impl Future<Output = Result<Constituency, Self::Error>> + Send + '_;

  /// Seed regions and their constituencies in one transaction, but only
  /// into a store with no constituencies. Returns the number of
  /// constituencies added; zero means the store was already seeded.
  fn seed_regions(
    &self,
    regions: Vec<RegionSeed>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Every canonical constituency row, ordered by id.
  fn list_constituency_rows(
    &self,
  ) -> impl Future<Output = Result<Vec<Constituency>, Self::Error>> + Send + '_;

  // ── Ingestion ─────────────────────────────────────────────────────────

  /// Parse `text`, match each record against the gazetteer and upsert its
  /// votes, all in one transaction.
  ///
  /// Never fails because of the document's content: malformed lines and
  /// unmatched names are recorded in the returned log. If storage fails
  /// mid-way the attempt is rolled back and a `failed` log is recorded in a
  /// fresh transaction and returned instead. `Err` is reserved for failures
  /// that prevent even that.
  fn ingest(
    &self,
    text: String,
    filename: Option<String>,
  ) -> impl Future<Output = Result<UploadLog, Self::Error>> + Send + '_;

  /// As [`ingest`](Self::ingest), reporting progress every `batch_size`
  /// records.
  fn ingest_streaming<F>(
    &self,
    text: String,
    filename: Option<String>,
    batch_size: usize,
    on_event: F,
  ) -> impl Future<Output = Result<UploadLog, Self::Error>> + Send + '_
  where
    F: FnMut(IngestEvent) + Send + 'static;

  // ── Rollback ──────────────────────────────────────────────────────────

  /// Soft-delete an upload and restore every result it last wrote to the
  /// previous surviving value (or delete results it alone created).
  ///
  /// Returns `None` if no non-deleted upload has this id.
  fn soft_delete(
    &self,
    upload_id: i64,
  ) -> impl Future<Output = Result<Option<UploadLog>, Self::Error>> + Send + '_;

  /// As [`soft_delete`](Self::soft_delete), reporting progress every
  /// `batch_size` affected results.
  fn soft_delete_streaming<F>(
    &self,
    upload_id: i64,
    batch_size: usize,
    on_event: F,
  ) -> impl Future<Output = Result<Option<UploadLog>, Self::Error>> + Send + '_
  where
    F: FnMut(DeleteEvent) + Send + 'static;

  // ── Uploads ───────────────────────────────────────────────────────────

  /// Retrieve an upload by id, including soft-deleted ones.
  fn get_upload(
    &self,
    upload_id: i64,
  ) -> impl Future<Output = Result<Option<UploadLog>, Self::Error>> + Send + '_;

  fn list_uploads<'a>(
    &'a self,
    query: &'a UploadQuery,
  ) -> impl Future<Output = Result<UploadPage, Self::Error>> + Send + 'a;

  fn upload_stats(
    &self,
  ) -> impl Future<Output = Result<UploadStats, Self::Error>> + Send + '_;

  // ── Results ───────────────────────────────────────────────────────────

  fn results_for_constituency(
    &self,
    constituency_id: i64,
  ) -> impl Future<Output = Result<Vec<ResultRecord>, Self::Error>> + Send + '_;

  /// The ledger for one result, in insertion order.
  fn history_for_result(
    &self,
    result_id: i64,
  ) -> impl Future<Output = Result<Vec<HistoryEntry>, Self::Error>> + Send + '_;

  // ── Views ─────────────────────────────────────────────────────────────

  fn get_constituency(
    &self,
    constituency_id: i64,
  ) -> impl Future<Output = Result<Option<ConstituencyDetail>, Self::Error>> + Send + '_;

  fn list_constituencies<'a>(
    &'a self,
    query: &'a ConstituencyQuery,
  ) -> impl Future<Output = Result<ConstituencyPage, Self::Error>> + Send + 'a;

  fn constituency_summaries(
    &self,
  ) -> impl Future<Output = Result<Vec<ConstituencySummary>, Self::Error>> + Send + '_;

  /// National totals over results whose last writer is not soft-deleted.
  fn totals(
    &self,
  ) -> impl Future<Output = Result<NationalTotals, Self::Error>> + Send + '_;

  fn list_regions(
    &self,
  ) -> impl Future<Output = Result<Vec<RegionSummary>, Self::Error>> + Send + '_;

  fn get_region(
    &self,
    region_id: i64,
  ) -> impl Future<Output = Result<Option<RegionDetail>, Self::Error>> + Send + '_;
}
