//! [`SqliteStore`], the SQLite implementation of [`ElectionStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{TransactionBehavior, params};

use tallyroom_core::{
  event::{DEFAULT_BATCH_SIZE, DeleteEvent, IngestEvent},
  geography::{Constituency, NewConstituency, Region, RegionSeed},
  store::{ConstituencyQuery, ElectionStore, UploadQuery},
  tally::{HistoryEntry, ResultRecord},
  upload::{UploadLog, UploadStats},
  view::{
    ConstituencyDetail, ConstituencyPage, ConstituencySummary, NationalTotals,
    RegionDetail, RegionSummary, UploadPage,
  },
};

use crate::{
  Error, Result,
  encode::{CONSTITUENCY_COLUMNS, REGION_COLUMNS, RawConstituency, RawRegion, encode_dt},
  ingest, query, rollback,
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tallyroom results store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All writes
/// are serialised on the connection's thread.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── ElectionStore impl ──────────────────────────────────────────────────────

impl ElectionStore for SqliteStore {
  type Error = Error;

  async fn add_region(&self, name: String, sort_order: i64) -> Result<Region> {
    let now = encode_dt(Utc::now());
    let raw = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "INSERT INTO regions (name, sort_order, created_at) VALUES (?1, ?2, ?3)
           RETURNING {REGION_COLUMNS}"
        );
        Ok(conn.query_row(&sql, params![name, sort_order, now], RawRegion::from_row)?)
      })
      .await?;
    raw.into_region()
  }

  async fn add_constituency(&self, input: NewConstituency) -> Result<Constituency> {
    let now = encode_dt(Utc::now());
    let raw = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "INSERT INTO constituencies
             (name, pcon24_code, region_id, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?4)
           RETURNING {CONSTITUENCY_COLUMNS}"
        );
        Ok(conn.query_row(
          &sql,
          params![input.name, input.pcon24_code, input.region_id, now],
          RawConstituency::from_row,
        )?)
      })
      .await?;
    raw.into_constituency()
  }

  async fn seed_regions(&self, regions: Vec<RegionSeed>) -> Result<usize> {
    let now = encode_dt(Utc::now());
    let added = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let existing: i64 =
          tx.query_row("SELECT COUNT(*) FROM constituencies", [], |r| r.get(0))?;
        if existing > 0 {
          return Ok(0);
        }

        let mut added: usize = 0;
        for seed in &regions {
          let region_id: i64 = tx
            .prepare_cached(
              "INSERT INTO regions (name, sort_order, created_at) VALUES (?1, ?2, ?3)
               RETURNING region_id",
            )?
            .query_row(params![seed.name, seed.sort_order, now], |r| r.get(0))?;
          for c in &seed.constituencies {
            tx.prepare_cached(
              "INSERT INTO constituencies
                 (name, pcon24_code, region_id, created_at, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?4)",
            )?
            .execute(params![c.name, c.pcon24_code, region_id, now])?;
            added += 1;
          }
        }
        tx.commit()?;
        Ok(added)
      })
      .await?;
    Ok(added)
  }

  async fn list_constituency_rows(&self) -> Result<Vec<Constituency>> {
    self.conn.call(|conn| Ok(query::constituency_rows(conn))).await?
  }

  // ── Ingestion ─────────────────────────────────────────────────────────

  async fn ingest(&self, text: String, filename: Option<String>) -> Result<UploadLog> {
    self
      .ingest_streaming(text, filename, DEFAULT_BATCH_SIZE, |_| {})
      .await
  }

  async fn ingest_streaming<F>(
    &self,
    text: String,
    filename: Option<String>,
    batch_size: usize,
    mut on_event: F,
  ) -> Result<UploadLog>
  where
    F: FnMut(IngestEvent) + Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        Ok(ingest::run(
          conn,
          &text,
          filename.as_deref(),
          batch_size,
          &mut on_event,
        ))
      })
      .await?
  }

  // ── Rollback ──────────────────────────────────────────────────────────

  async fn soft_delete(&self, upload_id: i64) -> Result<Option<UploadLog>> {
    self
      .soft_delete_streaming(upload_id, DEFAULT_BATCH_SIZE, |_| {})
      .await
  }

  async fn soft_delete_streaming<F>(
    &self,
    upload_id: i64,
    batch_size: usize,
    mut on_event: F,
  ) -> Result<Option<UploadLog>>
  where
    F: FnMut(DeleteEvent) + Send + 'static,
  {
    self
      .conn
      .call(move |conn| Ok(rollback::run(conn, upload_id, batch_size, &mut on_event)))
      .await?
  }

  // ── Uploads ───────────────────────────────────────────────────────────

  async fn get_upload(&self, upload_id: i64) -> Result<Option<UploadLog>> {
    self
      .conn
      .call(move |conn| Ok(query::upload_by_id(conn, upload_id)))
      .await?
  }

  async fn list_uploads<'a>(&'a self, q: &'a UploadQuery) -> Result<UploadPage> {
    let q = q.clone();
    self.conn.call(move |conn| Ok(query::list_uploads(conn, &q))).await?
  }

  async fn upload_stats(&self) -> Result<UploadStats> {
    self.conn.call(|conn| Ok(query::upload_stats(conn))).await?
  }

  // ── Results ───────────────────────────────────────────────────────────

  async fn results_for_constituency(
    &self,
    constituency_id: i64,
  ) -> Result<Vec<ResultRecord>> {
    self
      .conn
      .call(move |conn| Ok(query::results_for_constituency(conn, constituency_id)))
      .await?
  }

  async fn history_for_result(&self, result_id: i64) -> Result<Vec<HistoryEntry>> {
    self
      .conn
      .call(move |conn| Ok(query::history_for_result(conn, result_id)))
      .await?
  }

  // ── Views ─────────────────────────────────────────────────────────────

  async fn get_constituency(
    &self,
    constituency_id: i64,
  ) -> Result<Option<ConstituencyDetail>> {
    self
      .conn
      .call(move |conn| Ok(query::constituency_detail(conn, constituency_id)))
      .await?
  }

  async fn list_constituencies<'a>(
    &'a self,
    q: &'a ConstituencyQuery,
  ) -> Result<ConstituencyPage> {
    let q = q.clone();
    self
      .conn
      .call(move |conn| Ok(query::list_constituencies(conn, &q)))
      .await?
  }

  async fn constituency_summaries(&self) -> Result<Vec<ConstituencySummary>> {
    self.conn.call(|conn| Ok(query::constituency_summaries(conn))).await?
  }

  async fn totals(&self) -> Result<NationalTotals> {
    self.conn.call(|conn| Ok(query::totals(conn))).await?
  }

  async fn list_regions(&self) -> Result<Vec<RegionSummary>> {
    self.conn.call(|conn| Ok(query::list_regions(conn))).await?
  }

  async fn get_region(&self, region_id: i64) -> Result<Option<RegionDetail>> {
    self
      .conn
      .call(move |conn| Ok(query::region_detail(conn, region_id)))
      .await?
  }
}
