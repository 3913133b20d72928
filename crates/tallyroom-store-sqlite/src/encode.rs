//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. The upload error list is
//! stored as compact JSON. Ids are SQLite integer row ids.

use chrono::{DateTime, Utc};
use rusqlite::Row;
use tallyroom_core::{
  geography::{Constituency, Region},
  party::Party,
  tally::{HistoryEntry, ResultRecord},
  upload::{LineError, UploadLog, UploadStatus},
};

use crate::{Error, Result};

// ─── DateTime<Utc>
// ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<&str>) -> Result<Option<DateTime<Utc>>> {
  s.map(decode_dt).transpose()
}

// ─── Line errors ─────────────────────────────────────────────────────────────

pub fn encode_errors(errors: &[LineError]) -> Result<String> {
  Ok(serde_json::to_string(errors)?)
}

pub fn decode_errors(s: &str) -> Result<Vec<LineError>> {
  Ok(serde_json::from_str(s)?)
}

fn decode_party(s: &str) -> Result<Party> { Ok(s.parse()?) }

fn decode_count(n: i64) -> usize { n.max(0) as usize }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawUpload::from_row`].
pub const UPLOAD_COLUMNS: &str = "upload_id, filename, status, total_lines, \
  processed_lines, error_lines, errors, started_at, completed_at, deleted_at";

/// Raw values read directly from an `upload_logs` row.
pub struct RawUpload {
  pub upload_id:       i64,
  pub filename:        Option<String>,
  pub status:          String,
  pub total_lines:     i64,
  pub processed_lines: i64,
  pub error_lines:     i64,
  pub errors:          String,
  pub started_at:      String,
  pub completed_at:    Option<String>,
  pub deleted_at:      Option<String>,
}

impl RawUpload {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      upload_id:       row.get(0)?,
      filename:        row.get(1)?,
      status:          row.get(2)?,
      total_lines:     row.get(3)?,
      processed_lines: row.get(4)?,
      error_lines:     row.get(5)?,
      errors:          row.get(6)?,
      started_at:      row.get(7)?,
      completed_at:    row.get(8)?,
      deleted_at:      row.get(9)?,
    })
  }

  pub fn into_upload(self) -> Result<UploadLog> {
    Ok(UploadLog {
      upload_id:       self.upload_id,
      filename:        self.filename,
      status:          self.status.parse::<UploadStatus>()?,
      total_lines:     decode_count(self.total_lines),
      processed_lines: decode_count(self.processed_lines),
      error_lines:     decode_count(self.error_lines),
      errors:          decode_errors(&self.errors)?,
      started_at:      decode_dt(&self.started_at)?,
      completed_at:    decode_opt_dt(self.completed_at.as_deref())?,
      deleted_at:      decode_opt_dt(self.deleted_at.as_deref())?,
    })
  }
}

/// Column list matching [`RawConstituency::from_row`].
pub const CONSTITUENCY_COLUMNS: &str =
  "constituency_id, name, pcon24_code, region_id, created_at, updated_at";

/// Raw values read directly from a `constituencies` row.
pub struct RawConstituency {
  pub constituency_id: i64,
  pub name:            String,
  pub pcon24_code:     Option<String>,
  pub region_id:       Option<i64>,
  pub created_at:      String,
  pub updated_at:      String,
}

impl RawConstituency {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      constituency_id: row.get(0)?,
      name:            row.get(1)?,
      pcon24_code:     row.get(2)?,
      region_id:       row.get(3)?,
      created_at:      row.get(4)?,
      updated_at:      row.get(5)?,
    })
  }

  pub fn into_constituency(self) -> Result<Constituency> {
    Ok(Constituency {
      constituency_id: self.constituency_id,
      name:            self.name,
      pcon24_code:     self.pcon24_code,
      region_id:       self.region_id,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
    })
  }
}

/// Column list matching [`RawResult::from_row`].
pub const RESULT_COLUMNS: &str =
  "result_id, constituency_id, party_code, votes, upload_id, created_at, updated_at";

/// Raw values read directly from a `results` row.
pub struct RawResult {
  pub result_id:       i64,
  pub constituency_id: i64,
  pub party_code:      String,
  pub votes:           i64,
  pub upload_id:       Option<i64>,
  pub created_at:      String,
  pub updated_at:      String,
}

impl RawResult {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      result_id:       row.get(0)?,
      constituency_id: row.get(1)?,
      party_code:      row.get(2)?,
      votes:           row.get(3)?,
      upload_id:       row.get(4)?,
      created_at:      row.get(5)?,
      updated_at:      row.get(6)?,
    })
  }

  pub fn into_result(self) -> Result<ResultRecord> {
    Ok(ResultRecord {
      result_id:       self.result_id,
      constituency_id: self.constituency_id,
      party:           decode_party(&self.party_code)?,
      votes:           self.votes,
      upload_id:       self.upload_id,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
    })
  }
}

/// Column list matching [`RawHistory::from_row`].
pub const HISTORY_COLUMNS: &str = "history_id, result_id, upload_id, votes, created_at";

/// Raw values read directly from a `result_history` row.
pub struct RawHistory {
  pub history_id: i64,
  pub result_id:  i64,
  pub upload_id:  Option<i64>,
  pub votes:      i64,
  pub created_at: String,
}

impl RawHistory {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      history_id: row.get(0)?,
      result_id:  row.get(1)?,
      upload_id:  row.get(2)?,
      votes:      row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_history(self) -> Result<HistoryEntry> {
    Ok(HistoryEntry {
      history_id: self.history_id,
      result_id:  self.result_id,
      upload_id:  self.upload_id,
      votes:      self.votes,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Column list matching [`RawRegion::from_row`].
pub const REGION_COLUMNS: &str = "region_id, name, sort_order, created_at";

/// Raw values read directly from a `regions` row.
pub struct RawRegion {
  pub region_id:  i64,
  pub name:       String,
  pub sort_order: i64,
  pub created_at: String,
}

impl RawRegion {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      region_id:  row.get(0)?,
      name:       row.get(1)?,
      sort_order: row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn into_region(self) -> Result<Region> {
    Ok(Region {
      region_id:  self.region_id,
      name:       self.name,
      sort_order: self.sort_order,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
