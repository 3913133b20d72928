//! Upload audit records.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
  Processing,
  Completed,
  Failed,
}

impl UploadStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      UploadStatus::Processing => "processing",
      UploadStatus::Completed => "completed",
      UploadStatus::Failed => "failed",
    }
  }
}

impl fmt::Display for UploadStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for UploadStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "processing" => Ok(UploadStatus::Processing),
      "completed" => Ok(UploadStatus::Completed),
      "failed" => Ok(UploadStatus::Failed),
      other => Err(Error::UnknownUploadStatus(other.to_owned())),
    }
  }
}

/// A line-level problem recorded against an upload: either a parse error or
/// a constituency name that did not match the gazetteer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineError {
  /// 1-based line number in the uploaded document.
  pub line:  usize,
  pub error: String,
}

/// The audit record of one ingestion attempt.
///
/// Created in [`UploadStatus::Processing`] and finalised to `Completed` or
/// `Failed`. Deletion is logical: `deleted_at` is set by the rollback engine
/// and the row is never removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadLog {
  pub upload_id:       i64,
  pub filename:        Option<String>,
  pub status:          UploadStatus,
  pub total_lines:     usize,
  pub processed_lines: usize,
  pub error_lines:     usize,
  pub errors:          Vec<LineError>,
  pub started_at:      DateTime<Utc>,
  pub completed_at:    Option<DateTime<Utc>>,
  pub deleted_at:      Option<DateTime<Utc>>,
}

impl UploadLog {
  pub fn is_deleted(&self) -> bool { self.deleted_at.is_some() }
}

/// Aggregate statistics over non-deleted uploads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadStats {
  pub total_uploads:         usize,
  pub completed:             usize,
  pub failed:                usize,
  /// Percentage of uploads that completed, rounded to 2 dp.
  pub success_rate:          f64,
  pub total_lines_processed: usize,
}
