//! Progress events emitted by the streaming ingestion and rollback variants.
//!
//! Events are produced from inside the engine's transaction. The terminal
//! event (`Complete` or `Error`) is only emitted once the transaction has
//! committed or been rolled back, so it always reflects the durable outcome.

use serde::{Deserialize, Serialize};

use crate::upload::{LineError, UploadLog, UploadStatus};

/// Default number of processed items between progress events.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Integer percentage of `processed` over `total`; 100 when `total` is zero.
pub fn percentage(processed: usize, total: usize) -> u8 {
  if total == 0 {
    return 100;
  }
  ((processed.min(total) * 100) / total) as u8
}

/// Whether a progress event is due after `processed` of `total` items.
pub fn progress_due(processed: usize, total: usize, batch_size: usize) -> bool {
  processed % batch_size.max(1) == 0 || processed == total
}

// ─── Ingestion ───────────────────────────────────────────────────────────────

/// The fields of the final [`UploadLog`] carried by
/// [`IngestEvent::Complete`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOutcome {
  pub upload_id:       i64,
  pub status:          UploadStatus,
  pub total_lines:     usize,
  pub processed_lines: usize,
  pub error_lines:     usize,
  pub errors:          Vec<LineError>,
}

impl From<&UploadLog> for UploadOutcome {
  fn from(log: &UploadLog) -> Self {
    Self {
      upload_id:       log.upload_id,
      status:          log.status,
      total_lines:     log.total_lines,
      processed_lines: log.processed_lines,
      error_lines:     log.error_lines,
      errors:          log.errors.clone(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum IngestEvent {
  /// Emitted once, after the processing log row is written.
  Created { upload_id: i64, total_lines: usize },
  Progress {
    processed_count: usize,
    total:           usize,
    percentage:      u8,
  },
  Complete(UploadOutcome),
  /// The attempt was rolled back; `upload_id` is the durable failed log, or
  /// the rolled-back attempt when the failure itself could not be recorded.
  Error { upload_id: i64, detail: String },
}

impl IngestEvent {
  /// The SSE event name.
  pub fn name(&self) -> &'static str {
    match self {
      IngestEvent::Created { .. } => "created",
      IngestEvent::Progress { .. } => "progress",
      IngestEvent::Complete(_) => "complete",
      IngestEvent::Error { .. } => "error",
    }
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, IngestEvent::Complete(_) | IngestEvent::Error { .. })
  }
}

// ─── Rollback ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DeleteEvent {
  Started { upload_id: i64, total_affected: usize },
  Progress {
    processed:  usize,
    total:      usize,
    percentage: u8,
  },
  Complete {
    upload_id:   i64,
    message:     String,
    rolled_back: usize,
  },
  Error { upload_id: i64, detail: String },
}

impl DeleteEvent {
  /// The SSE event name.
  pub fn name(&self) -> &'static str {
    match self {
      DeleteEvent::Started { .. } => "started",
      DeleteEvent::Progress { .. } => "progress",
      DeleteEvent::Complete { .. } => "complete",
      DeleteEvent::Error { .. } => "error",
    }
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, DeleteEvent::Complete { .. } | DeleteEvent::Error { .. })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn percentage_floors() {
    assert_eq!(percentage(1, 3), 33);
    assert_eq!(percentage(2, 3), 66);
    assert_eq!(percentage(3, 3), 100);
    assert_eq!(percentage(0, 0), 100);
  }

  #[test]
  fn progress_is_due_per_batch_and_at_the_end() {
    let due: Vec<usize> = (1..=25).filter(|n| progress_due(*n, 25, 10)).collect();
    assert_eq!(due, [10, 20, 25]);
  }

  #[test]
  fn events_are_tagged_by_name() {
    let created = IngestEvent::Created { upload_id: 4, total_lines: 2 };
    let json = serde_json::to_value(&created).unwrap();
    assert_eq!(json["event"], "created");
    assert_eq!(json["upload_id"], 4);
    assert_eq!(created.name(), "created");

    let complete = IngestEvent::Complete(UploadOutcome {
      upload_id:       4,
      status:          UploadStatus::Completed,
      total_lines:     2,
      processed_lines: 1,
      error_lines:     1,
      errors:          vec![LineError { line: 2, error: "Empty line".into() }],
    });
    let json = serde_json::to_value(&complete).unwrap();
    assert_eq!(json["event"], "complete");
    assert_eq!(json["status"], "completed");
    assert_eq!(json["errors"][0]["line"], 2);
    assert!(complete.is_terminal());

    let started = DeleteEvent::Started { upload_id: 1, total_affected: 0 };
    assert_eq!(serde_json::to_value(&started).unwrap()["event"], "started");
  }
}
