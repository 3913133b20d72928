//! The rollback engine: soft-delete an upload and restore every result it was
//! the last writer of.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior, params};
use tracing::{info, warn};

use tallyroom_core::{
  event::{DeleteEvent, percentage, progress_due},
  upload::UploadLog,
};

use crate::{Error, Result, encode::encode_dt, query};

pub const DELETED_MESSAGE: &str = "Upload deleted";
pub const FAILURE_DETAIL: &str = "Delete failed due to a database error";
pub const NOT_FOUND_DETAIL: &str = "Upload not found";

/// Most recent surviving ledger row for a result, ignoring the upload being
/// rolled back and any soft-deleted upload.
const PRIOR_VALUE: &str = "
  SELECT h.votes, h.upload_id
  FROM result_history h
  LEFT JOIN upload_logs u ON u.upload_id = h.upload_id
  WHERE h.result_id = ?1
    AND (h.upload_id IS NULL OR (h.upload_id != ?2 AND u.deleted_at IS NULL))
  ORDER BY h.history_id DESC
  LIMIT 1";

#[derive(Debug, Default)]
struct Tally {
  restored: usize,
  deleted:  usize,
  skipped:  usize,
}

enum Restore {
  Restored,
  Deleted,
  Skipped,
}

pub fn run(
  conn: &mut Connection,
  upload_id: i64,
  batch_size: usize,
  on_event: &mut dyn FnMut(DeleteEvent),
) -> Result<Option<UploadLog>> {
  match attempt(conn, upload_id, batch_size, on_event) {
    Ok(Some((log, tally))) => {
      let rolled_back = tally.restored + tally.deleted + tally.skipped;
      info!(
        upload_id,
        restored = tally.restored,
        deleted = tally.deleted,
        skipped = tally.skipped,
        "upload rolled back"
      );
      on_event(DeleteEvent::Complete {
        upload_id,
        message: DELETED_MESSAGE.to_owned(),
        rolled_back,
      });
      Ok(Some(log))
    }
    Ok(None) => {
      on_event(DeleteEvent::Error { upload_id, detail: NOT_FOUND_DETAIL.to_owned() });
      Ok(None)
    }
    Err(e) => {
      warn!(upload_id, error = %e, "rollback failed; attempt rolled back");
      on_event(DeleteEvent::Error { upload_id, detail: FAILURE_DETAIL.to_owned() });
      Err(e)
    }
  }
}

fn attempt(
  conn: &mut Connection,
  upload_id: i64,
  batch_size: usize,
  on_event: &mut dyn FnMut(DeleteEvent),
) -> Result<Option<(UploadLog, Tally)>> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

  if !query::upload_is_live(&tx, upload_id)? {
    return Ok(None);
  }

  let now = encode_dt(Utc::now());
  tx.execute(
    "UPDATE upload_logs SET deleted_at = ?2 WHERE upload_id = ?1",
    params![upload_id, now],
  )?;

  let affected: Vec<i64> = {
    let mut stmt = tx.prepare(
      "SELECT DISTINCT result_id FROM result_history
       WHERE upload_id = ?1
       ORDER BY result_id",
    )?;
    stmt
      .query_map(params![upload_id], |r| r.get(0))?
      .collect::<rusqlite::Result<_>>()?
  };

  let total = affected.len();
  on_event(DeleteEvent::Started { upload_id, total_affected: total });

  let mut tally = Tally::default();
  for (i, &result_id) in affected.iter().enumerate() {
    match restore_result(&tx, result_id, upload_id, &now)? {
      Restore::Restored => tally.restored += 1,
      Restore::Deleted => tally.deleted += 1,
      Restore::Skipped => tally.skipped += 1,
    }

    let processed = i + 1;
    if progress_due(processed, total, batch_size) {
      on_event(DeleteEvent::Progress {
        processed,
        total,
        percentage: percentage(processed, total),
      });
    }
  }

  tx.execute(
    "DELETE FROM result_history WHERE upload_id = ?1",
    params![upload_id],
  )?;

  let log = query::upload_by_id(&tx, upload_id)?.ok_or(Error::UploadNotFound(upload_id))?;
  tx.commit()?;
  Ok(Some((log, tally)))
}

/// Restore one result, unless a later upload has since overwritten it.
fn restore_result(
  conn: &Connection,
  result_id: i64,
  upload_id: i64,
  now: &str,
) -> Result<Restore> {
  let current_tag: Option<Option<i64>> = conn
    .query_row(
      "SELECT upload_id FROM results WHERE result_id = ?1",
      params![result_id],
      |r| r.get(0),
    )
    .optional()?;

  // Gone, or no longer ours.
  if current_tag != Some(Some(upload_id)) {
    return Ok(Restore::Skipped);
  }

  let prior: Option<(i64, Option<i64>)> = conn
    .query_row(PRIOR_VALUE, params![result_id, upload_id], |r| {
      Ok((r.get(0)?, r.get(1)?))
    })
    .optional()?;

  match prior {
    Some((votes, tag)) => {
      conn.execute(
        "UPDATE results SET votes = ?2, upload_id = ?3, updated_at = ?4
         WHERE result_id = ?1",
        params![result_id, votes, tag, now],
      )?;
      Ok(Restore::Restored)
    }
    None => {
      conn.execute("DELETE FROM results WHERE result_id = ?1", params![result_id])?;
      Ok(Restore::Deleted)
    }
  }
}
