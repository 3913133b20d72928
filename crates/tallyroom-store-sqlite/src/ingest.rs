//! The ingestion engine: parse, match and upsert one document inside a single
//! transaction, then record the attempt's outcome.

use chrono::Utc;
use rusqlite::{Connection, TransactionBehavior, params};
use tracing::{error, info, warn};

use tallyroom_core::{
  event::{IngestEvent, percentage, progress_due},
  matcher::ConstituencyMatcher,
  party::Party,
  upload::{LineError, UploadLog},
};
use tallyroom_parse::{ParsedDocument, parse_file};

use crate::{
  Error, Result,
  encode::{encode_dt, encode_errors},
  query,
};

/// Detail carried by [`IngestEvent::Error`].
pub const FAILURE_DETAIL: &str = "File processing failed due to a database error";

/// Ingest `text`, reporting progress through `on_event`.
///
/// A storage failure inside the attempt rolls it back and records a `failed`
/// log in a fresh transaction; that log is returned as `Ok`. `Err` means even
/// the failure could not be recorded. Either way a failed attempt ends with
/// exactly one [`IngestEvent::Error`]: it names the durable `failed` log, or
/// the rolled-back attempt's id when no log could be written (0 if the
/// attempt never got one).
pub fn run(
  conn: &mut Connection,
  text: &str,
  filename: Option<&str>,
  batch_size: usize,
  on_event: &mut dyn FnMut(IngestEvent),
) -> Result<UploadLog> {
  let document = parse_file(text);

  let mut attempt_id = None;
  let outcome = {
    let mut observe = |event: IngestEvent| {
      if let IngestEvent::Created { upload_id, .. } = event {
        attempt_id = Some(upload_id);
      }
      on_event(event);
    };
    attempt(conn, &document, filename, batch_size, &mut observe)
  };

  match outcome {
    Ok(log) => {
      info!(
        upload_id = log.upload_id,
        total = log.total_lines,
        processed = log.processed_lines,
        errors = log.error_lines,
        "upload completed"
      );
      on_event(IngestEvent::Complete((&log).into()));
      Ok(log)
    }
    Err(e) => {
      warn!(error = %e, filename, "upload failed; attempt rolled back");
      let failed = record_failed(conn, &document, filename);
      let upload_id = match &failed {
        Ok(log) => log.upload_id,
        Err(e) => {
          error!(error = %e, filename, "could not record failed upload");
          attempt_id.unwrap_or(0)
        }
      };
      on_event(IngestEvent::Error {
        upload_id,
        detail:    FAILURE_DETAIL.to_owned(),
      });
      failed
    }
  }
}

fn attempt(
  conn: &mut Connection,
  document: &ParsedDocument,
  filename: Option<&str>,
  batch_size: usize,
  on_event: &mut dyn FnMut(IngestEvent),
) -> Result<UploadLog> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

  let total_lines = document.total_lines();
  let mut errors = document.line_errors();
  let now = encode_dt(Utc::now());

  tx.execute(
    "INSERT INTO upload_logs
       (filename, status, total_lines, processed_lines, error_lines, errors, started_at)
     VALUES (?1, 'processing', ?2, 0, ?3, ?4, ?5)",
    params![
      filename,
      total_lines as i64,
      errors.len() as i64,
      encode_errors(&errors)?,
      now
    ],
  )?;
  let upload_id = tx.last_insert_rowid();
  on_event(IngestEvent::Created { upload_id, total_lines });

  let matcher = ConstituencyMatcher::new(query::constituency_rows(&tx)?);

  let total = document.records.len();
  let mut processed = 0usize;
  for (i, record) in document.records.iter().enumerate() {
    match matcher.find(&record.constituency_name) {
      Some(constituency) => {
        for &(party, votes) in &record.party_votes {
          upsert_result(&tx, constituency.constituency_id, party, votes, upload_id, &now)?;
        }
        processed += 1;
      }
      None => errors.push(LineError {
        line:  record.line_number,
        error: format!("No matching constituency for '{}'", record.constituency_name),
      }),
    }

    let seen = i + 1;
    if progress_due(seen, total, batch_size) {
      on_event(IngestEvent::Progress {
        processed_count: seen,
        total,
        percentage: percentage(seen, total),
      });
    }
  }

  tx.execute(
    "UPDATE upload_logs
     SET status = 'completed', processed_lines = ?2, error_lines = ?3,
         errors = ?4, completed_at = ?5
     WHERE upload_id = ?1",
    params![
      upload_id,
      processed as i64,
      errors.len() as i64,
      encode_errors(&errors)?,
      encode_dt(Utc::now())
    ],
  )?;

  let log = query::upload_by_id(&tx, upload_id)?.ok_or(Error::UploadNotFound(upload_id))?;
  tx.commit()?;
  Ok(log)
}

/// Insert or overwrite the `(constituency, party)` result and append one
/// ledger row for the write.
fn upsert_result(
  conn: &Connection,
  constituency_id: i64,
  party: Party,
  votes: i64,
  upload_id: i64,
  now: &str,
) -> Result<()> {
  let result_id: i64 = conn
    .prepare_cached(
      "INSERT INTO results
         (constituency_id, party_code, votes, upload_id, created_at, updated_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?5)
       ON CONFLICT (constituency_id, party_code) DO UPDATE SET
         votes      = excluded.votes,
         upload_id  = excluded.upload_id,
         updated_at = excluded.updated_at
       RETURNING result_id",
    )?
    .query_row(
      params![constituency_id, party.code(), votes, upload_id, now],
      |r| r.get(0),
    )?;

  conn
    .prepare_cached(
      "INSERT INTO result_history (result_id, upload_id, votes, created_at)
       VALUES (?1, ?2, ?3, ?4)",
    )?
    .execute(params![result_id, upload_id, votes, now])?;

  Ok(())
}

/// Record a failed attempt: parse errors kept, nothing processed.
fn record_failed(
  conn: &mut Connection,
  document: &ParsedDocument,
  filename: Option<&str>,
) -> Result<UploadLog> {
  let tx = conn.transaction()?;
  let errors = document.line_errors();
  let now = encode_dt(Utc::now());

  tx.execute(
    "INSERT INTO upload_logs
       (filename, status, total_lines, processed_lines, error_lines, errors,
        started_at, completed_at)
     VALUES (?1, 'failed', ?2, 0, ?3, ?4, ?5, ?5)",
    params![
      filename,
      document.total_lines() as i64,
      errors.len() as i64,
      encode_errors(&errors)?,
      now
    ],
  )?;
  let upload_id = tx.last_insert_rowid();

  let log = query::upload_by_id(&tx, upload_id)?.ok_or(Error::UploadNotFound(upload_id))?;
  tx.commit()?;
  Ok(log)
}
