//! Error type for `tallyroom-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] tallyroom_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A row disappeared between being written and being read back inside the
  /// same transaction.
  #[error("upload not found: {0}")]
  UploadNotFound(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
