//! Error types for `tallyroom-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown party code: {0:?}")]
  UnknownPartyCode(String),

  #[error("unknown upload status: {0:?}")]
  UnknownUploadStatus(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
