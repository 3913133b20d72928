//! Line-level parse errors.
//!
//! A malformed line is data, not a failure: every variant of [`LineFault`]
//! is recovered by the file parser and reported back to the uploader.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a line could not be parsed. The `Display` text is the message shown
/// to the uploader.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineFault {
  #[error("Empty line")]
  EmptyLine,

  #[error("Too few fields: need at least constituency name and one vote/party pair")]
  TooFewFields,

  #[error("Empty constituency name")]
  EmptyConstituencyName,

  #[error(
    "Odd number of vote/party fields ({count}); expected pairs of votes and party codes"
  )]
  OddFieldCount { count: usize },

  /// `position` is the 1-based field index within the line.
  #[error("Invalid vote count '{value}' at position {position}")]
  InvalidVoteCount { value: String, position: usize },

  #[error("Negative vote count {votes} for party '{party}'")]
  NegativeVoteCount { votes: i64, party: String },

  #[error("Unknown party code '{code}'")]
  UnknownPartyCode { code: String },

  #[error("Duplicate party code '{code}' in same line")]
  DuplicatePartyCode { code: String },
}

/// A line that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("line {line_number}: {fault}")]
pub struct ParseError {
  /// 1-based.
  pub line_number: usize,
  /// The trimmed input line.
  pub raw_line:    String,
  pub fault:       LineFault,
}

impl ParseError {
  pub fn message(&self) -> String { self.fault.to_string() }
}
