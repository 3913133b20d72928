//! Parser for plain-text election results files.
//!
//! Each line is a constituency name followed by repeated `votes,party_code`
//! pairs:
//!
//! ```text
//! Bedford,6643,C,5276,L,2049,LD
//! Sheffield\, Hallam,8788,C,4277,L
//! ```
//!
//! A backslash-escaped comma (`\,`) is a literal comma inside the name.
//! Pure synchronous; no I/O.
//!
//! # Quick start
//!
//! ```
//! use tallyroom_core::party::Party;
//! use tallyroom_parse::parse_file;
//!
//! let doc = parse_file("Bedford,1000,C,2000,L\n\nnot a line\n");
//! assert_eq!(doc.records.len(), 1);
//! assert_eq!(doc.records[0].votes_for(Party::Labour), Some(2000));
//! assert_eq!(doc.errors[0].line_number, 3);
//! ```

pub mod error;
mod parse;

pub use error::{LineFault, ParseError};
pub use parse::{parse_file, parse_line};
use serde::{Deserialize, Serialize};
use tallyroom_core::{party::Party, upload::LineError};

// ─── Public types
// ─────────────────────────────────────────────────────────────

/// One successfully parsed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRecord {
  /// 1-based line number in the source document.
  pub line_number:       usize,
  /// The name as written, with `\,` decoded to `,`.
  pub constituency_name: String,
  /// In line order; party codes are unique within a record.
  pub party_votes:       Vec<(Party, i64)>,
}

impl ParsedRecord {
  pub fn votes_for(&self, party: Party) -> Option<i64> {
    self
      .party_votes
      .iter()
      .find(|(p, _)| *p == party)
      .map(|(_, v)| *v)
  }
}

/// The outcome of parsing a whole document. Both lists preserve file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDocument {
  pub records: Vec<ParsedRecord>,
  pub errors:  Vec<ParseError>,
}

impl ParsedDocument {
  /// Non-blank lines seen: valid records plus parse errors.
  pub fn total_lines(&self) -> usize { self.records.len() + self.errors.len() }

  /// Parse errors in the shape recorded on an upload log.
  pub fn line_errors(&self) -> Vec<LineError> {
    self
      .errors
      .iter()
      .map(|e| LineError { line: e.line_number, error: e.message() })
      .collect()
  }
}
