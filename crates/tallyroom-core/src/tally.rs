//! Vote counts and their undo ledger.
//!
//! A [`ResultRecord`] holds the *current* vote count for one
//! (constituency, party) pair and is mutated in place. Every write to it is
//! also appended to the history ledger as a [`HistoryEntry`]; history rows
//! are never updated, only inserted or purged when their upload is rolled
//! back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::party::Party;

/// The current vote count for one party within one constituency.
/// At most one exists per (constituency, party) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
  pub result_id:       i64,
  pub constituency_id: i64,
  pub party:           Party,
  pub votes:           i64,
  /// The last writer. `None` for results predating upload tracking.
  pub upload_id:       Option<i64>,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

/// One ledger entry: the value a result took when an upload wrote it.
///
/// `history_id` is a monotonic sequence and is the ledger's total order;
/// `created_at` is informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
  pub history_id: i64,
  pub result_id:  i64,
  pub upload_id:  Option<i64>,
  pub votes:      i64,
  pub created_at: DateTime<Utc>,
}
