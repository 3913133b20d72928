//! Canonical reference data: regions and constituencies.
//!
//! Constituencies form the gazetteer that uploaded names are matched against.
//! They are seeded by administration, never created by ingestion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A grouping of constituencies (e.g. an ITL1 region).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
  pub region_id:  i64,
  pub name:       String,
  pub sort_order: i64,
  pub created_at: DateTime<Utc>,
}

/// A canonical electoral district.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constituency {
  pub constituency_id: i64,
  /// Unique canonical name, e.g. `"Ynys Môn"`.
  pub name:            String,
  /// Optional geographic code (PCON24), e.g. `"W07000112"`.
  pub pcon24_code:     Option<String>,
  pub region_id:       Option<i64>,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

/// Input for [`ElectionStore::add_constituency`](crate::store::ElectionStore::add_constituency).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewConstituency {
  pub name:        String,
  pub pcon24_code: Option<String>,
  pub region_id:   Option<i64>,
}

impl NewConstituency {
  pub fn named(name: impl Into<String>) -> Self {
    Self { name: name.into(), ..Self::default() }
  }
}

/// One region and its constituencies, for
/// [`ElectionStore::seed_regions`](crate::store::ElectionStore::seed_regions).
/// Each constituency's `region_id` is replaced by the new region's id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionSeed {
  pub name:           String,
  pub sort_order:     i64,
  pub constituencies: Vec<NewConstituency>,
}
