//! Seeding the canonical constituency register from a JSON gazetteer.
//!
//! ```json
//! {
//!   "region_order": ["North East", "London"],
//!   "regions": {
//!     "London": [{ "name": "Bermondsey and Old Southwark", "pcon24_code": "E14001084" }]
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;
use tallyroom_core::{
  geography::{NewConstituency, RegionSeed},
  store::ElectionStore,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Gazetteer {
  /// Display order of regions; position becomes `sort_order`.
  #[serde(default)]
  pub region_order: Vec<String>,
  #[serde(default)]
  pub regions:      BTreeMap<String, Vec<GazetteerEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GazetteerEntry {
  pub name:        String,
  #[serde(default)]
  pub pcon24_code: Option<String>,
}

impl Gazetteer {
  pub fn from_json(s: &str) -> serde_json::Result<Self> { serde_json::from_str(s) }

  /// Regions in seeding order: `region_order` first, then any region that
  /// only appears under `regions`, alphabetically.
  fn ordered_regions(&self) -> Vec<&str> {
    let mut order: Vec<&str> = self.region_order.iter().map(String::as_str).collect();
    for name in self.regions.keys() {
      if !order.contains(&name.as_str()) {
        order.push(name);
      }
    }
    order
  }

  /// Every region in seeding order, with its constituencies.
  pub fn region_seeds(&self) -> Vec<RegionSeed> {
    self
      .ordered_regions()
      .into_iter()
      .enumerate()
      .map(|(sort_order, name)| RegionSeed {
        name:           name.to_owned(),
        sort_order:     sort_order as i64,
        constituencies: self
          .regions
          .get(name)
          .into_iter()
          .flatten()
          .map(|entry| NewConstituency {
            name:        entry.name.clone(),
            pcon24_code: entry.pcon24_code.clone(),
            region_id:   None,
          })
          .collect(),
      })
      .collect()
  }
}

/// Load `gazetteer` into an empty store.
///
/// Returns the number of constituencies added; zero when the store already
/// holds constituencies, in which case nothing is written. The whole
/// gazetteer lands in one transaction, so a failed seed leaves the store
/// empty and the next start tries again.
pub async fn seed_gazetteer<S>(store: &S, gazetteer: &Gazetteer) -> Result<usize, S::Error>
where
  S: ElectionStore,
{
  let added = store.seed_regions(gazetteer.region_seeds()).await?;
  if added == 0 {
    tracing::debug!("constituencies already present; skipping gazetteer");
  } else {
    tracing::info!(constituencies = added, "seeded gazetteer");
  }
  Ok(added)
}
