//! Computed read models. Never stored; always derived from current results.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::{
  geography::Constituency,
  party::Party,
  tally::ResultRecord,
  upload::UploadLog,
};

fn round2(x: f64) -> f64 { (x * 100.0).round() / 100.0 }

/// The party with the strictly highest vote count. Ties, and an empty
/// result set, have no winner.
pub fn sole_winner<I>(votes: I) -> Option<Party>
where
  I: IntoIterator<Item = (Party, i64)>,
{
  let mut best: Option<(Party, i64)> = None;
  let mut tied = false;
  for (party, n) in votes {
    match best {
      Some((_, max)) if n < max => {}
      Some((_, max)) if n == max => tied = true,
      _ => {
        best = Some((party, n));
        tied = false;
      }
    }
  }
  if tied { None } else { best.map(|(p, _)| p) }
}

// ─── Constituencies ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyResult {
  pub party_code: Party,
  pub party_name: String,
  pub votes:      i64,
  /// Share of the constituency total, rounded to 2 dp.
  pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstituencyDetail {
  pub constituency_id:    i64,
  pub name:               String,
  pub pcon24_code:        Option<String>,
  pub region_id:          Option<i64>,
  pub region_name:        Option<String>,
  pub total_votes:        i64,
  pub winning_party_code: Option<Party>,
  pub winning_party_name: Option<String>,
  /// Sorted by votes, highest first.
  pub parties:            Vec<PartyResult>,
}

impl ConstituencyDetail {
  pub fn build(
    constituency: Constituency,
    region_name: Option<String>,
    results: &[ResultRecord],
  ) -> Self {
    let total_votes: i64 = results.iter().map(|r| r.votes).sum();

    let mut parties: Vec<PartyResult> = results
      .iter()
      .map(|r| PartyResult {
        party_code: r.party,
        party_name: r.party.display_name().to_owned(),
        votes:      r.votes,
        percentage: if total_votes > 0 {
          round2(r.votes as f64 / total_votes as f64 * 100.0)
        } else {
          0.0
        },
      })
      .collect();
    parties.sort_by(|a, b| b.votes.cmp(&a.votes).then(a.party_code.cmp(&b.party_code)));

    let winner = sole_winner(results.iter().map(|r| (r.party, r.votes)));

    Self {
      constituency_id: constituency.constituency_id,
      name: constituency.name,
      pcon24_code: constituency.pcon24_code,
      region_id: constituency.region_id,
      region_name,
      total_votes,
      winning_party_code: winner,
      winning_party_name: winner.map(|p| p.display_name().to_owned()),
      parties,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstituencyPage {
  /// Matching constituencies before pagination.
  pub total:          usize,
  pub page:           usize,
  pub page_size:      usize,
  pub constituencies: Vec<ConstituencyDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstituencySummary {
  pub constituency_id:    i64,
  pub name:               String,
  pub pcon24_code:        Option<String>,
  pub region_id:          Option<i64>,
  pub region_name:        Option<String>,
  pub winning_party_code: Option<Party>,
}

// ─── National totals ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyTotals {
  pub party_code:  Party,
  pub party_name:  String,
  pub total_votes: i64,
  pub seats:       usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NationalTotals {
  pub total_constituencies: usize,
  pub total_votes:          i64,
  /// Sorted by seats, then votes, highest first.
  pub parties:              Vec<PartyTotals>,
}

impl NationalTotals {
  /// Tally `(constituency_id, party, votes)` rows. A seat goes to the sole
  /// winner of each constituency; tied constituencies award no seat.
  pub fn tally<I>(total_constituencies: usize, rows: I) -> Self
  where
    I: IntoIterator<Item = (i64, Party, i64)>,
  {
    let mut votes: BTreeMap<Party, i64> = BTreeMap::new();
    let mut by_constituency: HashMap<i64, Vec<(Party, i64)>> = HashMap::new();

    for (constituency_id, party, n) in rows {
      *votes.entry(party).or_default() += n;
      by_constituency.entry(constituency_id).or_default().push((party, n));
    }

    let mut seats: BTreeMap<Party, usize> = BTreeMap::new();
    for results in by_constituency.into_values() {
      if let Some(winner) = sole_winner(results) {
        *seats.entry(winner).or_default() += 1;
      }
    }

    let mut parties: Vec<PartyTotals> = votes
      .iter()
      .map(|(&party, &total_votes)| PartyTotals {
        party_code: party,
        party_name: party.display_name().to_owned(),
        total_votes,
        seats: seats.get(&party).copied().unwrap_or(0),
      })
      .collect();
    parties.sort_by(|a, b| {
      b.seats
        .cmp(&a.seats)
        .then(b.total_votes.cmp(&a.total_votes))
        .then(a.party_code.cmp(&b.party_code))
    });

    Self {
      total_constituencies,
      total_votes: votes.values().sum(),
      parties,
    }
  }
}

// ─── Regions ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSummary {
  pub region_id:          i64,
  pub name:               String,
  pub sort_order:         i64,
  pub constituency_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionConstituency {
  pub constituency_id:    i64,
  pub name:               String,
  pub pcon24_code:        Option<String>,
  pub winning_party_code: Option<Party>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionDetail {
  pub region_id:      i64,
  pub name:           String,
  pub pcon24_codes:   Vec<String>,
  /// Ordered by name.
  pub constituencies: Vec<RegionConstituency>,
}

// ─── Uploads ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPage {
  pub total:     usize,
  pub page:      usize,
  pub page_size: usize,
  /// Newest first.
  pub uploads:   Vec<UploadLog>,
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  fn result(party: Party, votes: i64) -> ResultRecord {
    let now = Utc::now();
    ResultRecord {
      result_id: 0,
      constituency_id: 1,
      party,
      votes,
      upload_id: None,
      created_at: now,
      updated_at: now,
    }
  }

  fn bedford() -> Constituency {
    let now = Utc::now();
    Constituency {
      constituency_id: 1,
      name:            "Bedford".into(),
      pcon24_code:     Some("E14001073".into()),
      region_id:       None,
      created_at:      now,
      updated_at:      now,
    }
  }

  #[test]
  fn sole_winner_requires_a_strict_maximum() {
    use Party::*;
    assert_eq!(sole_winner([(Conservative, 10), (Labour, 20)]), Some(Labour));
    assert_eq!(sole_winner([(Conservative, 20), (Labour, 20)]), None);
    assert_eq!(
      sole_winner([(Conservative, 20), (Labour, 20), (Green, 30)]),
      Some(Green)
    );
    assert_eq!(sole_winner(Vec::new()), None);
  }

  #[test]
  fn detail_computes_shares_and_orders_parties() {
    let detail = ConstituencyDetail::build(
      bedford(),
      None,
      &[result(Party::Conservative, 1000), result(Party::Labour, 3000)],
    );
    assert_eq!(detail.total_votes, 4000);
    assert_eq!(detail.winning_party_code, Some(Party::Labour));
    assert_eq!(detail.winning_party_name.as_deref(), Some("Labour Party"));
    assert_eq!(detail.parties[0].party_code, Party::Labour);
    assert_eq!(detail.parties[0].percentage, 75.0);
    assert_eq!(detail.parties[1].percentage, 25.0);
  }

  #[test]
  fn detail_without_votes_has_zero_shares() {
    let detail =
      ConstituencyDetail::build(bedford(), None, &[result(Party::Green, 0)]);
    assert_eq!(detail.total_votes, 0);
    assert_eq!(detail.parties[0].percentage, 0.0);
    assert_eq!(detail.winning_party_code, Some(Party::Green));
  }

  #[test]
  fn totals_award_seats_to_sole_winners_only() {
    use Party::*;
    let totals = NationalTotals::tally(3, [
      (1, Conservative, 100),
      (1, Labour, 50),
      (2, Conservative, 10),
      (2, Labour, 10),
      (3, Labour, 70),
    ]);
    assert_eq!(totals.total_constituencies, 3);
    assert_eq!(totals.total_votes, 240);
    let c = totals.parties.iter().find(|p| p.party_code == Conservative).unwrap();
    let l = totals.parties.iter().find(|p| p.party_code == Labour).unwrap();
    assert_eq!((c.seats, c.total_votes), (1, 110));
    assert_eq!((l.seats, l.total_votes), (1, 130));
    // Equal seats: more votes first.
    assert_eq!(totals.parties[0].party_code, Labour);
  }
}
