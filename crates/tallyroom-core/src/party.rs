//! The fixed party registry.
//!
//! Party codes are configuration data: the set is closed and codes are
//! matched case-sensitively (`"c"` is not a party).

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Party {
  Conservative,
  Labour,
  Ukip,
  LiberalDemocrat,
  Green,
  Independent,
  ScottishNational,
}

impl Party {
  /// Every registered party, in registry order.
  pub const ALL: [Party; 7] = [
    Party::Conservative,
    Party::Labour,
    Party::Ukip,
    Party::LiberalDemocrat,
    Party::Green,
    Party::Independent,
    Party::ScottishNational,
  ];

  /// The short code used in results files, e.g. `"LD"`.
  pub fn code(self) -> &'static str {
    match self {
      Party::Conservative => "C",
      Party::Labour => "L",
      Party::Ukip => "UKIP",
      Party::LiberalDemocrat => "LD",
      Party::Green => "G",
      Party::Independent => "Ind",
      Party::ScottishNational => "SNP",
    }
  }

  pub fn display_name(self) -> &'static str {
    match self {
      Party::Conservative => "Conservative Party",
      Party::Labour => "Labour Party",
      Party::Ukip => "UKIP",
      Party::LiberalDemocrat => "Liberal Democrats",
      Party::Green => "Green Party",
      Party::Independent => "Independent",
      Party::ScottishNational => "Scottish National Party",
    }
  }

  pub fn from_code(code: &str) -> Option<Party> {
    Party::ALL.into_iter().find(|p| p.code() == code)
  }
}

/// Display name for a stored party code, falling back to the code itself.
pub fn display_name_for(code: &str) -> String {
  Party::from_code(code)
    .map(|p| p.display_name().to_owned())
    .unwrap_or_else(|| code.to_owned())
}

impl fmt::Display for Party {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.code())
  }
}

impl FromStr for Party {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Party::from_code(s).ok_or_else(|| Error::UnknownPartyCode(s.to_owned()))
  }
}

impl Serialize for Party {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.code())
  }
}

impl<'de> Deserialize<'de> for Party {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let code = String::deserialize(deserializer)?;
    code.parse().map_err(serde::de::Error::custom)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_party_round_trips_through_its_code() {
    for party in Party::ALL {
      assert_eq!(Party::from_code(party.code()), Some(party));
      assert_eq!(party.code().parse::<Party>().unwrap(), party);
    }
  }

  #[test]
  fn codes_are_case_sensitive() {
    assert_eq!(Party::from_code("c"), None);
    assert_eq!(Party::from_code("ind"), None);
    assert!(matches!("snp".parse::<Party>(), Err(Error::UnknownPartyCode(_))));
  }

  #[test]
  fn display_name_falls_back_to_code() {
    assert_eq!(display_name_for("LD"), "Liberal Democrats");
    assert_eq!(display_name_for("XYZ"), "XYZ");
  }

  #[test]
  fn serializes_as_bare_code() {
    let json = serde_json::to_string(&Party::Independent).unwrap();
    assert_eq!(json, "\"Ind\"");
    let back: Party = serde_json::from_str("\"UKIP\"").unwrap();
    assert_eq!(back, Party::Ukip);
  }
}
