//! Resolve free-text constituency names against the canonical gazetteer.
//!
//! A [`ConstituencyMatcher`] is an immutable snapshot built once per
//! ingestion. Lookups try, in order:
//!
//! 1. exact byte-for-byte match,
//! 2. case-insensitive match,
//! 3. normalised match (see [`normalize`]).
//!
//! The first tier that hits wins. There is no prefix or substring
//! fuzziness: a name that does not resolve through one of these tiers is a
//! miss.

use std::collections::HashMap;

use unicode_general_category::{GeneralCategory, get_general_category};
use unicode_normalization::UnicodeNormalization;

use crate::geography::Constituency;

/// Lowercase, drop commas, collapse interior whitespace, trim, then strip
/// nonspacing marks (category Mn) after NFD decomposition. Spacing and
/// enclosing marks are kept.
///
/// `"Birmingham, Hall Green"` and `"BIRMINGHAM HALL  GREEN"` both normalise to
/// `"birmingham hall green"`; `"Ynys Môn"` normalises to `"ynys mon"`.
pub fn normalize(name: &str) -> String {
  let lowered = name.to_lowercase().replace(',', "");
  let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
  collapsed
    .nfd()
    .filter(|c| !matches!(get_general_category(*c), GeneralCategory::NonspacingMark))
    .collect()
}

#[derive(Debug, Clone)]
pub struct ConstituencyMatcher {
  constituencies: Vec<Constituency>,
  exact:          HashMap<String, usize>,
  lowercase:      HashMap<String, usize>,
  normalized:     HashMap<String, usize>,
}

impl ConstituencyMatcher {
  /// Index `constituencies`. When two names collide on the case-insensitive
  /// or normalised tier the lowest `constituency_id` keeps the key.
  pub fn new(mut constituencies: Vec<Constituency>) -> Self {
    constituencies.sort_by_key(|c| c.constituency_id);

    let mut exact = HashMap::with_capacity(constituencies.len());
    let mut lowercase = HashMap::with_capacity(constituencies.len());
    let mut normalized = HashMap::with_capacity(constituencies.len());

    for (idx, c) in constituencies.iter().enumerate() {
      exact.entry(c.name.clone()).or_insert(idx);
      lowercase.entry(c.name.to_lowercase()).or_insert(idx);
      normalized.entry(normalize(&c.name)).or_insert(idx);
    }

    Self { constituencies, exact, lowercase, normalized }
  }

  pub fn find(&self, raw_name: &str) -> Option<&Constituency> {
    self
      .exact
      .get(raw_name)
      .or_else(|| self.lowercase.get(&raw_name.to_lowercase()))
      .or_else(|| self.normalized.get(&normalize(raw_name)))
      .map(|&idx| &self.constituencies[idx])
  }

  pub fn len(&self) -> usize { self.constituencies.len() }

  pub fn is_empty(&self) -> bool { self.constituencies.is_empty() }
}
