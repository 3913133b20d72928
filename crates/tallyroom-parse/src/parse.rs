//! Line and file parsing.
//!
//! Pipeline:
//!   raw &str
//!     └─ split_lines()     → (line_number, &str), blanks skipped
//!          └─ parse_line() → ParsedRecord | ParseError
//!               └─ partition → ParsedDocument

use tallyroom_core::party::Party;

use crate::{
  ParsedDocument, ParsedRecord,
  error::{LineFault, ParseError},
};

/// Stands in for `\,` while the line is split on bare commas.
/// U+E000 is in the Private Use Area and never appears in real names.
const ESCAPED_COMMA: char = '\u{E000}';

// ─── Low-level helpers
// ────────────────────────────────────────────────────────

/// Split on `,` honouring `\,` escapes; each field is unescaped and trimmed.
fn split_fields(line: &str) -> Vec<String> {
  line
    .replace("\\,", &ESCAPED_COMMA.to_string())
    .split(',')
    .map(|f| f.replace(ESCAPED_COMMA, ",").trim().to_owned())
    .collect()
}

/// Line boundaries other than `\r\n`, which counts as one break.
const LINE_BREAKS: [char; 10] = [
  '\n', '\r', '\u{0B}', '\u{0C}', '\u{1C}', '\u{1D}', '\u{1E}', '\u{85}', '\u{2028}',
  '\u{2029}',
];

/// Yield `(1-based line number, line)` for every line. Any of
/// [`LINE_BREAKS`] ends a line, and `\r\n` counts once.
fn split_lines(content: &str) -> Vec<(usize, String)> {
  content
    .replace("\r\n", "\n")
    .split(LINE_BREAKS)
    .enumerate()
    .map(|(i, line)| (i + 1, line.to_owned()))
    .collect()
}

fn parse_pairs(remaining: &[String]) -> Result<Vec<(Party, i64)>, LineFault> {
  let mut party_votes: Vec<(Party, i64)> = Vec::with_capacity(remaining.len() / 2);

  for (i, pair) in remaining.chunks_exact(2).enumerate() {
    let (votes_str, code) = (&pair[0], &pair[1]);

    let votes: i64 = votes_str.parse().map_err(|_| LineFault::InvalidVoteCount {
      value:    votes_str.clone(),
      position: i * 2 + 2,
    })?;

    if votes < 0 {
      return Err(LineFault::NegativeVoteCount { votes, party: code.clone() });
    }

    let party = Party::from_code(code)
      .ok_or_else(|| LineFault::UnknownPartyCode { code: code.clone() })?;

    if party_votes.iter().any(|(p, _)| *p == party) {
      return Err(LineFault::DuplicatePartyCode { code: code.clone() });
    }

    party_votes.push((party, votes));
  }

  Ok(party_votes)
}

// ─── Public API
// ───────────────────────────────────────────────────────────────

/// Parse one raw line. `line_number` is 1-based and is carried into the
/// returned record or error.
pub fn parse_line(raw_line: &str, line_number: usize) -> Result<ParsedRecord, ParseError> {
  let raw_line = raw_line.trim();
  let fail = |fault| ParseError { line_number, raw_line: raw_line.to_owned(), fault };

  if raw_line.is_empty() {
    return Err(fail(LineFault::EmptyLine));
  }

  let mut fields = split_fields(raw_line);
  if fields.len() < 3 {
    return Err(fail(LineFault::TooFewFields));
  }

  let remaining = fields.split_off(1);
  let constituency_name = fields.swap_remove(0);
  if constituency_name.is_empty() {
    return Err(fail(LineFault::EmptyConstituencyName));
  }

  if remaining.len() % 2 != 0 {
    return Err(fail(LineFault::OddFieldCount { count: remaining.len() }));
  }

  let party_votes = parse_pairs(&remaining).map_err(fail)?;

  Ok(ParsedRecord { line_number, constituency_name, party_votes })
}

/// Parse a whole document. Blank lines are skipped silently; every other
/// line yields either a record or an error, so no line fails the document.
pub fn parse_file(content: &str) -> ParsedDocument {
  let mut doc = ParsedDocument::default();

  for (line_number, line) in split_lines(content) {
    if line.trim().is_empty() {
      continue;
    }
    match parse_line(&line, line_number) {
      Ok(record) => doc.records.push(record),
      Err(error) => doc.errors.push(error),
    }
  }

  doc
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn ok(line: &str) -> ParsedRecord {
    parse_line(line, 1).expect("line should parse")
  }

  fn fault(line: &str) -> LineFault {
    parse_line(line, 1).expect_err("line should fail").fault
  }

  // ── parse_line ────────────────────────────────────────────────────────────

  #[test]
  fn normal_line_six_parties() {
    let r = ok("Bedford,6643,C,5276,L,2049,LD,266,Ind,2531,UKIP,2671,G");
    assert_eq!(r.constituency_name, "Bedford");
    assert_eq!(r.party_votes, vec![
      (Party::Conservative, 6643),
      (Party::Labour, 5276),
      (Party::LiberalDemocrat, 2049),
      (Party::Independent, 266),
      (Party::Ukip, 2531),
      (Party::Green, 2671),
    ]);
  }

  #[test]
  fn line_with_snp_seven_parties() {
    let r = ok(
      "Edinburgh East,5678,C,12345,L,1000,LD,500,Ind,300,UKIP,800,G,9000,SNP",
    );
    assert_eq!(r.party_votes.len(), 7);
    assert_eq!(r.votes_for(Party::ScottishNational), Some(9000));
  }

  #[test]
  fn escaped_comma_in_name() {
    let r = ok("Sheffield\\, Hallam,8788,C,4277,L");
    assert_eq!(r.constituency_name, "Sheffield, Hallam");
    assert_eq!(r.votes_for(Party::Conservative), Some(8788));
    assert_eq!(r.votes_for(Party::Labour), Some(4277));
  }

  #[test]
  fn several_escaped_commas_in_name() {
    let r = ok(
      "Inverness\\, Nairn\\, Badenoch and Strathspey,1000,C,2000,L,5000,SNP",
    );
    assert_eq!(
      r.constituency_name,
      "Inverness, Nairn, Badenoch and Strathspey"
    );
  }

  #[test]
  fn fields_are_trimmed() {
    let r = ok("  Bedford ,  100 , C ,200,  L  ");
    assert_eq!(r.constituency_name, "Bedford");
    assert_eq!(r.party_votes, vec![(Party::Conservative, 100), (Party::Labour, 200)]);
  }

  #[test]
  fn zero_votes_are_valid() {
    assert_eq!(ok("Bedford,0,G").votes_for(Party::Green), Some(0));
  }

  #[test]
  fn empty_line() {
    assert_eq!(fault(""), LineFault::EmptyLine);
    assert_eq!(fault("   \t "), LineFault::EmptyLine);
    assert_eq!(parse_line("", 1).unwrap_err().message(), "Empty line");
  }

  #[test]
  fn too_few_fields() {
    assert_eq!(fault("JustAName,100"), LineFault::TooFewFields);
    assert_eq!(fault("Bedford"), LineFault::TooFewFields);
    assert!(parse_line("Bedford", 1).unwrap_err().message().starts_with("Too few fields"));
  }

  #[test]
  fn empty_constituency_name() {
    assert_eq!(fault(" ,100,C"), LineFault::EmptyConstituencyName);
  }

  #[test]
  fn odd_number_of_fields() {
    let f = fault("Bedford,6643,C,5276");
    assert_eq!(f, LineFault::OddFieldCount { count: 3 });
    assert!(f.to_string().contains("(3)"));
  }

  #[test]
  fn non_numeric_votes_report_value_and_position() {
    let f = fault("Bedford,100,C,lots,L");
    assert_eq!(f, LineFault::InvalidVoteCount { value: "lots".into(), position: 4 });
    assert_eq!(f.to_string(), "Invalid vote count 'lots' at position 4");
  }

  #[test]
  fn oversized_votes_are_invalid() {
    assert!(matches!(
      fault("Bedford,99999999999999999999,C"),
      LineFault::InvalidVoteCount { position: 2, .. }
    ));
  }

  #[test]
  fn negative_votes_rejected() {
    assert_eq!(
      fault("Bedford,-5,C"),
      LineFault::NegativeVoteCount { votes: -5, party: "C".into() }
    );
  }

  #[test]
  fn unknown_party_code_rejected() {
    let f = fault("Bedford,100,XYZ");
    assert_eq!(f, LineFault::UnknownPartyCode { code: "XYZ".into() });
    assert_eq!(f.to_string(), "Unknown party code 'XYZ'");
    // Codes are case-sensitive.
    assert!(matches!(fault("Bedford,100,c"), LineFault::UnknownPartyCode { .. }));
  }

  #[test]
  fn unknown_party_after_valid_pair_yields_no_partial_record() {
    let err = parse_line("Bedford,100,C,200,Q", 7).unwrap_err();
    assert_eq!(err.line_number, 7);
    assert_eq!(err.raw_line, "Bedford,100,C,200,Q");
  }

  #[test]
  fn duplicate_party_code_rejected() {
    assert_eq!(
      fault("Bedford,100,C,200,C"),
      LineFault::DuplicatePartyCode { code: "C".into() }
    );
  }

  #[test]
  fn parsing_is_deterministic() {
    let line = "Sheffield\\, Hallam,8788,C,4277,L";
    assert_eq!(parse_line(line, 3), parse_line(line, 3));
  }

  #[test]
  fn parse_error_serialises_with_kind() {
    let err = parse_line("Bedford,1,C,1,C", 2).unwrap_err();
    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["line_number"], 2);
    assert_eq!(json["fault"]["kind"], "duplicate_party_code");
  }

  // ── parse_file ────────────────────────────────────────────────────────────

  #[test]
  fn file_skips_blank_lines_and_keeps_true_line_numbers() {
    let doc = parse_file("Bedford,100,C\n\n   \nBad line\nOxford East,200,L\n");
    assert_eq!(doc.records.len(), 2);
    assert_eq!(doc.records[0].line_number, 1);
    assert_eq!(doc.records[1].line_number, 5);
    assert_eq!(doc.errors.len(), 1);
    assert_eq!(doc.errors[0].line_number, 4);
    assert_eq!(doc.total_lines(), 3);
  }

  #[test]
  fn file_with_crlf_and_lone_cr() {
    let doc = parse_file("Bedford,100,C\r\nOxford East,200,L\rCambridge,1,G");
    let lines: Vec<usize> = doc.records.iter().map(|r| r.line_number).collect();
    assert_eq!(lines, [1, 2, 3]);
    assert!(doc.errors.is_empty());
  }

  #[test]
  fn file_with_unicode_and_control_line_breaks() {
    let doc = parse_file(
      "Bedford,1,C\u{0B}Luton South,2,L\u{0C}Oxford East,3,G\u{1E}Ynys Môn,4,C\u{85}Hull,5,L\u{2028}Derby,6,C\u{2029}Leeds,7,L",
    );
    let lines: Vec<usize> = doc.records.iter().map(|r| r.line_number).collect();
    assert_eq!(lines, [1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(doc.records[6].constituency_name, "Leeds");
    assert!(doc.errors.is_empty());
  }

  #[test]
  fn file_of_only_errors() {
    let doc = parse_file("one\ntwo,1\nthree,1,NOPE");
    assert!(doc.records.is_empty());
    assert_eq!(doc.errors.len(), 3);
    let errors = doc.line_errors();
    assert_eq!(errors[2].line, 3);
    assert_eq!(errors[2].error, "Unknown party code 'NOPE'");
  }

  #[test]
  fn empty_file() {
    let doc = parse_file("");
    assert_eq!(doc.total_lines(), 0);
  }
}
