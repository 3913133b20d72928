//! Read queries. Every function takes a plain `&Connection` so it can run
//! either standalone or inside an engine's open transaction.

use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension as _, params, params_from_iter};
use tallyroom_core::{
  geography::Constituency,
  party::Party,
  store::{
    ConstituencyQuery, MAX_CONSTITUENCY_PAGE_SIZE, MAX_UPLOAD_PAGE_SIZE, SortBy,
    SortDir, UploadQuery,
  },
  tally::{HistoryEntry, ResultRecord},
  upload::{UploadLog, UploadStats},
  view::{
    ConstituencyDetail, ConstituencyPage, ConstituencySummary, NationalTotals,
    RegionConstituency, RegionDetail, RegionSummary, UploadPage, sole_winner,
  },
};

use crate::{
  Result,
  encode::{
    CONSTITUENCY_COLUMNS, HISTORY_COLUMNS, RESULT_COLUMNS, RawConstituency, RawHistory,
    RawResult, RawUpload, UPLOAD_COLUMNS,
  },
};

/// `%term%` with LIKE metacharacters escaped by `\`.
fn like_pattern(term: &str) -> String {
  let escaped = term
    .replace('\\', "\\\\")
    .replace('%', "\\%")
    .replace('_', "\\_");
  format!("%{escaped}%")
}

fn page_bounds(page: usize, page_size: usize, max: usize) -> (usize, usize) {
  (page.max(1), page_size.clamp(1, max))
}

// ─── Uploads ─────────────────────────────────────────────────────────────────

pub fn upload_by_id(conn: &Connection, upload_id: i64) -> Result<Option<UploadLog>> {
  let sql = format!("SELECT {UPLOAD_COLUMNS} FROM upload_logs WHERE upload_id = ?1");
  conn
    .query_row(&sql, params![upload_id], RawUpload::from_row)
    .optional()?
    .map(RawUpload::into_upload)
    .transpose()
}

pub fn upload_is_live(conn: &Connection, upload_id: i64) -> Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM upload_logs WHERE upload_id = ?1 AND deleted_at IS NULL",
        params![upload_id],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

pub fn list_uploads(conn: &Connection, query: &UploadQuery) -> Result<UploadPage> {
  let (page, page_size) = page_bounds(query.page, query.page_size, MAX_UPLOAD_PAGE_SIZE);
  let status = query.status.map(|s| s.as_str());
  let pattern = query.search.as_deref().map(like_pattern);

  let filter = "deleted_at IS NULL
     AND (?1 IS NULL OR status = ?1)
     AND (?2 IS NULL OR filename LIKE ?2 ESCAPE '\\')";

  let total: i64 = conn.query_row(
    &format!("SELECT COUNT(*) FROM upload_logs WHERE {filter}"),
    params![status, pattern],
    |r| r.get(0),
  )?;

  let sql = format!(
    "SELECT {UPLOAD_COLUMNS} FROM upload_logs WHERE {filter}
     ORDER BY upload_id DESC LIMIT ?3 OFFSET ?4"
  );
  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(
      params![status, pattern, page_size as i64, ((page - 1) * page_size) as i64],
      RawUpload::from_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(UploadPage {
    total: total as usize,
    page,
    page_size,
    uploads: raws.into_iter().map(RawUpload::into_upload).collect::<Result<_>>()?,
  })
}

pub fn upload_stats(conn: &Connection) -> Result<UploadStats> {
  let (total, completed, failed, lines): (i64, i64, i64, i64) = conn.query_row(
    "SELECT COUNT(*),
            COALESCE(SUM(status = 'completed'), 0),
            COALESCE(SUM(status = 'failed'), 0),
            COALESCE(SUM(processed_lines), 0)
     FROM upload_logs
     WHERE deleted_at IS NULL",
    [],
    |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
  )?;

  let success_rate = if total > 0 {
    ((completed as f64 / total as f64) * 100.0 * 100.0).round() / 100.0
  } else {
    0.0
  };

  Ok(UploadStats {
    total_uploads: total as usize,
    completed: completed as usize,
    failed: failed as usize,
    success_rate,
    total_lines_processed: lines as usize,
  })
}

// ─── Constituencies & results ────────────────────────────────────────────────

/// Every canonical constituency, ordered by id.
pub fn constituency_rows(conn: &Connection) -> Result<Vec<Constituency>> {
  let sql = format!("SELECT {CONSTITUENCY_COLUMNS} FROM constituencies ORDER BY constituency_id");
  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map([], RawConstituency::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawConstituency::into_constituency).collect()
}

pub fn results_for_constituency(
  conn: &Connection,
  constituency_id: i64,
) -> Result<Vec<ResultRecord>> {
  let sql = format!(
    "SELECT {RESULT_COLUMNS} FROM results WHERE constituency_id = ?1 ORDER BY result_id"
  );
  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(params![constituency_id], RawResult::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawResult::into_result).collect()
}

/// All results, grouped by constituency id.
fn results_by_constituency(conn: &Connection) -> Result<HashMap<i64, Vec<ResultRecord>>> {
  let sql = format!("SELECT {RESULT_COLUMNS} FROM results ORDER BY result_id");
  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map([], RawResult::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut grouped: HashMap<i64, Vec<ResultRecord>> = HashMap::new();
  for raw in raws {
    let record = raw.into_result()?;
    grouped.entry(record.constituency_id).or_default().push(record);
  }
  Ok(grouped)
}

pub fn history_for_result(conn: &Connection, result_id: i64) -> Result<Vec<HistoryEntry>> {
  let sql = format!(
    "SELECT {HISTORY_COLUMNS} FROM result_history WHERE result_id = ?1 ORDER BY history_id"
  );
  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(params![result_id], RawHistory::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawHistory::into_history).collect()
}

fn region_names(conn: &Connection) -> Result<HashMap<i64, String>> {
  let mut stmt = conn.prepare("SELECT region_id, name FROM regions")?;
  let rows = stmt
    .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
    .collect::<rusqlite::Result<HashMap<i64, String>>>()?;
  Ok(rows)
}

fn winner_of(results: Option<&Vec<ResultRecord>>) -> Option<Party> {
  sole_winner(results.into_iter().flatten().map(|r| (r.party, r.votes)))
}

pub fn constituency_detail(
  conn: &Connection,
  constituency_id: i64,
) -> Result<Option<ConstituencyDetail>> {
  let sql = format!(
    "SELECT {CONSTITUENCY_COLUMNS} FROM constituencies WHERE constituency_id = ?1"
  );
  let Some(raw) = conn
    .query_row(&sql, params![constituency_id], RawConstituency::from_row)
    .optional()?
  else {
    return Ok(None);
  };
  let constituency = raw.into_constituency()?;

  let region_name: Option<String> = match constituency.region_id {
    Some(id) => conn
      .query_row("SELECT name FROM regions WHERE region_id = ?1", params![id], |r| r.get(0))
      .optional()?,
    None => None,
  };

  let results = results_for_constituency(conn, constituency_id)?;
  Ok(Some(ConstituencyDetail::build(constituency, region_name, &results)))
}

pub fn list_constituencies(
  conn: &Connection,
  query: &ConstituencyQuery,
) -> Result<ConstituencyPage> {
  let (page, page_size) =
    page_bounds(query.page, query.page_size, MAX_CONSTITUENCY_PAGE_SIZE);

  // Build WHERE clause dynamically.
  let mut conds: Vec<String> = vec![];
  let mut args: Vec<rusqlite::types::Value> = vec![];
  if let Some(term) = query.search.as_deref().filter(|t| !t.is_empty()) {
    args.push(like_pattern(term).into());
    conds.push(format!("name LIKE ?{} ESCAPE '\\'", args.len()));
  }
  if !query.region_ids.is_empty() {
    let mut slots = Vec::with_capacity(query.region_ids.len());
    for id in &query.region_ids {
      args.push((*id).into());
      slots.push(format!("?{}", args.len()));
    }
    conds.push(format!("region_id IN ({})", slots.join(", ")));
  }
  let where_clause = if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  };

  let sql = format!("SELECT {CONSTITUENCY_COLUMNS} FROM constituencies {where_clause}");
  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(params_from_iter(args), RawConstituency::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let regions = region_names(conn)?;
  let mut results = results_by_constituency(conn)?;

  let mut details: Vec<ConstituencyDetail> = raws
    .into_iter()
    .map(|raw| {
      let c = raw.into_constituency()?;
      let region_name = c.region_id.and_then(|id| regions.get(&id).cloned());
      let rows = results.remove(&c.constituency_id).unwrap_or_default();
      Ok(ConstituencyDetail::build(c, region_name, &rows))
    })
    .collect::<Result<_>>()?;

  details.sort_by(|a, b| {
    let primary = match query.sort_by {
      SortBy::Name => std::cmp::Ordering::Equal,
      SortBy::TotalVotes => a.total_votes.cmp(&b.total_votes),
      SortBy::WinningParty => a
        .winning_party_code
        .map(Party::code)
        .cmp(&b.winning_party_code.map(Party::code)),
    };
    primary.then_with(|| a.name.cmp(&b.name))
  });
  if query.sort_dir == SortDir::Desc {
    details.reverse();
  }

  let total = details.len();
  let constituencies = details
    .into_iter()
    .skip((page - 1) * page_size)
    .take(page_size)
    .collect();

  Ok(ConstituencyPage { total, page, page_size, constituencies })
}

pub fn constituency_summaries(conn: &Connection) -> Result<Vec<ConstituencySummary>> {
  let regions = region_names(conn)?;
  let results = results_by_constituency(conn)?;

  let mut summaries: Vec<ConstituencySummary> = constituency_rows(conn)?
    .into_iter()
    .map(|c| ConstituencySummary {
      winning_party_code: winner_of(results.get(&c.constituency_id)),
      region_name: c.region_id.and_then(|id| regions.get(&id).cloned()),
      constituency_id: c.constituency_id,
      name: c.name,
      pcon24_code: c.pcon24_code,
      region_id: c.region_id,
    })
    .collect();
  summaries.sort_by(|a, b| a.name.cmp(&b.name));
  Ok(summaries)
}

// ─── Totals ──────────────────────────────────────────────────────────────────

pub fn totals(conn: &Connection) -> Result<NationalTotals> {
  let total_constituencies: i64 =
    conn.query_row("SELECT COUNT(*) FROM constituencies", [], |r| r.get(0))?;

  let mut stmt = conn.prepare(
    "SELECT r.constituency_id, r.party_code, r.votes
     FROM results r
     LEFT JOIN upload_logs u ON u.upload_id = r.upload_id
     WHERE r.upload_id IS NULL OR u.deleted_at IS NULL",
  )?;
  let rows = stmt
    .query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?, r.get::<_, i64>(2)?)))?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let rows = rows
    .into_iter()
    .map(|(cid, code, votes)| Ok((cid, code.parse::<Party>()?, votes)))
    .collect::<Result<Vec<_>>>()?;

  Ok(NationalTotals::tally(total_constituencies as usize, rows))
}

// ─── Regions ─────────────────────────────────────────────────────────────────

pub fn list_regions(conn: &Connection) -> Result<Vec<RegionSummary>> {
  let mut stmt = conn.prepare(
    "SELECT g.region_id, g.name, g.sort_order, COUNT(c.constituency_id)
     FROM regions g
     LEFT JOIN constituencies c ON c.region_id = g.region_id
     GROUP BY g.region_id
     ORDER BY g.sort_order ASC, g.region_id ASC",
  )?;
  let regions = stmt
    .query_map([], |r| {
      Ok(RegionSummary {
        region_id:          r.get(0)?,
        name:               r.get(1)?,
        sort_order:         r.get(2)?,
        constituency_count: r.get::<_, i64>(3)? as usize,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(regions)
}

pub fn region_detail(conn: &Connection, region_id: i64) -> Result<Option<RegionDetail>> {
  let Some(name) = conn
    .query_row(
      "SELECT name FROM regions WHERE region_id = ?1",
      params![region_id],
      |r| r.get::<_, String>(0),
    )
    .optional()?
  else {
    return Ok(None);
  };

  let sql = format!(
    "SELECT {CONSTITUENCY_COLUMNS} FROM constituencies WHERE region_id = ?1 ORDER BY name"
  );
  let mut stmt = conn.prepare(&sql)?;
  let members = stmt
    .query_map(params![region_id], RawConstituency::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let results = results_by_constituency(conn)?;

  let mut pcon24_codes = Vec::new();
  let mut constituencies = Vec::with_capacity(members.len());
  for raw in members {
    if let Some(code) = &raw.pcon24_code {
      pcon24_codes.push(code.clone());
    }
    constituencies.push(RegionConstituency {
      winning_party_code: winner_of(results.get(&raw.constituency_id)),
      constituency_id:    raw.constituency_id,
      name:               raw.name,
      pcon24_code:        raw.pcon24_code,
    });
  }

  Ok(Some(RegionDetail { region_id, name, pcon24_codes, constituencies }))
}
