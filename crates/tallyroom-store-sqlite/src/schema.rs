//! SQL schema for the Tallyroom SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS regions (
    region_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL UNIQUE,
    sort_order  INTEGER NOT NULL,
    created_at  TEXT NOT NULL
);

-- The canonical gazetteer. Never written by ingestion.
CREATE TABLE IF NOT EXISTS constituencies (
    constituency_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT NOT NULL UNIQUE,
    pcon24_code     TEXT UNIQUE,
    region_id       INTEGER REFERENCES regions(region_id),
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS upload_logs (
    upload_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    filename        TEXT,
    status          TEXT NOT NULL DEFAULT 'processing'
                    CHECK (status IN ('processing', 'completed', 'failed')),
    total_lines     INTEGER NOT NULL DEFAULT 0,
    processed_lines INTEGER NOT NULL DEFAULT 0,
    error_lines     INTEGER NOT NULL DEFAULT 0,
    errors          TEXT NOT NULL DEFAULT '[]',  -- JSON [{line, error}]
    started_at      TEXT NOT NULL,
    completed_at    TEXT,
    deleted_at      TEXT                         -- soft-delete marker
);

-- Current value per (constituency, party); mutated in place.
CREATE TABLE IF NOT EXISTS results (
    result_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    constituency_id INTEGER NOT NULL
                    REFERENCES constituencies(constituency_id) ON DELETE CASCADE,
    party_code      TEXT NOT NULL,
    votes           INTEGER NOT NULL CHECK (votes >= 0),
    upload_id       INTEGER REFERENCES upload_logs(upload_id) ON DELETE SET NULL,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL,
    UNIQUE (constituency_id, party_code)
);

-- Undo ledger. history_id is the total order; rows are only inserted or
-- purged with their upload.
CREATE TABLE IF NOT EXISTS result_history (
    history_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    result_id   INTEGER NOT NULL REFERENCES results(result_id) ON DELETE CASCADE,
    upload_id   INTEGER REFERENCES upload_logs(upload_id) ON DELETE SET NULL,
    votes       INTEGER NOT NULL CHECK (votes >= 0),
    created_at  TEXT NOT NULL
);

CREATE TRIGGER IF NOT EXISTS result_history_immutable
BEFORE UPDATE OF result_id, votes, created_at ON result_history
BEGIN
    SELECT RAISE(ABORT, 'result_history rows are immutable');
END;

CREATE INDEX IF NOT EXISTS constituencies_region_idx ON constituencies(region_id);
CREATE INDEX IF NOT EXISTS results_constituency_idx  ON results(constituency_id);
CREATE INDEX IF NOT EXISTS results_upload_idx        ON results(upload_id);
CREATE INDEX IF NOT EXISTS history_result_idx        ON result_history(result_id);
CREATE INDEX IF NOT EXISTS history_upload_idx        ON result_history(upload_id);
CREATE INDEX IF NOT EXISTS uploads_deleted_idx       ON upload_logs(deleted_at);

PRAGMA user_version = 1;
";
