//! SQL migration definitions for the fetch cache database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a set of SQL statements executed within a transaction.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: fetch_cache",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Harvested page payloads, one row per normalized URL.
-- Expired rows are never swept; `get` filters them lazily.
CREATE TABLE IF NOT EXISTS fetch_cache (
    key        TEXT PRIMARY KEY,
    url        TEXT NOT NULL,
    title      TEXT,
    content    TEXT NOT NULL,
    fetched_at TEXT NOT NULL,
    stored_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_fetch_cache_stored_at ON fetch_cache(stored_at);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
