//! libSQL-backed fetch cache with lazy TTL expiry.
//!
//! [`CacheStore`] persists harvested page payloads keyed by a SHA-256 hash of
//! the normalized URL. Entries older than the configured TTL are treated as
//! absent on read; there is no background sweep. A read error degrades to a
//! cache miss rather than failing the caller — only [`CacheStore::open`] on an
//! unusable path is a hard error.

mod migrations;

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use libsql::{Connection, Database, params};
use sha2::{Digest, Sha256};
use tracing::warn;

use prospector_shared::{ProspectorError, Result};

/// A cached page payload, as stored for one normalized URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPayload {
    /// `<title>` text captured at fetch time.
    pub title: Option<String>,
    /// Extracted page text (already whitespace-collapsed and capped).
    pub text: String,
    /// When the page was fetched over the network.
    pub fetched_at: DateTime<Utc>,
}

/// Normalize a raw URL string for keying and fetching: trim surrounding
/// whitespace and prefix `https://` when no scheme is present.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// Deterministic cache key: SHA-256 of the normalized URL.
pub fn cache_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_url(url).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Persistent fetch cache handle wrapping a libSQL database.
pub struct CacheStore {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    ttl: Duration,
}

impl CacheStore {
    /// Open or create a cache database at `path` with the given TTL.
    ///
    /// Fails fast on an unusable path — a run with no working cache backing
    /// store is a batch-level precondition violation.
    pub async fn open(path: &Path, ttl: Duration) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ProspectorError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| ProspectorError::Cache(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| ProspectorError::Cache(e.to_string()))?;

        let store = Self { db, conn, ttl };
        store.run_migrations().await?;
        Ok(store)
    }

    /// The configured time-to-live for entries.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    ProspectorError::Cache(format!("migration v{} failed: {e}", migration.version))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Look up a payload by URL. Returns `None` when the URL was never
    /// stored, when its entry has outlived the TTL, or when the read fails
    /// (degrade to miss, never an error).
    pub async fn get(&self, url: &str) -> Option<CachedPayload> {
        let key = cache_key(url);

        let mut rows = match self
            .conn
            .query(
                "SELECT title, content, fetched_at, stored_at FROM fetch_cache WHERE key = ?1",
                params![key.as_str()],
            )
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!(url, error = %e, "cache read failed, treating as miss");
                return None;
            }
        };

        let row = match rows.next().await {
            Ok(Some(row)) => row,
            Ok(None) => return None,
            Err(e) => {
                warn!(url, error = %e, "cache row read failed, treating as miss");
                return None;
            }
        };

        let stored_at = parse_timestamp(row.get::<String>(3).ok()?)?;
        if Utc::now() - stored_at >= self.ttl {
            return None;
        }

        Some(CachedPayload {
            title: row.get::<String>(0).ok(),
            text: row.get::<String>(1).ok()?,
            fetched_at: parse_timestamp(row.get::<String>(2).ok()?)?,
        })
    }

    /// Store a payload for a URL, unconditionally overwriting any previous
    /// entry and stamping the current time as `stored_at`.
    pub async fn put(&self, url: &str, payload: &CachedPayload) -> Result<()> {
        let key = cache_key(url);
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO fetch_cache (key, url, title, content, fetched_at, stored_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(key) DO UPDATE SET
                   url = excluded.url,
                   title = excluded.title,
                   content = excluded.content,
                   fetched_at = excluded.fetched_at,
                   stored_at = excluded.stored_at",
                params![
                    key.as_str(),
                    normalize_url(url),
                    payload.title.as_deref(),
                    payload.text.as_str(),
                    payload.fetched_at.to_rfc3339(),
                    now.as_str(),
                ],
            )
            .await
            .map_err(|e| ProspectorError::Cache(e.to_string()))?;
        Ok(())
    }

    /// Number of stored entries, including expired ones awaiting overwrite.
    pub async fn len(&self) -> Result<u64> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM fetch_cache", params![])
            .await
            .map_err(|e| ProspectorError::Cache(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => row
                .get::<u64>(0)
                .map_err(|e| ProspectorError::Cache(e.to_string())),
            Ok(None) => Ok(0),
            Err(e) => Err(ProspectorError::Cache(e.to_string())),
        }
    }

    /// Delete all entries. Returns the number of rows removed.
    pub async fn clear(&self) -> Result<u64> {
        self.conn
            .execute("DELETE FROM fetch_cache", params![])
            .await
            .map_err(|e| ProspectorError::Cache(e.to_string()))
    }

    #[cfg(test)]
    async fn backdate(&self, url: &str, stored_at: DateTime<Utc>) {
        self.conn
            .execute(
                "UPDATE fetch_cache SET stored_at = ?1 WHERE key = ?2",
                params![stored_at.to_rfc3339(), cache_key(url)],
            )
            .await
            .expect("backdate entry");
    }
}

fn parse_timestamp(s: String) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(&s) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            warn!(value = %s, error = %e, "invalid cache timestamp, treating as miss");
            None
        }
    }
}
