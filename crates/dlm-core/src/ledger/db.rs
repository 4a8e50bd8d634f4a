//! SQLite-backed ledger implementation: connection, migration, cache.

use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::model::Identity;

/// Percent-encode a path for a sqlite:// URI so spaces and special chars parse.
fn path_to_sqlite_uri(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            c => out.push(c),
        }
    }
    format!("sqlite://{}", out)
}

fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// One recorded identity, as listed by `dlm history`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub identity: Identity,
    pub recorded_at: i64,
}

/// Handle to the completed-identity ledger. Cheap to clone; clones share the
/// pool and the in-memory set.
#[derive(Clone)]
pub struct Ledger {
    pool: Pool<Sqlite>,
    known: Arc<RwLock<HashSet<Identity>>>,
}

impl Ledger {
    /// Default location: `~/.local/state/dlm/ledger.db`.
    pub fn default_path() -> Result<PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("dlm")?;
        Ok(xdg_dirs.get_state_home().join("dlm").join("ledger.db"))
    }

    /// Open (or create) the default ledger.
    pub async fn open_default() -> Result<Self> {
        Self::open_at(Self::default_path()?).await
    }

    /// Open (or create) the ledger at a specific path. Creates parent dirs if needed.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create ledger dir: {}", parent.display()))?;
        }
        let uri = path_to_sqlite_uri(path) + "?mode=rwc";
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect(&uri)
            .await
            .with_context(|| format!("open ledger: {}", path.display()))?;
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: Pool<Sqlite>) -> Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS completed_identities (
                identity TEXT PRIMARY KEY NOT NULL,
                recorded_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&pool)
        .await?;

        let rows = sqlx::query("SELECT identity FROM completed_identities")
            .fetch_all(&pool)
            .await?;
        let known: HashSet<Identity> = rows
            .iter()
            .map(|r| r.get::<String, _>("identity"))
            .collect();
        tracing::debug!(count = known.len(), "ledger loaded");

        Ok(Self {
            pool,
            known: Arc::new(RwLock::new(known)),
        })
    }

    /// Whether `identity` was fully downloaded in this or an earlier run.
    pub fn contains(&self, identity: &str) -> bool {
        self.known
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(identity)
    }

    /// Record `identity` as complete. Returns false if it was already recorded.
    /// Safe to call concurrently from many transfer completions.
    pub async fn add(&self, identity: &str) -> Result<bool> {
        let inserted = self
            .known
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identity.to_string());
        if !inserted {
            return Ok(false);
        }
        let stored = sqlx::query(
            r#"
            INSERT OR IGNORE INTO completed_identities (identity, recorded_at)
            VALUES (?1, ?2)
            "#,
        )
        .bind(identity)
        .bind(unix_timestamp())
        .execute(&self.pool)
        .await;
        if let Err(e) = stored {
            // Not durable, so not known either.
            self.known
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(identity);
            return Err(e).with_context(|| format!("record completed identity: {}", identity));
        }
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.known.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recorded identities, newest first. `limit = None` lists everything.
    pub async fn entries(&self, limit: Option<usize>) -> Result<Vec<LedgerEntry>> {
        let limit = limit.map(|n| n as i64).unwrap_or(-1);
        let rows = sqlx::query(
            r#"
            SELECT identity, recorded_at FROM completed_identities
            ORDER BY recorded_at DESC, rowid DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(|r| LedgerEntry {
                identity: r.get("identity"),
                recorded_at: r.get("recorded_at"),
            })
            .collect())
    }
}

#[cfg(test)]
/// Open an in-memory ledger for tests (no disk I/O).
pub(crate) async fn open_memory() -> Result<Ledger> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    Ledger::from_pool(pool).await
}
