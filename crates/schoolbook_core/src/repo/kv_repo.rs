//! Key/value persistence contracts and SQLite implementation.
//!
//! # Responsibility
//! - Store whole JSON documents under string keys, like browser storage.
//! - Enforce a per-value byte quota before anything is written.
//!
//! # Invariants
//! - `put_many` writes all entries or none.
//! - Over-quota values fail with `StorageError::QuotaExceeded` and leave the
//!   previous value in place.

use crate::db::DbError;
use log::{error, warn};
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default per-value quota, matching the common browser storage limit.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence-layer failure. Never leaves a partial write behind.
#[derive(Debug)]
pub enum StorageError {
    /// Underlying database failure (access denied, I/O, locked file).
    Backend(DbError),
    /// Encoded value is larger than the configured quota.
    QuotaExceeded {
        key: String,
        bytes: usize,
        quota: usize,
    },
    /// Value could not be encoded as JSON.
    Encode(serde_json::Error),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Backend(err) => write!(f, "storage write failed: {err}"),
            Self::QuotaExceeded { key, bytes, quota } => write!(
                f,
                "storage quota exceeded for `{key}`: {bytes} bytes > {quota} bytes"
            ),
            Self::Encode(err) => write!(f, "failed to encode stored value: {err}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Backend(err) => Some(err),
            Self::QuotaExceeded { .. } => None,
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Backend(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Backend(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Repository interface over string-keyed document storage.
pub trait KvRepository {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    /// Writes every entry in one transaction.
    fn put_many(&self, entries: &[(&str, &str)]) -> StorageResult<()>;
    fn remove(&self, key: &str) -> StorageResult<()>;

    fn put(&self, key: &str, value: &str) -> StorageResult<()> {
        self.put_many(&[(key, value)])
    }
}

/// SQLite-backed key/value repository over the `kv_store` table.
pub struct SqliteKvRepository<'conn> {
    conn: &'conn Connection,
    quota_bytes: usize,
}

impl<'conn> SqliteKvRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self::with_quota(conn, DEFAULT_QUOTA_BYTES)
    }

    pub fn with_quota(conn: &'conn Connection, quota_bytes: usize) -> Self {
        Self { conn, quota_bytes }
    }

    pub fn quota_bytes(&self) -> usize {
        self.quota_bytes
    }
}

impl KvRepository for SqliteKvRepository<'_> {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put_many(&self, entries: &[(&str, &str)]) -> StorageResult<()> {
        for (key, value) in entries {
            if value.len() > self.quota_bytes {
                warn!(
                    "event=kv_put module=repo status=error error_code=quota_exceeded key={} bytes={} quota={}",
                    key,
                    value.len(),
                    self.quota_bytes
                );
                return Err(StorageError::QuotaExceeded {
                    key: (*key).to_string(),
                    bytes: value.len(),
                    quota: self.quota_bytes,
                });
            }
        }

        let write = || -> rusqlite::Result<()> {
            let tx = self.conn.unchecked_transaction()?;
            for (key, value) in entries {
                tx.execute(
                    "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        updated_at = (strftime('%s', 'now') * 1000);",
                    params![key, value],
                )?;
            }
            tx.commit()
        };

        write().map_err(|err| {
            error!(
                "event=kv_put module=repo status=error error_code=write_failed entries={} error={}",
                entries.len(),
                err
            );
            StorageError::from(err)
        })
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1;", [key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{KvRepository, SqliteKvRepository, StorageError};
    use crate::db::open_db_in_memory;

    #[test]
    fn put_get_remove_roundtrip() {
        let conn = open_db_in_memory().expect("open db");
        let repo = SqliteKvRepository::new(&conn);

        assert_eq!(repo.get("k").expect("get"), None);
        repo.put("k", "{\"a\":1}").expect("put");
        repo.put("k", "{\"a\":2}").expect("overwrite");
        assert_eq!(repo.get("k").expect("get").as_deref(), Some("{\"a\":2}"));

        repo.remove("k").expect("remove");
        assert_eq!(repo.get("k").expect("get"), None);
    }

    #[test]
    fn over_quota_batch_writes_nothing() {
        let conn = open_db_in_memory().expect("open db");
        let repo = SqliteKvRepository::with_quota(&conn, 8);

        repo.put("small", "tiny").expect("within quota");
        let err = repo
            .put_many(&[("small", "ok"), ("big", "way too large")])
            .expect_err("quota must be enforced");
        assert!(matches!(err, StorageError::QuotaExceeded { ref key, .. } if key == "big"));

        assert_eq!(repo.get("small").expect("get").as_deref(), Some("tiny"));
        assert_eq!(repo.get("big").expect("get"), None);
    }
}
