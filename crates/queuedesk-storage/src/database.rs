// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread, which is what makes each store call atomic. Do NOT create additional
//! Connection instances for writes.

use std::path::Path;
use std::time::Duration;

use queuedesk_core::QueueDeskError;
use thiserror::Error;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::migrations;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Failure raised inside a `Connection::call` closure.
#[derive(Debug, Error)]
pub enum StoreFailure {
    #[error(transparent)]
    Sql(#[from] rusqlite::Error),

    #[error("attribute encoding: {0}")]
    Codec(#[from] serde_json::Error),

    /// A domain-level refusal (failed condition, bad counter) decided in the closure.
    #[error(transparent)]
    Rejected(#[from] QueueDeskError),
}

impl From<StoreFailure> for QueueDeskError {
    fn from(failure: StoreFailure) -> Self {
        match failure {
            StoreFailure::Rejected(err) => err,
            StoreFailure::Sql(e) => QueueDeskError::Storage {
                source: Box::new(e),
            },
            StoreFailure::Codec(e) => QueueDeskError::Storage {
                source: Box::new(e),
            },
        }
    }
}

/// Convert a tokio-rusqlite error into a QueueDeskError.
pub fn map_tr_err(e: tokio_rusqlite::Error<StoreFailure>) -> QueueDeskError {
    match e {
        tokio_rusqlite::Error::Error(failure) => failure.into(),
        other => QueueDeskError::Storage {
            source: other.to_string().into(),
        },
    }
}

/// An open, migrated SQLite database.
pub struct Database {
    conn: Connection,
    path: String,
}

impl Database {
    /// Open (creating if needed) the database at `path`, apply PRAGMAs, and
    /// run pending migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, QueueDeskError> {
        let parent = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            std::fs::create_dir_all(parent).map_err(|e| QueueDeskError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = Connection::open(path)
            .await
            .map_err(|e| QueueDeskError::Storage {
                source: e.to_string().into(),
            })?;

        conn.call(move |conn| -> Result<(), StoreFailure> {
            apply_pragmas(conn, wal_mode)?;
            migrations::run_migrations(conn)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self {
            conn,
            path: path.to_string(),
        })
    }

    /// The single background-thread connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Checkpoint the WAL so the main file holds every committed write.
    pub async fn checkpoint(&self) -> Result<(), QueueDeskError> {
        self.conn
            .call(|conn| -> Result<(), StoreFailure> {
                conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Checkpoint and close the connection.
    pub async fn close(self) -> Result<(), QueueDeskError> {
        self.checkpoint().await?;
        self.conn.close().await.map_err(|e| QueueDeskError::Storage {
            source: e.to_string().into(),
        })?;
        debug!(path = %self.path, "database closed");
        Ok(())
    }
}

fn apply_pragmas(conn: &rusqlite::Connection, wal_mode: bool) -> rusqlite::Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    if wal_mode {
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(journal_mode = %mode, "journal mode set");
    }
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_file_and_schema() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("queue.db");
        let db = Database::open(db_path.to_str().unwrap(), true).await.unwrap();
        assert!(db_path.exists());

        let tables: Vec<String> = db
            .connection()
            .call(|conn| -> Result<Vec<String>, StoreFailure> {
                let mut stmt =
                    conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .unwrap();
        assert!(tables.iter().any(|t| t == "records"));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopening_is_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("queue.db");
        let path = db_path.to_str().unwrap();
        Database::open(path, true).await.unwrap().close().await.unwrap();
        let db = Database::open(path, false).await.unwrap();
        assert_eq!(db.path(), path);
    }

    #[test]
    fn rejected_failure_keeps_domain_error() {
        let failure = StoreFailure::Rejected(QueueDeskError::ConditionFailed { key: "k".into() });
        let err: QueueDeskError = failure.into();
        assert!(matches!(err, QueueDeskError::ConditionFailed { .. }));
    }
}
