// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the RecordStore trait.
//!
//! Each trait call runs as one closure on the connection thread. Conditioned
//! writes open a SQLite transaction, evaluate every condition against the rows
//! as read inside it, and commit only when all of them hold.

use async_trait::async_trait;
use rusqlite::{params, params_from_iter, OptionalExtension};
use tracing::{debug, trace};

use queuedesk_config::model::StorageConfig;
use queuedesk_core::{
    AdapterType, Attributes, Condition, HealthStatus, IndexKey, IndexQuery, IndexRange,
    PluginAdapter, QueueDeskError, Record, RecordKey, RecordStore, RecordUpdate, WriteOp,
};

use crate::database::{map_tr_err, Database, StoreFailure};
use crate::staging::{self, Staged};

const COLUMNS: &str = "pk, sk, gsi1pk, gsi1sk, attrs";

/// SQLite-backed record store.
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Open the database described by `config`.
    pub async fn open(config: &StorageConfig) -> Result<Self, QueueDeskError> {
        let db = Database::open(&config.database_path, config.wal_mode).await?;
        Ok(Self::new(db))
    }

    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    async fn run<R, F>(&self, f: F) -> Result<R, QueueDeskError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R, StoreFailure> + Send + 'static,
        R: Send + 'static,
    {
        self.db.connection().call(f).await.map_err(map_tr_err)
    }
}

type RawRow = (String, String, Option<String>, Option<String>, String);

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn decode((pk, sk, gsi1pk, gsi1sk, attrs): RawRow) -> Result<Record, StoreFailure> {
    let attributes: Attributes = serde_json::from_str(&attrs)?;
    let index = match (gsi1pk, gsi1sk) {
        (Some(pk), Some(sk)) => Some(IndexKey { pk, sk }),
        _ => None,
    };
    Ok(Record {
        key: RecordKey { pk, sk },
        index,
        attributes,
    })
}

fn load(conn: &rusqlite::Connection, key: &RecordKey) -> Result<Option<Record>, StoreFailure> {
    let raw = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM records WHERE pk = ?1 AND sk = ?2"),
            params![key.pk, key.sk],
            read_row,
        )
        .optional()?;
    raw.map(decode).transpose()
}

fn load_many(
    conn: &rusqlite::Connection,
    sql: &str,
    args: &[String],
) -> Result<Vec<Record>, StoreFailure> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params_from_iter(args.iter()), read_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(decode).collect()
}

fn write(conn: &rusqlite::Connection, record: &Record) -> Result<(), StoreFailure> {
    let attrs = serde_json::to_string(&record.attributes)?;
    let (gsi1pk, gsi1sk) = match &record.index {
        Some(index) => (Some(index.pk.as_str()), Some(index.sk.as_str())),
        None => (None, None),
    };
    conn.execute(
        "INSERT INTO records (pk, sk, gsi1pk, gsi1sk, attrs) VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (pk, sk) DO UPDATE SET
             gsi1pk = excluded.gsi1pk, gsi1sk = excluded.gsi1sk, attrs = excluded.attrs",
        params![record.key.pk, record.key.sk, gsi1pk, gsi1sk, attrs],
    )?;
    Ok(())
}

fn remove(conn: &rusqlite::Connection, key: &RecordKey) -> Result<(), StoreFailure> {
    conn.execute(
        "DELETE FROM records WHERE pk = ?1 AND sk = ?2",
        params![key.pk, key.sk],
    )?;
    Ok(())
}

/// Evaluate every op inside one SQLite transaction and apply them all, or none.
fn apply_ops(conn: &mut rusqlite::Connection, ops: &[WriteOp]) -> Result<Vec<Staged>, StoreFailure> {
    staging::ensure_distinct_keys(ops)?;
    let tx = conn.transaction()?;

    let mut staged = Vec::with_capacity(ops.len());
    for op in ops {
        let current = load(&tx, op.key())?;
        staged.push(staging::stage(op, current.as_ref())?);
    }
    for (op, effect) in ops.iter().zip(&staged) {
        match effect {
            Staged::Write(record) => write(&tx, record)?,
            Staged::Remove => remove(&tx, op.key())?,
            Staged::Keep => {}
        }
    }

    tx.commit()?;
    Ok(staged)
}

/// WHERE clause and positional arguments for an index query.
fn index_filter(query: &IndexQuery) -> (String, Vec<String>) {
    let mut clause = String::from("gsi1pk = ?1");
    let mut args = vec![query.pk.clone()];
    match &query.range {
        IndexRange::All => {}
        IndexRange::BeginsWith(prefix) => {
            clause.push_str(" AND substr(gsi1sk, 1, length(?2)) = ?2");
            args.push(prefix.clone());
        }
        IndexRange::LessThan(bound) => {
            clause.push_str(" AND gsi1sk < ?2");
            args.push(bound.clone());
        }
    }
    (clause, args)
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, QueueDeskError> {
        self.run(|conn| {
            conn.query_row("SELECT 1", [], |_| Ok(()))?;
            Ok(())
        })
        .await?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), QueueDeskError> {
        self.db.checkpoint().await?;
        debug!(path = %self.db.path(), "shutdown: WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn get(&self, key: &RecordKey) -> Result<Option<Record>, QueueDeskError> {
        let key = key.clone();
        self.run(move |conn| load(conn, &key)).await
    }

    async fn batch_get(&self, keys: &[RecordKey]) -> Result<Vec<Record>, QueueDeskError> {
        let keys = keys.to_vec();
        self.run(move |conn| {
            let mut found = Vec::with_capacity(keys.len());
            for key in &keys {
                if let Some(record) = load(conn, key)? {
                    found.push(record);
                }
            }
            Ok(found)
        })
        .await
    }

    async fn put(&self, record: Record, conditions: Vec<Condition>) -> Result<(), QueueDeskError> {
        let ops = vec![WriteOp::Put { record, conditions }];
        self.run(move |conn| apply_ops(conn, &ops)).await?;
        Ok(())
    }

    async fn update(
        &self,
        key: &RecordKey,
        update: RecordUpdate,
        conditions: Vec<Condition>,
    ) -> Result<Record, QueueDeskError> {
        let ops = vec![WriteOp::Update {
            key: key.clone(),
            update,
            conditions,
        }];
        let staged = self.run(move |conn| apply_ops(conn, &ops)).await?;
        match staged.into_iter().next() {
            Some(Staged::Write(record)) => Ok(record),
            _ => Err(QueueDeskError::Internal(format!("update of {key} wrote nothing"))),
        }
    }

    async fn delete(&self, key: &RecordKey, conditions: Vec<Condition>) -> Result<(), QueueDeskError> {
        let ops = vec![WriteOp::Delete {
            key: key.clone(),
            conditions,
        }];
        self.run(move |conn| apply_ops(conn, &ops)).await?;
        Ok(())
    }

    async fn query_partition(
        &self,
        pk: &str,
        sk_prefix: &str,
    ) -> Result<Vec<Record>, QueueDeskError> {
        let args = vec![pk.to_string(), sk_prefix.to_string()];
        self.run(move |conn| {
            load_many(
                conn,
                &format!(
                    "SELECT {COLUMNS} FROM records
                     WHERE pk = ?1 AND substr(sk, 1, length(?2)) = ?2
                     ORDER BY sk ASC"
                ),
                &args,
            )
        })
        .await
    }

    async fn query_index(&self, query: &IndexQuery) -> Result<Vec<Record>, QueueDeskError> {
        let (clause, args) = index_filter(query);
        let order = if query.ascending { "ASC" } else { "DESC" };
        // SQLite treats a negative LIMIT as unbounded.
        let limit = query.limit.map_or(-1, |n| n as i64);
        let sql = format!(
            "SELECT {COLUMNS} FROM records WHERE {clause}
             ORDER BY gsi1sk {order} LIMIT {limit}"
        );
        self.run(move |conn| load_many(conn, &sql, &args)).await
    }

    async fn count_index(&self, query: &IndexQuery) -> Result<Option<u64>, QueueDeskError> {
        let (clause, args) = index_filter(query);
        let sql = format!("SELECT COUNT(*) FROM records WHERE {clause}");
        let count: i64 = self
            .run(move |conn| {
                Ok(conn.query_row(&sql, params_from_iter(args.iter()), |row| row.get(0))?)
            })
            .await?;
        Ok(u64::try_from(count).ok())
    }

    async fn transact_write(&self, ops: Vec<WriteOp>) -> Result<(), QueueDeskError> {
        let count = ops.len();
        self.run(move |conn| apply_ops(conn, &ops)).await?;
        trace!(ops = count, "transaction committed");
        Ok(())
    }

    async fn increment(
        &self,
        key: &RecordKey,
        attribute: &str,
        by: i64,
    ) -> Result<i64, QueueDeskError> {
        let key = key.clone();
        let attribute = attribute.to_string();
        self.run(move |conn| {
            let tx = conn.transaction()?;
            let current = load(&tx, &key)?;
            let next = staging::counter_value(current.as_ref(), &attribute)? + by;
            let record = current
                .unwrap_or_else(|| Record::new(key.clone()))
                .with_attr(&attribute, next);
            write(&tx, &record)?;
            tx.commit()?;
            Ok(next)
        })
        .await
    }
}
