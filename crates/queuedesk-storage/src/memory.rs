// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory implementation of the RecordStore trait.
//!
//! A single `RwLock` around an ordered map. Writes hold the lock for the whole
//! evaluate-then-apply step, so conditioned writes are atomic with respect to
//! one another exactly as they are in the SQLite backend.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use queuedesk_core::{
    AdapterType, Condition, HealthStatus, IndexQuery, PluginAdapter, QueueDeskError, Record,
    RecordKey, RecordStore, RecordUpdate, WriteOp,
};

use crate::staging::{self, Staged};

/// Process-local record store.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<RecordKey, Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    async fn apply_ops(&self, ops: &[WriteOp]) -> Result<Vec<Staged>, QueueDeskError> {
        staging::ensure_distinct_keys(ops)?;
        let mut records = self.records.write().await;

        let staged = ops
            .iter()
            .map(|op| staging::stage(op, records.get(op.key())))
            .collect::<Result<Vec<_>, _>>()?;

        for (op, effect) in ops.iter().zip(&staged) {
            match effect {
                Staged::Write(record) => {
                    records.insert(op.key().clone(), record.clone());
                }
                Staged::Remove => {
                    records.remove(op.key());
                }
                Staged::Keep => {}
            }
        }
        Ok(staged)
    }

    fn index_hits<'a>(
        records: &'a BTreeMap<RecordKey, Record>,
        query: &'a IndexQuery,
    ) -> impl Iterator<Item = (&'a str, &'a Record)> + 'a {
        records.values().filter_map(move |record| {
            let index = record.index.as_ref()?;
            (index.pk == query.pk && query.range.matches(&index.sk))
                .then_some((index.sk.as_str(), record))
        })
    }
}

#[async_trait]
impl PluginAdapter for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, QueueDeskError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), QueueDeskError> {
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, key: &RecordKey) -> Result<Option<Record>, QueueDeskError> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn batch_get(&self, keys: &[RecordKey]) -> Result<Vec<Record>, QueueDeskError> {
        let records = self.records.read().await;
        Ok(keys.iter().filter_map(|k| records.get(k).cloned()).collect())
    }

    async fn put(&self, record: Record, conditions: Vec<Condition>) -> Result<(), QueueDeskError> {
        self.apply_ops(&[WriteOp::Put { record, conditions }]).await?;
        Ok(())
    }

    async fn update(
        &self,
        key: &RecordKey,
        update: RecordUpdate,
        conditions: Vec<Condition>,
    ) -> Result<Record, QueueDeskError> {
        let op = WriteOp::Update {
            key: key.clone(),
            update,
            conditions,
        };
        match self.apply_ops(&[op]).await?.pop() {
            Some(Staged::Write(record)) => Ok(record),
            _ => Err(QueueDeskError::Internal(format!("update of {key} wrote nothing"))),
        }
    }

    async fn delete(&self, key: &RecordKey, conditions: Vec<Condition>) -> Result<(), QueueDeskError> {
        let op = WriteOp::Delete {
            key: key.clone(),
            conditions,
        };
        self.apply_ops(&[op]).await?;
        Ok(())
    }

    async fn query_partition(
        &self,
        pk: &str,
        sk_prefix: &str,
    ) -> Result<Vec<Record>, QueueDeskError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| r.key.pk == pk && r.key.sk.starts_with(sk_prefix))
            .cloned()
            .collect())
    }

    async fn query_index(&self, query: &IndexQuery) -> Result<Vec<Record>, QueueDeskError> {
        let records = self.records.read().await;
        let mut hits: Vec<_> = Self::index_hits(&records, query).collect();
        hits.sort_by(|a, b| a.0.cmp(b.0));
        if !query.ascending {
            hits.reverse();
        }
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(hits.into_iter().take(limit).map(|(_, r)| r.clone()).collect())
    }

    async fn count_index(&self, query: &IndexQuery) -> Result<Option<u64>, QueueDeskError> {
        let records = self.records.read().await;
        Ok(Some(Self::index_hits(&records, query).count() as u64))
    }

    async fn transact_write(&self, ops: Vec<WriteOp>) -> Result<(), QueueDeskError> {
        self.apply_ops(&ops).await?;
        Ok(())
    }

    async fn increment(
        &self,
        key: &RecordKey,
        attribute: &str,
        by: i64,
    ) -> Result<i64, QueueDeskError> {
        let mut records = self.records.write().await;
        let current = records.get(key);
        let next = staging::counter_value(current, attribute)? + by;
        let record = current
            .cloned()
            .unwrap_or_else(|| Record::new(key.clone()))
            .with_attr(attribute, next);
        records.insert(key.clone(), record);
        Ok(next)
    }
}
