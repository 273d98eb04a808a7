// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store wrapper that withholds index counts.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use queuedesk_core::{
    AdapterType, Condition, HealthStatus, IndexQuery, PluginAdapter, QueueDeskError, Record,
    RecordKey, RecordStore, RecordUpdate, WriteOp,
};

/// Delegates everything to `inner`, except that the next `misses` calls to
/// `count_index` report no count.
pub struct FlakyCountStore {
    inner: Arc<dyn RecordStore>,
    misses: AtomicU32,
}

impl FlakyCountStore {
    pub fn new(inner: Arc<dyn RecordStore>, misses: u32) -> Self {
        Self {
            inner,
            misses: AtomicU32::new(misses),
        }
    }

    /// Withhold the next `misses` counts.
    pub fn miss_next(&self, misses: u32) {
        self.misses.store(misses, Ordering::SeqCst);
    }

    pub fn remaining_misses(&self) -> u32 {
        self.misses.load(Ordering::SeqCst)
    }

    fn take_miss(&self) -> bool {
        self.misses
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl PluginAdapter for FlakyCountStore {
    fn name(&self) -> &str {
        "flaky-count"
    }

    fn version(&self) -> semver::Version {
        self.inner.version()
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, QueueDeskError> {
        self.inner.health_check().await
    }

    async fn shutdown(&self) -> Result<(), QueueDeskError> {
        self.inner.shutdown().await
    }
}

#[async_trait]
impl RecordStore for FlakyCountStore {
    async fn get(&self, key: &RecordKey) -> Result<Option<Record>, QueueDeskError> {
        self.inner.get(key).await
    }

    async fn batch_get(&self, keys: &[RecordKey]) -> Result<Vec<Record>, QueueDeskError> {
        self.inner.batch_get(keys).await
    }

    async fn put(&self, record: Record, conditions: Vec<Condition>) -> Result<(), QueueDeskError> {
        self.inner.put(record, conditions).await
    }

    async fn update(
        &self,
        key: &RecordKey,
        update: RecordUpdate,
        conditions: Vec<Condition>,
    ) -> Result<Record, QueueDeskError> {
        self.inner.update(key, update, conditions).await
    }

    async fn delete(&self, key: &RecordKey, conditions: Vec<Condition>) -> Result<(), QueueDeskError> {
        self.inner.delete(key, conditions).await
    }

    async fn query_partition(
        &self,
        pk: &str,
        sk_prefix: &str,
    ) -> Result<Vec<Record>, QueueDeskError> {
        self.inner.query_partition(pk, sk_prefix).await
    }

    async fn query_index(&self, query: &IndexQuery) -> Result<Vec<Record>, QueueDeskError> {
        self.inner.query_index(query).await
    }

    async fn count_index(&self, query: &IndexQuery) -> Result<Option<u64>, QueueDeskError> {
        if self.take_miss() {
            return Ok(None);
        }
        self.inner.count_index(query).await
    }

    async fn transact_write(&self, ops: Vec<WriteOp>) -> Result<(), QueueDeskError> {
        self.inner.transact_write(ops).await
    }

    async fn increment(
        &self,
        key: &RecordKey,
        attribute: &str,
        by: i64,
    ) -> Result<i64, QueueDeskError> {
        self.inner.increment(key, attribute, by).await
    }
}
