// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record store trait for key-value persistence backends.

use async_trait::async_trait;

use crate::error::QueueDeskError;
use crate::record::{Condition, IndexQuery, Record, RecordKey, RecordUpdate, WriteOp};
use crate::traits::adapter::PluginAdapter;

/// A key-value store addressed by `(pk, sk)` with one secondary index.
///
/// Every mutation may carry [`Condition`]s; a failed condition aborts the call
/// with [`QueueDeskError::ConditionFailed`] and leaves the store untouched.
/// There are no cross-record locks: conditioned writes are the only way to
/// detect concurrent modification.
#[async_trait]
pub trait RecordStore: PluginAdapter {
    /// Fetch one record.
    async fn get(&self, key: &RecordKey) -> Result<Option<Record>, QueueDeskError>;

    /// Fetch several records. Missing keys are omitted; order is unspecified.
    async fn batch_get(&self, keys: &[RecordKey]) -> Result<Vec<Record>, QueueDeskError>;

    /// Write a full record, replacing any previous version.
    async fn put(&self, record: Record, conditions: Vec<Condition>) -> Result<(), QueueDeskError>;

    /// Merge `update` into an existing record and return the new version.
    ///
    /// Updating an absent record fails with `ConditionFailed`.
    async fn update(
        &self,
        key: &RecordKey,
        update: RecordUpdate,
        conditions: Vec<Condition>,
    ) -> Result<Record, QueueDeskError>;

    /// Remove a record.
    async fn delete(&self, key: &RecordKey, conditions: Vec<Condition>) -> Result<(), QueueDeskError>;

    /// All records of a partition whose sort key starts with `sk_prefix`, ascending.
    async fn query_partition(
        &self,
        pk: &str,
        sk_prefix: &str,
    ) -> Result<Vec<Record>, QueueDeskError>;

    /// Range query on the secondary index.
    async fn query_index(&self, query: &IndexQuery) -> Result<Vec<Record>, QueueDeskError>;

    /// Count the records a query would return, ignoring its limit.
    ///
    /// `None` means the backend could not produce a count.
    async fn count_index(&self, query: &IndexQuery) -> Result<Option<u64>, QueueDeskError>;

    /// Apply every op atomically, or none of them.
    async fn transact_write(&self, ops: Vec<WriteOp>) -> Result<(), QueueDeskError>;

    /// Atomically add `by` to a numeric attribute, creating the record at zero
    /// when absent, and return the new value.
    async fn increment(
        &self,
        key: &RecordKey,
        attribute: &str,
        by: i64,
    ) -> Result<i64, QueueDeskError>;
}
