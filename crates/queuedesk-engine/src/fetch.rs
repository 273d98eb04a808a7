// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed reads on top of the record store.

use queuedesk_core::{EntityKind, QueueDeskError, RecordCodec, RecordKey, RecordStore};

/// Load and decode one entity, failing with `NotFound` when absent.
pub(crate) async fn one<T: RecordCodec>(
    store: &dyn RecordStore,
    key: &RecordKey,
    entity: EntityKind,
    id: &str,
) -> Result<T, QueueDeskError> {
    match store.get(key).await? {
        Some(record) => T::from_record(&record),
        None => Err(QueueDeskError::not_found(entity, id)),
    }
}

/// Every entity stored in partition `prefix`, in sort-key order.
pub(crate) async fn all<T: RecordCodec>(
    store: &dyn RecordStore,
    prefix: &str,
) -> Result<Vec<T>, QueueDeskError> {
    store
        .query_partition(prefix, prefix)
        .await?
        .iter()
        .map(T::from_record)
        .collect()
}
