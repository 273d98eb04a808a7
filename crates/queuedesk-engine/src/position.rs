// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Position of a waiting item within its service queue.
//!
//! The position is never stored. It is the number of index entries of the same
//! service whose sort key is below the item's own, plus one. Every key below a
//! QUEUED key is itself QUEUED, because the status code leads the key.

use std::sync::Arc;

use tracing::debug;

use queuedesk_core::codec::index_sort_key;
use queuedesk_core::{keys, IndexQuery, IndexRange, QueueDeskError, QueueItem, QueueStatus, RecordStore};

pub struct PositionIndex {
    store: Arc<dyn RecordStore>,
    retries: u32,
}

impl PositionIndex {
    /// `retries` is how often a missing count is re-read before giving up.
    pub fn new(store: Arc<dyn RecordStore>, retries: u32) -> Self {
        Self { store, retries }
    }

    /// 1-based position of `item` among the QUEUED items of its service.
    ///
    /// Fails with [`QueueDeskError::InvalidState`] for items that are not QUEUED.
    pub async fn position_of(&self, item: &QueueItem) -> Result<u32, QueueDeskError> {
        if item.queue_status != QueueStatus::Queued {
            return Err(QueueDeskError::InvalidState(format!(
                "queue item {} is {}, only QUEUED items have a position",
                item.id, item.queue_status
            )));
        }

        let query = IndexQuery::new(
            keys::queue_index_pk(&item.service_id),
            IndexRange::LessThan(index_sort_key(item)),
        );

        for attempt in 0..=self.retries {
            if let Some(ahead) = self.store.count_index(&query).await? {
                let position = u32::try_from(ahead + 1).map_err(|_| {
                    QueueDeskError::Internal(format!("queue depth {ahead} overflows a position"))
                })?;
                return Ok(position);
            }
            debug!(item = %item.id, attempt, "index returned no count");
        }

        Err(QueueDeskError::ConsistencyViolation(format!(
            "no count for the queue of service {} after {} attempts",
            item.service_id,
            self.retries + 1
        )))
    }
}
