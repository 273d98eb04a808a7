// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Point-in-time board view across service points.
//!
//! The board lists the items currently at a desk, most recently advanced first,
//! followed by the heads of the waiting queues of every service the given points
//! serve, oldest first.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::debug;

use queuedesk_core::codec::index_sort_key;
use queuedesk_core::{
    keys, Board, BoardEntry, IndexQuery, IndexRange, QueueDeskError, QueueItem, QueueStatus,
    RecordCodec, RecordStore, ServicePoint, ServicePointStatus,
};

pub struct BoardAggregator {
    store: Arc<dyn RecordStore>,
}

impl BoardAggregator {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Assemble the board for `points`, taking at most `limit` waiting items
    /// from each distinct service.
    pub async fn board_status(
        &self,
        points: &[ServicePoint],
        limit: usize,
    ) -> Result<Board, QueueDeskError> {
        let mut items = self.bound_entries(points).await?;
        let waiting = self.waiting_entries(points, limit).await?;
        debug!(at_desk = items.len(), waiting = waiting.len(), "board assembled");
        items.extend(waiting);
        Ok(Board { items })
    }

    /// Items bound to an IN_SERVICE point, or to a WAITING point that has
    /// claimed one, labelled with the point's number. Newest first.
    async fn bound_entries(&self, points: &[ServicePoint]) -> Result<Vec<BoardEntry>, QueueDeskError> {
        let labels: HashMap<&str, &str> = points
            .iter()
            .filter(|p| {
                matches!(
                    p.service_point_status,
                    ServicePointStatus::InService | ServicePointStatus::Waiting
                )
            })
            .filter_map(|p| Some((p.bound_item()?, p.service_point_number.as_str())))
            .collect();
        if labels.is_empty() {
            return Ok(Vec::new());
        }

        let item_keys: Vec<_> = labels.keys().map(|id| keys::queue_item_key(id)).collect();
        let mut bound = self
            .store
            .batch_get(&item_keys)
            .await?
            .iter()
            .map(QueueItem::from_record)
            .collect::<Result<Vec<_>, _>>()?;
        bound.sort_by_cached_key(|item| std::cmp::Reverse(index_sort_key(item)));

        Ok(bound
            .into_iter()
            .map(|item| BoardEntry {
                service_point_label: labels
                    .get(item.id.as_str())
                    .copied()
                    .unwrap_or_default()
                    .to_string(),
                item,
            })
            .collect())
    }

    /// First `limit` QUEUED items of every service the points serve, merged in
    /// index order.
    async fn waiting_entries(
        &self,
        points: &[ServicePoint],
        limit: usize,
    ) -> Result<Vec<BoardEntry>, QueueDeskError> {
        let services: BTreeSet<&str> = points
            .iter()
            .flat_map(|p| p.service_ids.iter().map(String::as_str))
            .collect();
        let queued = keys::status_prefix(QueueStatus::Queued);

        let per_service = try_join_all(services.into_iter().map(|service_id| {
            let query = IndexQuery::new(
                keys::queue_index_pk(service_id),
                IndexRange::BeginsWith(queued.clone()),
            )
            .limit(limit);
            async move { self.store.query_index(&query).await }
        }))
        .await?;

        let mut waiting = per_service
            .iter()
            .flatten()
            .map(QueueItem::from_record)
            .collect::<Result<Vec<_>, _>>()?;
        waiting.sort_by_cached_key(index_sort_key);

        Ok(waiting
            .into_iter()
            .map(|item| BoardEntry {
                service_point_label: String::new(),
                item,
            })
            .collect())
    }
}
