// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Customer-facing queue operations.

use tracing::info;
use uuid::Uuid;

use queuedesk_core::codec::{attr, ordering_update};
use queuedesk_core::{
    keys, Condition, EntityKind, IndexQuery, IndexRange, QueueDeskError, QueueItem,
    QueueItemView, QueuePriority, QueueStatus, RecordCodec, WriteOp,
};

use crate::engine::QueueEngine;
use crate::fetch;

impl QueueEngine {
    /// Put a new customer in the queue of `service_id`.
    ///
    /// The item is written QUEUED with MEDIUM priority, conditioned on the
    /// service still existing. Re-dispatch to idle service points is left to the
    /// change-feed callback [`QueueEngine::on_queue_item_inserted`].
    pub async fn join_queue(&self, service_id: &str) -> Result<QueueItemView, QueueDeskError> {
        let service = self.get_service(service_id).await?;
        let memorable_id = self.tickets.allocate(&service).await?;

        let item = QueueItem {
            id: Uuid::new_v4().to_string(),
            service_id: service.id.clone(),
            queue_status: QueueStatus::Queued,
            priority: QueuePriority::Medium,
            date: self.clock.now(),
            memorable_id,
        };
        self.store
            .transact_write(vec![
                WriteOp::Check {
                    key: service.key(),
                    conditions: vec![Condition::Exists],
                },
                WriteOp::Put {
                    record: item.to_record(),
                    conditions: vec![Condition::NotExists],
                },
            ])
            .await?;

        let position = self.positions.position_of(&item).await?;
        info!(
            item = %item.id,
            service = %service.id,
            ticket = %item.memorable_id,
            position,
            "joined queue"
        );
        Ok(QueueItemView {
            item,
            position: Some(position),
        })
    }

    /// An item with its position, which is present only while it is QUEUED.
    pub async fn get_queue_item(&self, id: &str) -> Result<QueueItemView, QueueDeskError> {
        let item = self.load_queue_item(id).await?;
        self.view(item).await
    }

    /// Every item of a service, in index order (status, priority, time).
    pub async fn list_queue_items(&self, service_id: &str) -> Result<Vec<QueueItem>, QueueDeskError> {
        self.get_service(service_id).await?;
        let query = IndexQuery::new(keys::queue_index_pk(service_id), IndexRange::All);
        self.store
            .query_index(&query)
            .await?
            .iter()
            .map(QueueItem::from_record)
            .collect()
    }

    /// Re-prioritize a waiting item. Only QUEUED items can be changed.
    pub async fn update_queue_item_priority(
        &self,
        id: &str,
        priority: QueuePriority,
    ) -> Result<QueueItemView, QueueDeskError> {
        let mut item = self.load_queue_item(id).await?;
        if item.queue_status != QueueStatus::Queued {
            return Err(QueueDeskError::InvalidState(format!(
                "queue item {id} is {}, only QUEUED items can change priority",
                item.queue_status
            )));
        }
        if item.priority == priority {
            return self.view(item).await;
        }

        item.priority = priority;
        self.store
            .update(
                &item.key(),
                ordering_update(&item),
                vec![Condition::equals(
                    attr::QUEUE_STATUS,
                    QueueStatus::Queued.to_string(),
                )],
            )
            .await?;
        info!(item = %id, %priority, "queue item priority changed");
        self.view(item).await
    }

    async fn load_queue_item(&self, id: &str) -> Result<QueueItem, QueueDeskError> {
        fetch::one(
            self.store.as_ref(),
            &keys::queue_item_key(id),
            EntityKind::QueueItem,
            id,
        )
        .await
    }

    async fn view(&self, item: QueueItem) -> Result<QueueItemView, QueueDeskError> {
        let position = match item.queue_status {
            QueueStatus::Queued => Some(self.positions.position_of(&item).await?),
            _ => None,
        };
        Ok(QueueItemView { item, position })
    }
}
