// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The engine facade that wires the components together.

use std::sync::Arc;

use tracing::{info, warn};

use queuedesk_bus::Topics;
use queuedesk_config::model::{EngineConfig, QueueDeskConfig};
use queuedesk_core::{
    AdapterType, Board, HealthStatus, NotificationSink, QueueDeskError, RecordStore,
    ServicePoint, ServicePointStatus,
};

use crate::board::BoardAggregator;
use crate::clock::Clock;
use crate::dispatch::Dispatcher;
use crate::position::PositionIndex;
use crate::tickets::TicketAllocator;

/// Health of one adapter the engine depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterHealth {
    pub name: String,
    pub adapter_type: AdapterType,
    pub status: HealthStatus,
}

/// Every engine operation. Stateless between calls: all state is in the store.
pub struct QueueEngine {
    pub(crate) store: Arc<dyn RecordStore>,
    pub(crate) notifier: Arc<dyn NotificationSink>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) topics: Topics,
    pub(crate) config: EngineConfig,
    pub(crate) positions: PositionIndex,
    pub(crate) tickets: TicketAllocator,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) board: BoardAggregator,
}

impl QueueEngine {
    pub fn new(
        store: Arc<dyn RecordStore>,
        notifier: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
        config: &QueueDeskConfig,
    ) -> Self {
        let topics = Topics::new(config.notify.topic_prefix.clone());
        Self {
            positions: PositionIndex::new(Arc::clone(&store), config.engine.position_retries),
            tickets: TicketAllocator::new(Arc::clone(&store), config.tickets.clone()),
            dispatcher: Dispatcher::new(
                Arc::clone(&store),
                Arc::clone(&clock),
                Arc::clone(&notifier),
                topics.clone(),
            ),
            board: BoardAggregator::new(Arc::clone(&store)),
            store,
            notifier,
            clock,
            topics,
            config: config.engine.clone(),
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    /// Drive service point `id` to `requested` through the dispatch state machine.
    pub async fn update_service_point_status(
        &self,
        id: &str,
        requested: ServicePointStatus,
    ) -> Result<ServicePoint, QueueDeskError> {
        self.dispatcher.update_status(id, requested).await
    }

    /// Board over every service point. `limit` defaults to `engine.board_limit`.
    pub async fn board_status(&self, limit: Option<usize>) -> Result<Board, QueueDeskError> {
        let points = self.list_service_points().await?;
        let limit = limit.unwrap_or(self.config.board_limit);
        self.board.board_status(&points, limit).await
    }

    /// Compute the board and publish it to `<prefix>/board`.
    ///
    /// A failed publish is logged and does not fail the call.
    pub async fn publish_board(&self) -> Result<Board, QueueDeskError> {
        let board = self.board_status(None).await?;
        let topic = self.topics.board();
        let payload = serde_json::to_value(&board)
            .map_err(|e| QueueDeskError::Internal(format!("board encoding: {e}")))?;
        if let Err(e) = self.notifier.publish(&topic, payload).await {
            warn!(%topic, error = %e, "board notification failed");
        }
        Ok(board)
    }

    /// Change-feed callback: a QUEUED item was inserted for `service_id`.
    pub async fn on_queue_item_inserted(
        &self,
        service_id: &str,
    ) -> Result<Vec<ServicePoint>, QueueDeskError> {
        let claimed = self.dispatcher.on_queue_item_inserted(service_id).await?;
        if !claimed.is_empty() {
            info!(service = %service_id, claimed = claimed.len(), "arrival dispatched");
        }
        Ok(claimed)
    }

    /// Change-feed callback: something on the queue changed; refresh the board.
    pub async fn on_queue_changed(&self) -> Result<Board, QueueDeskError> {
        self.publish_board().await
    }

    /// Health of the store and the notification sink.
    pub async fn health(&self) -> Vec<AdapterHealth> {
        let store = match self.store.health_check().await {
            Ok(status) => status,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        };
        let notifier = match self.notifier.health_check().await {
            Ok(status) => status,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        };
        vec![
            AdapterHealth {
                name: self.store.name().to_string(),
                adapter_type: self.store.adapter_type(),
                status: store,
            },
            AdapterHealth {
                name: self.notifier.name().to_string(),
                adapter_type: self.notifier.adapter_type(),
                status: notifier,
            },
        ]
    }

    /// Shut both adapters down.
    pub async fn shutdown(&self) -> Result<(), QueueDeskError> {
        self.notifier.shutdown().await?;
        self.store.shutdown().await
    }
}
