// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcast-backed implementation of the NotificationSink trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

use queuedesk_core::{AdapterType, HealthStatus, NotificationSink, PluginAdapter, QueueDeskError};

/// One published message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub topic: String,
    pub payload: serde_json::Value,
    pub published_at: DateTime<Utc>,
}

/// Fan-out bus. Publishing with no subscribers succeeds and drops the message.
#[derive(Debug, Clone)]
pub struct NotificationBus {
    sender: broadcast::Sender<Notification>,
}

impl NotificationBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Receive every notification published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Receive only notifications whose topic starts with `prefix`.
    pub fn subscribe_topic(&self, prefix: impl Into<String>) -> TopicSubscription {
        TopicSubscription {
            rx: self.sender.subscribe(),
            prefix: prefix.into(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// A receiver filtered to one topic prefix.
pub struct TopicSubscription {
    rx: broadcast::Receiver<Notification>,
    prefix: String,
}

impl TopicSubscription {
    /// Next matching notification, or `None` once the bus is gone.
    ///
    /// A subscriber that falls behind skips what it missed.
    pub async fn recv(&mut self) -> Option<Notification> {
        loop {
            match self.rx.recv().await {
                Ok(n) if n.topic.starts_with(&self.prefix) => return Some(n),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(prefix = %self.prefix, skipped, "subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[async_trait]
impl PluginAdapter for NotificationBus {
    fn name(&self) -> &str {
        "broadcast"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Notification
    }

    async fn health_check(&self) -> Result<HealthStatus, QueueDeskError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), QueueDeskError> {
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for NotificationBus {
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), QueueDeskError> {
        let notification = Notification {
            id: Uuid::new_v4(),
            topic: topic.to_string(),
            payload,
            published_at: Utc::now(),
        };
        match self.sender.send(notification) {
            Ok(receivers) => debug!(topic, receivers, "published"),
            Err(_) => debug!(topic, "published with no subscribers"),
        }
        Ok(())
    }
}
