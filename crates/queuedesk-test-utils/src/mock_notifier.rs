// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock notification sink that records every publish.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use queuedesk_core::{AdapterType, HealthStatus, NotificationSink, PluginAdapter, QueueDeskError};

/// A captured publish.
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub topic: String,
    pub payload: serde_json::Value,
}

/// Captures publishes. With [`MockNotifier::fail`] set, every publish errors
/// instead and nothing is captured.
#[derive(Default)]
pub struct MockNotifier {
    published: Mutex<Vec<Published>>,
    failing: AtomicBool,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent publishes fail (or succeed again).
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn published(&self) -> Vec<Published> {
        self.published.lock().await.clone()
    }

    /// Payloads published to exactly `topic`, oldest first.
    pub async fn payloads_for(&self, topic: &str) -> Vec<serde_json::Value> {
        self.published
            .lock()
            .await
            .iter()
            .filter(|p| p.topic == topic)
            .map(|p| p.payload.clone())
            .collect()
    }

    pub async fn clear(&self) {
        self.published.lock().await.clear();
    }
}

#[async_trait]
impl PluginAdapter for MockNotifier {
    fn name(&self) -> &str {
        "mock-notifier"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Notification
    }

    async fn health_check(&self) -> Result<HealthStatus, QueueDeskError> {
        if self.failing.load(Ordering::SeqCst) {
            Ok(HealthStatus::Degraded("publishing disabled".to_string()))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }

    async fn shutdown(&self) -> Result<(), QueueDeskError> {
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for MockNotifier {
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), QueueDeskError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(QueueDeskError::Notification {
                message: format!("mock publish to {topic} refused"),
                source: None,
            });
        }
        self.published.lock().await.push(Published {
            topic: topic.to_string(),
            payload,
        });
        Ok(())
    }
}
