// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification transport trait.

use async_trait::async_trait;

use crate::error::QueueDeskError;
use crate::traits::adapter::PluginAdapter;

/// Fire-and-forget publisher of JSON payloads to named topics.
///
/// Delivery is best effort. The engine never retries a failed publish.
#[async_trait]
pub trait NotificationSink: PluginAdapter {
    /// Publish `payload` to `topic`.
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), QueueDeskError>;
}
