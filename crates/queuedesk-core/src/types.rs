// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the record store, engine, and adapters.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter plugged into the engine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Notification,
}

/// Entity names used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum EntityKind {
    Service,
    QueueItem,
    ServicePoint,
    TicketPool,
}

/// Lifecycle status of a queue item.
///
/// Declaration order is the ordering rank used by the order key.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueStatus {
    Queued,
    Pending,
    InService,
    Served,
    Skipped,
}

/// Priority of a queue item. `High` sorts before `Medium`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueuePriority {
    High,
    Medium,
}

/// Operating status of a service point.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServicePointStatus {
    Closed,
    Waiting,
    InService,
    Served,
}

impl ServicePointStatus {
    pub const ALL: [ServicePointStatus; 4] = [
        ServicePointStatus::Closed,
        ServicePointStatus::Waiting,
        ServicePointStatus::InService,
        ServicePointStatus::Served,
    ];
}

/// A named service customers queue for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// A customer's place in a service queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    pub id: String,
    pub service_id: String,
    pub queue_status: QueueStatus,
    pub priority: QueuePriority,
    /// Time of the last status change; also the ordering tiebreaker.
    pub date: DateTime<Utc>,
    /// Human-friendly ticket code, e.g. `A-007`.
    pub memorable_id: String,
}

impl QueueItem {
    /// Move the item to `status` and refresh its timestamp.
    ///
    /// The new timestamp is strictly later than the previous one, so the refreshed
    /// order key never collides with the key it replaces.
    pub fn advance(&mut self, status: QueueStatus, now: DateTime<Utc>) {
        let floor = self.date + Duration::microseconds(1);
        self.queue_status = status;
        self.date = now.max(floor);
    }
}

/// A counter or desk that serves one or more services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePoint {
    pub id: String,
    pub service_ids: Vec<String>,
    pub name: String,
    pub description: String,
    pub service_point_status: ServicePointStatus,
    /// Id of the bound queue item, if any.
    pub current_queue_item: Option<String>,
    pub service_point_number: String,
}

impl ServicePoint {
    pub fn bound_item(&self) -> Option<&str> {
        self.current_queue_item.as_deref()
    }

    pub fn serves(&self, service_id: &str) -> bool {
        self.service_ids.iter().any(|s| s == service_id)
    }
}

// --- Request DTOs ---

/// Input for creating a service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewService {
    pub name: String,
    pub description: String,
}

/// Partial update of a service. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Input for creating a service point. It always starts CLOSED and unbound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewServicePoint {
    pub name: String,
    pub description: String,
    pub service_ids: Vec<String>,
    pub service_point_number: String,
}

/// Partial update of a service point. Status and binding are not updatable here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateServicePointRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub service_ids: Option<Vec<String>>,
    pub service_point_number: Option<String>,
}

impl UpdateServicePointRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.service_ids.is_none()
            && self.service_point_number.is_none()
    }
}

// --- Read views ---

/// A queue item with its 1-based position, present only while QUEUED.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItemView {
    pub item: QueueItem,
    pub position: Option<u32>,
}

/// One line on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardEntry {
    /// Number of the service point handling the item; empty for waiting items.
    pub service_point_label: String,
    pub item: QueueItem,
}

/// Point-in-time board view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub items: Vec<BoardEntry>,
}
