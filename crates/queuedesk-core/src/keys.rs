// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key scheme for the single logical table.
//!
//! Every prefix literal lives here. Entities are told apart by partition key:
//!
//! | Entity        | pk               | sk              | index pk            | index sk              |
//! |---------------|------------------|-----------------|---------------------|-----------------------|
//! | QueueItem     | `Q#`             | `Q#<id>`        | `Q#S#<serviceId>`   | order key + `#<id>`   |
//! | ServicePoint  | `SP#`            | `SP#<id>`       |                     |                       |
//! | Service       | `S#`             | `S#<id>`        |                     |                       |
//! | Ticket pool   | `PI#<poolName>`  | `<firstLetter>` |                     |                       |
//!
//! The order key is the only ordering mechanism in the system. String comparison
//! of two order keys must agree with tuple comparison of
//! `(status rank, priority rank, timestamp)`; the fixed-width codes below and the
//! fixed-width timestamp format exist to make that hold.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::QueueDeskError;
use crate::record::RecordKey;
use crate::types::{QueuePriority, QueueStatus};

pub const QUEUE_ITEM_PREFIX: &str = "Q#";
pub const SERVICE_PREFIX: &str = "S#";
pub const SERVICE_POINT_PREFIX: &str = "SP#";
pub const TICKET_POOL_PREFIX: &str = "PI#";

pub const STATUS_PREFIX: &str = "Q_STATUS#";
pub const PRIORITY_PREFIX: &str = "Q_PRIORITY#";
pub const DATE_PREFIX: &str = "Q_DATE";

/// Separator between the order key and the item id in the index sort key.
pub const ID_SEPARATOR: char = '#';

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

pub fn service_key(id: &str) -> RecordKey {
    RecordKey::new(SERVICE_PREFIX, format!("{SERVICE_PREFIX}{id}"))
}

pub fn service_point_key(id: &str) -> RecordKey {
    RecordKey::new(SERVICE_POINT_PREFIX, format!("{SERVICE_POINT_PREFIX}{id}"))
}

pub fn queue_item_key(id: &str) -> RecordKey {
    RecordKey::new(QUEUE_ITEM_PREFIX, format!("{QUEUE_ITEM_PREFIX}{id}"))
}

pub fn ticket_pool_key(pool_name: &str, letter: char) -> RecordKey {
    RecordKey::new(format!("{TICKET_POOL_PREFIX}{pool_name}"), letter.to_string())
}

/// Index partition holding every queue item of a service.
pub fn queue_index_pk(service_id: &str) -> String {
    format!("{QUEUE_ITEM_PREFIX}{SERVICE_PREFIX}{service_id}")
}

/// Recover an entity id from its sort key.
pub fn id_from_sort_key<'a>(sk: &'a str, prefix: &str) -> Result<&'a str, QueueDeskError> {
    sk.strip_prefix(prefix)
        .ok_or_else(|| QueueDeskError::Internal(format!("sort key `{sk}` lacks prefix `{prefix}`")))
}

pub fn status_code(status: QueueStatus) -> &'static str {
    match status {
        QueueStatus::Queued => "01_QUEUED",
        QueueStatus::Pending => "02_PENDING",
        QueueStatus::InService => "03_IN_SERVICE",
        QueueStatus::Served => "04_SERVED",
        QueueStatus::Skipped => "05_SKIPPED",
    }
}

pub fn priority_code(priority: QueuePriority) -> &'static str {
    match priority {
        QueuePriority::High => "01_HIGH",
        QueuePriority::Medium => "02_MEDIUM",
    }
}

/// Fixed-width UTC timestamp with microsecond precision.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, QueueDeskError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| QueueDeskError::Internal(format!("bad timestamp `{s}`: {e}")))
}

/// Prefix shared by every order key with the given status.
pub fn status_prefix(status: QueueStatus) -> String {
    format!("{STATUS_PREFIX}{}", status_code(status))
}

/// Build the sortable order key for `(status, priority, timestamp)`.
pub fn build_order_key(status: QueueStatus, priority: QueuePriority, ts: &DateTime<Utc>) -> String {
    format!(
        "{STATUS_PREFIX}{}{PRIORITY_PREFIX}{}{DATE_PREFIX}{}",
        status_code(status),
        priority_code(priority),
        format_timestamp(ts)
    )
}

/// Index sort key: the order key made unique by the item id.
pub fn index_sort_key(
    status: QueueStatus,
    priority: QueuePriority,
    ts: &DateTime<Utc>,
    id: &str,
) -> String {
    format!("{}{ID_SEPARATOR}{id}", build_order_key(status, priority, ts))
}
