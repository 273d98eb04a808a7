// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping between domain entities and the generic [`Record`] shape.
//!
//! `from_record(to_record(e)) == e` for every valid entity whose timestamps carry
//! at most microsecond precision.

use std::str::FromStr;

use serde_json::Value;

use crate::error::QueueDeskError;
use crate::keys;
use crate::record::{Record, RecordKey, RecordUpdate};
use crate::types::{QueueItem, QueuePriority, QueueStatus, Service, ServicePoint, ServicePointStatus};

/// Attribute names as persisted.
pub mod attr {
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const SERVICE_ID: &str = "serviceId";
    pub const QUEUE_STATUS: &str = "queueStatus";
    pub const PRIORITY: &str = "priority";
    pub const DATE: &str = "date";
    pub const MEMORABLE_ID: &str = "memorableId";
    pub const SERVICE_IDS: &str = "serviceIds";
    pub const SERVICE_POINT_STATUS: &str = "servicePointStatus";
    pub const CURRENT_QUEUE_ITEM: &str = "currentQueueItem";
    pub const SERVICE_POINT_NUMBER: &str = "servicePointNumber";
    pub const COUNTER: &str = "counter";
}

/// Conversion between an entity and its stored record.
pub trait RecordCodec: Sized {
    /// Primary key of this entity.
    fn key(&self) -> RecordKey;

    fn to_record(&self) -> Record;

    fn from_record(record: &Record) -> Result<Self, QueueDeskError>;
}

fn required_str<'a>(record: &'a Record, name: &str) -> Result<&'a str, QueueDeskError> {
    record.str_attr(name).ok_or_else(|| {
        QueueDeskError::Internal(format!("record {} is missing `{name}`", record.key))
    })
}

fn parse_enum<T: FromStr>(record: &Record, name: &str) -> Result<T, QueueDeskError> {
    let raw = required_str(record, name)?;
    raw.parse().map_err(|_| {
        QueueDeskError::Internal(format!("record {} has bad `{name}` value `{raw}`", record.key))
    })
}

impl RecordCodec for Service {
    fn key(&self) -> RecordKey {
        keys::service_key(&self.id)
    }

    fn to_record(&self) -> Record {
        Record::new(self.key())
            .with_attr(attr::NAME, self.name.as_str())
            .with_attr(attr::DESCRIPTION, self.description.as_str())
    }

    fn from_record(record: &Record) -> Result<Self, QueueDeskError> {
        Ok(Self {
            id: keys::id_from_sort_key(&record.key.sk, keys::SERVICE_PREFIX)?.to_string(),
            name: required_str(record, attr::NAME)?.to_string(),
            description: record.str_attr(attr::DESCRIPTION).unwrap_or_default().to_string(),
        })
    }
}

impl RecordCodec for QueueItem {
    fn key(&self) -> RecordKey {
        keys::queue_item_key(&self.id)
    }

    fn to_record(&self) -> Record {
        Record::new(self.key())
            .with_index(keys::queue_index_pk(&self.service_id), index_sort_key(self))
            .with_attr(attr::SERVICE_ID, self.service_id.as_str())
            .with_attr(attr::QUEUE_STATUS, self.queue_status.to_string())
            .with_attr(attr::PRIORITY, self.priority.to_string())
            .with_attr(attr::DATE, keys::format_timestamp(&self.date))
            .with_attr(attr::MEMORABLE_ID, self.memorable_id.as_str())
    }

    fn from_record(record: &Record) -> Result<Self, QueueDeskError> {
        Ok(Self {
            id: keys::id_from_sort_key(&record.key.sk, keys::QUEUE_ITEM_PREFIX)?.to_string(),
            service_id: required_str(record, attr::SERVICE_ID)?.to_string(),
            queue_status: parse_enum::<QueueStatus>(record, attr::QUEUE_STATUS)?,
            priority: parse_enum::<QueuePriority>(record, attr::PRIORITY)?,
            date: keys::parse_timestamp(required_str(record, attr::DATE)?)?,
            memorable_id: required_str(record, attr::MEMORABLE_ID)?.to_string(),
        })
    }
}

impl RecordCodec for ServicePoint {
    fn key(&self) -> RecordKey {
        keys::service_point_key(&self.id)
    }

    fn to_record(&self) -> Record {
        Record::new(self.key())
            .with_attr(attr::SERVICE_IDS, self.service_ids.clone())
            .with_attr(attr::NAME, self.name.as_str())
            .with_attr(attr::DESCRIPTION, self.description.as_str())
            .with_attr(attr::SERVICE_POINT_STATUS, self.service_point_status.to_string())
            .with_attr(
                attr::CURRENT_QUEUE_ITEM,
                self.current_queue_item.clone().unwrap_or_default(),
            )
            .with_attr(attr::SERVICE_POINT_NUMBER, self.service_point_number.as_str())
    }

    fn from_record(record: &Record) -> Result<Self, QueueDeskError> {
        let service_ids = match record.attr(attr::SERVICE_IDS) {
            Some(Value::Array(values)) => values
                .iter()
                .map(|v| {
                    v.as_str().map(str::to_string).ok_or_else(|| {
                        QueueDeskError::Internal(format!(
                            "record {} has a non-string service id",
                            record.key
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            None | Some(Value::Null) => Vec::new(),
            Some(other) => {
                return Err(QueueDeskError::Internal(format!(
                    "record {} has bad `serviceIds`: {other}",
                    record.key
                )));
            }
        };
        let current_queue_item = record
            .str_attr(attr::CURRENT_QUEUE_ITEM)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        Ok(Self {
            id: keys::id_from_sort_key(&record.key.sk, keys::SERVICE_POINT_PREFIX)?.to_string(),
            service_ids,
            name: record.str_attr(attr::NAME).unwrap_or_default().to_string(),
            description: record.str_attr(attr::DESCRIPTION).unwrap_or_default().to_string(),
            service_point_status: parse_enum::<ServicePointStatus>(
                record,
                attr::SERVICE_POINT_STATUS,
            )?,
            current_queue_item,
            service_point_number: record
                .str_attr(attr::SERVICE_POINT_NUMBER)
                .unwrap_or_default()
                .to_string(),
        })
    }
}

/// Index sort key of a queue item in its current state.
pub fn index_sort_key(item: &QueueItem) -> String {
    keys::index_sort_key(item.queue_status, item.priority, &item.date, &item.id)
}

/// Update rewriting every ordering-relevant attribute of `item` plus its index key.
pub fn ordering_update(item: &QueueItem) -> RecordUpdate {
    RecordUpdate::default()
        .set(attr::QUEUE_STATUS, item.queue_status.to_string())
        .set(attr::PRIORITY, item.priority.to_string())
        .set(attr::DATE, keys::format_timestamp(&item.date))
        .index_sort_key(index_sort_key(item))
}
