// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Queuedesk walk-in queueing engine.
//!
//! This crate provides the error taxonomy, domain types, the generic record
//! shape the store speaks, the key scheme that makes queue ordering work
//! without an index service, entity codecs, and the adapter traits every
//! backend implements.

pub mod codec;
pub mod error;
pub mod keys;
pub mod record;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use codec::RecordCodec;
pub use error::{ErrorKind, QueueDeskError};
pub use record::{
    Attributes, Condition, IndexKey, IndexQuery, IndexRange, Record, RecordKey, RecordUpdate,
    WriteOp,
};
pub use types::{
    AdapterType, Board, BoardEntry, EntityKind, HealthStatus, NewService, NewServicePoint,
    QueueItem, QueueItemView, QueuePriority, QueueStatus, Service, ServicePoint,
    ServicePointStatus, UpdateServicePointRequest, UpdateServiceRequest,
};

pub use traits::{NotificationSink, PluginAdapter, RecordStore};
