// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record store backends for Queuedesk.
//!
//! [`SqliteStore`] persists to a WAL-mode SQLite file with embedded migrations,
//! serializing every call through `tokio-rusqlite`'s single background thread.
//! [`MemoryStore`] keeps records in a process-local map and is what tests and
//! throwaway runs use. Both evaluate write conditions the same way, through
//! the shared staging logic.

pub mod database;
pub mod memory;
pub mod migrations;
pub mod sqlite;
mod staging;

use std::sync::Arc;

use queuedesk_config::model::{StorageBackend, StorageConfig};
use queuedesk_core::{QueueDeskError, RecordStore};

pub use database::Database;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Open the backend selected by `config`.
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn RecordStore>, QueueDeskError> {
    match config.backend {
        StorageBackend::Sqlite => Ok(Arc::new(SqliteStore::open(config).await?)),
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
