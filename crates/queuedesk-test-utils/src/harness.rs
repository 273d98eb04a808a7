// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end engine tests.
//!
//! `TestHarness` assembles a [`QueueEngine`] over a memory or temp SQLite store,
//! a [`MockNotifier`], and a [`StepClock`], plus shortcuts for the setup most
//! scenarios repeat.

use std::sync::Arc;

use queuedesk_config::model::{QueueDeskConfig, StorageBackend};
use queuedesk_core::{
    NewService, NewServicePoint, QueueDeskError, QueueItemView, RecordStore, Service,
    ServicePoint, ServicePointStatus,
};
use queuedesk_engine::QueueEngine;

use crate::flaky_store::FlakyCountStore;
use crate::mock_notifier::MockNotifier;
use crate::step_clock::StepClock;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: QueueDeskConfig,
    count_misses: Option<u32>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = QueueDeskConfig::default();
        config.storage.backend = StorageBackend::Memory;
        Self {
            config,
            count_misses: None,
        }
    }

    /// Back the engine with a SQLite file in a temp directory.
    pub fn with_sqlite(mut self) -> Self {
        self.config.storage.backend = StorageBackend::Sqlite;
        self
    }

    /// Replace the whole configuration. The storage path is still redirected
    /// into a temp directory when the backend is SQLite.
    pub fn with_config(mut self, config: QueueDeskConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_board_limit(mut self, limit: usize) -> Self {
        self.config.engine.board_limit = limit;
        self
    }

    pub fn with_ticket_rotation(mut self, rotate_at: u64) -> Self {
        self.config.tickets.rotate_at = Some(rotate_at);
        self
    }

    /// Wrap the store so the first `misses` index counts come back empty.
    pub fn with_count_misses(mut self, misses: u32) -> Self {
        self.count_misses = Some(misses);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, QueueDeskError> {
        let mut config = self.config;

        let temp_dir = match config.storage.backend {
            StorageBackend::Sqlite => {
                let dir = tempfile::TempDir::new()
                    .map_err(|e| QueueDeskError::Storage { source: e.into() })?;
                config.storage.database_path =
                    dir.path().join("test.db").to_string_lossy().to_string();
                Some(dir)
            }
            StorageBackend::Memory => None,
        };

        let mut store = queuedesk_storage::open_store(&config.storage).await?;
        let flaky = self
            .count_misses
            .map(|misses| Arc::new(FlakyCountStore::new(Arc::clone(&store), misses)));
        if let Some(flaky) = &flaky {
            store = Arc::clone(flaky) as Arc<dyn RecordStore>;
        }

        let notifier = Arc::new(MockNotifier::new());
        let clock = Arc::new(StepClock::default());
        let engine = Arc::new(QueueEngine::new(
            Arc::clone(&store),
            notifier.clone(),
            clock.clone(),
            &config,
        ));

        Ok(TestHarness {
            engine,
            store,
            notifier,
            clock,
            flaky,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a mock notifier and throwaway storage.
pub struct TestHarness {
    pub engine: Arc<QueueEngine>,
    /// The store the engine writes to (wrapped when count misses are set).
    pub store: Arc<dyn RecordStore>,
    pub notifier: Arc<MockNotifier>,
    pub clock: Arc<StepClock>,
    /// Present when built with [`TestHarnessBuilder::with_count_misses`].
    pub flaky: Option<Arc<FlakyCountStore>>,
    pub config: QueueDeskConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: Option<tempfile::TempDir>,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Memory-backed harness with default configuration.
    pub async fn memory() -> Result<Self, QueueDeskError> {
        Self::builder().build().await
    }

    pub async fn service(&self, name: &str) -> Result<Service, QueueDeskError> {
        self.engine
            .create_service(NewService {
                name: name.to_string(),
                description: format!("{name} counter"),
            })
            .await
    }

    /// Create a CLOSED service point labelled `number` serving `service_ids`.
    pub async fn point(
        &self,
        number: &str,
        service_ids: &[&str],
    ) -> Result<ServicePoint, QueueDeskError> {
        self.engine
            .create_service_point(NewServicePoint {
                name: format!("Desk {number}"),
                description: String::new(),
                service_ids: service_ids.iter().map(|s| s.to_string()).collect(),
                service_point_number: number.to_string(),
            })
            .await
    }

    /// Join the queue and run the arrival callback, as the change feed would.
    pub async fn join(&self, service_id: &str) -> Result<QueueItemView, QueueDeskError> {
        let view = self.engine.join_queue(service_id).await?;
        self.engine.on_queue_item_inserted(service_id).await?;
        Ok(view)
    }

    pub async fn set_status(
        &self,
        point_id: &str,
        status: ServicePointStatus,
    ) -> Result<ServicePoint, QueueDeskError> {
        self.engine.update_service_point_status(point_id, status).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use queuedesk_core::PluginAdapter;

    #[tokio::test]
    async fn memory_harness_builds() {
        let harness = TestHarness::memory().await.unwrap();
        assert_eq!(harness.store.name(), "memory");
        let service = harness.service("Passports").await.unwrap();
        assert_eq!(harness.engine.list_services().await.unwrap(), vec![service]);
    }

    #[tokio::test]
    async fn sqlite_harness_uses_temp_file() {
        let harness = TestHarness::builder().with_sqlite().build().await.unwrap();
        assert_eq!(harness.store.name(), "sqlite");
        assert!(harness.config.storage.database_path.ends_with("test.db"));
    }

    #[tokio::test]
    async fn count_misses_wrap_the_store() {
        let harness = TestHarness::builder()
            .with_count_misses(1)
            .build()
            .await
            .unwrap();
        assert_eq!(harness.store.name(), "flaky-count");
        assert_eq!(harness.flaky.as_ref().unwrap().remaining_misses(), 1);
    }
}
