// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Queuedesk engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Queuedesk configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueDeskConfig {
    /// Dispatch and board settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Ticket code allocation.
    #[serde(default)]
    pub tickets: TicketConfig,

    /// Record store backend.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Notification publishing.
    #[serde(default)]
    pub notify: NotifyConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Engine behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Maximum waiting items shown on the board, per service.
    #[serde(default = "default_board_limit")]
    pub board_limit: usize,

    /// How many times a position lookup is retried after the index
    /// returns no count.
    #[serde(default = "default_position_retries")]
    pub position_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            board_limit: default_board_limit(),
            position_retries: default_position_retries(),
        }
    }
}

fn default_board_limit() -> usize {
    10
}

fn default_position_retries() -> u32 {
    1
}

/// Ticket code configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TicketConfig {
    /// Name of the counter pool; forms the counter's partition key.
    #[serde(default = "default_pool_name")]
    pub pool_name: String,

    /// When set, displayed numbers wrap back to 1 after this value.
    /// The stored counter keeps growing either way.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotate_at: Option<u64>,
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            pool_name: default_pool_name(),
            rotate_at: None,
        }
    }
}

fn default_pool_name() -> String {
    "FirstPool".to_string()
}

/// Which record store implementation to run against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// SQLite file on disk.
    #[default]
    Sqlite,
    /// Process-local, lost on exit.
    Memory,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("queuedesk").join("queuedesk.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("queuedesk.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Notification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotifyConfig {
    /// Prefix of every published topic, e.g. `<prefix>/board`.
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,

    /// Buffer size of the in-process broadcast channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            topic_prefix: default_topic_prefix(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_topic_prefix() -> String {
    "queuedesk".to_string()
}

fn default_channel_capacity() -> usize {
    256
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = QueueDeskConfig::default();
        assert_eq!(config.engine.board_limit, 10);
        assert_eq!(config.engine.position_retries, 1);
        assert_eq!(config.tickets.pool_name, "FirstPool");
        assert_eq!(config.tickets.rotate_at, None);
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert!(config.storage.database_path.ends_with("queuedesk.db"));
        assert!(config.storage.wal_mode);
        assert_eq!(config.notify.topic_prefix, "queuedesk");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn backend_names_are_lowercase() {
        let parsed: StorageConfig = toml::from_str("backend = \"memory\"").unwrap();
        assert_eq!(parsed.backend, StorageBackend::Memory);
        assert!(toml::from_str::<StorageConfig>("backend = \"Postgres\"").is_err());
    }
}
