// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde attributes cannot express: non-empty names and
//! paths, positive limits, and topic prefixes that keep the topic tree flat.

use crate::diagnostic::ConfigError;
use crate::model::{QueueDeskConfig, StorageBackend};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &QueueDeskConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.engine.board_limit == 0 {
        fail("engine.board_limit must be at least 1".to_string());
    }

    let pool = config.tickets.pool_name.trim();
    if pool.is_empty() {
        fail("tickets.pool_name must not be empty".to_string());
    } else if pool.contains('#') {
        fail(format!("tickets.pool_name `{pool}` must not contain `#`"));
    }

    if config.tickets.rotate_at == Some(0) {
        fail("tickets.rotate_at must be at least 1 when set".to_string());
    }

    if config.storage.backend == StorageBackend::Sqlite
        && config.storage.database_path.trim().is_empty()
    {
        fail("storage.database_path must not be empty".to_string());
    }

    let prefix = config.notify.topic_prefix.as_str();
    if prefix.trim().is_empty() {
        fail("notify.topic_prefix must not be empty".to_string());
    } else if prefix.starts_with('/') || prefix.ends_with('/') {
        fail(format!(
            "notify.topic_prefix `{prefix}` must not start or end with `/`"
        ));
    }

    if config.notify.channel_capacity == 0 {
        fail("notify.channel_capacity must be at least 1".to_string());
    }

    let level = config.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        fail(format!(
            "logging.level `{}` is not one of {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(config: &QueueDeskConfig) -> Vec<String> {
        validate_config(config)
            .err()
            .unwrap_or_default()
            .iter()
            .map(|e| e.to_string())
            .collect()
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&QueueDeskConfig::default()).is_ok());
    }

    #[test]
    fn zero_board_limit_is_rejected() {
        let mut config = QueueDeskConfig::default();
        config.engine.board_limit = 0;
        let msgs = messages(&config);
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("engine.board_limit"));
    }

    #[test]
    fn pool_name_with_separator_is_rejected() {
        let mut config = QueueDeskConfig::default();
        config.tickets.pool_name = "Lobby#2".into();
        assert!(messages(&config)[0].contains("tickets.pool_name"));
    }

    #[test]
    fn empty_path_only_matters_for_sqlite() {
        let mut config = QueueDeskConfig::default();
        config.storage.database_path = "  ".into();
        assert!(validate_config(&config).is_err());

        config.storage.backend = StorageBackend::Memory;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = QueueDeskConfig::default();
        config.tickets.rotate_at = Some(0);
        config.notify.topic_prefix = "/branch/".into();
        config.notify.channel_capacity = 0;
        config.logging.level = "loud".into();
        assert_eq!(messages(&config).len(), 4);
    }
}
