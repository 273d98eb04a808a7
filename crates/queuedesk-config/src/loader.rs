// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./queuedesk.toml` > `~/.config/queuedesk/queuedesk.toml` >
//! `/etc/queuedesk/queuedesk.toml` with environment variable overrides via `QUEUEDESK_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::QueueDeskConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/queuedesk/queuedesk.toml` (system-wide)
/// 3. `~/.config/queuedesk/queuedesk.toml` (user XDG config)
/// 4. `./queuedesk.toml` (local directory)
/// 5. `QUEUEDESK_*` environment variables
pub fn load_config() -> Result<QueueDeskConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<QueueDeskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(QueueDeskConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<QueueDeskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(QueueDeskConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(QueueDeskConfig::default()))
        .merge(Toml::file("/etc/queuedesk/queuedesk.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("queuedesk/queuedesk.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("queuedesk.toml"))
        .merge(env_provider())
}

/// Environment variable provider mapping section prefixes to dotted keys.
///
/// Uses `Env::map()` rather than `Env::split("_")`: `QUEUEDESK_ENGINE_BOARD_LIMIT`
/// must map to `engine.board_limit`, not `engine.board.limit`.
fn env_provider() -> Env {
    Env::prefixed("QUEUEDESK_").map(|key| {
        // `key` keeps the variable's case once the prefix is stripped.
        let mapped = key
            .as_str()
            .to_ascii_lowercase()
            .replacen("engine_", "engine.", 1)
            .replacen("tickets_", "tickets.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("notify_", "notify.", 1)
            .replacen("logging_", "logging.", 1);
        mapped.into()
    })
}
