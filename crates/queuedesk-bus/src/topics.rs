// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Topic naming.

/// Builds topic names under a fixed prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    prefix: String,
}

impl Topics {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `<prefix>/service-points/<id>`: full snapshot after every status change.
    pub fn service_point(&self, id: &str) -> String {
        format!("{}/service-points/{id}", self.prefix)
    }

    /// `<prefix>/board`: the current board view.
    pub fn board(&self) -> String {
        format!("{}/board", self.prefix)
    }

    /// Prefix matching every service point topic.
    pub fn all_service_points(&self) -> String {
        format!("{}/service-points/", self.prefix)
    }
}
