// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Queuedesk dispatch engine.

use thiserror::Error;

use crate::types::{EntityKind, ServicePointStatus};

/// The primary error type used across the record store, engine, and adapters.
#[derive(Debug, Error)]
pub enum QueueDeskError {
    /// A referenced queue item, service point, or service does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: String },

    /// The requested service point status is not reachable from the current one.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: ServicePointStatus,
        to: ServicePointStatus,
    },

    /// WAITING was requested on a service point with no configured services.
    #[error("service point {service_point_id} has no service configured")]
    NoServiceConfigured { service_point_id: String },

    /// An action that needs a bound queue item found none.
    #[error("service point {service_point_id} has no bound queue item")]
    MissingBoundItem { service_point_id: String },

    /// A conditioned write was rejected because its precondition no longer held.
    #[error("condition failed for record {key}")]
    ConditionFailed { key: String },

    /// A secondary index read returned no count where one was expected.
    #[error("index consistency violation: {0}")]
    ConsistencyViolation(String),

    /// The entity is not in a state that allows the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The operation would break a reference held by another record.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Configuration errors (invalid TOML, failed validation).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Notification transport errors.
    #[error("notification error: {message}")]
    Notification {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors, including undecodable records.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification a transport layer maps onto its status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidRequest,
    Internal,
}

impl QueueDeskError {
    /// Shorthand for a [`QueueDeskError::NotFound`].
    pub fn not_found(entity: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Classify this error for the caller.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::ConditionFailed { .. } | Self::Conflict(_) => ErrorKind::Conflict,
            Self::InvalidTransition { .. }
            | Self::NoServiceConfigured { .. }
            | Self::MissingBoundItem { .. }
            | Self::InvalidState(_) => ErrorKind::InvalidRequest,
            Self::ConsistencyViolation(_)
            | Self::Config(_)
            | Self::Storage { .. }
            | Self::Notification { .. }
            | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether a caller may re-read and retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConditionFailed { .. } | Self::ConsistencyViolation(_)
        )
    }
}
