// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process notification bus for Queuedesk.
//!
//! The engine publishes service point snapshots and board views as JSON to
//! slash-separated topics. [`NotificationBus`] fans them out over a tokio
//! broadcast channel to any number of subscribers; transports that forward to
//! MQTT, websockets, or similar sit on the receiving end.

pub mod bus;
pub mod topics;

pub use bus::{Notification, NotificationBus, TopicSubscription};
pub use topics::Topics;
