// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Queuedesk dispatch and ordering engine.
//!
//! Components, leaf first:
//!
//! - [`PositionIndex`]: position of a waiting item, counted from the index.
//! - [`TicketAllocator`]: per-letter ticket codes.
//! - [`Dispatcher`]: the service point state machine and arrival re-dispatch.
//! - [`BoardAggregator`]: the combined desk-and-queue view.
//! - [`QueueEngine`]: the facade, plus catalog and queue operations.
//!
//! Each component receives its store, clock, and configuration at construction.

pub mod board;
mod catalog;
pub mod clock;
pub mod dispatch;
pub mod engine;
mod fetch;
pub mod position;
mod queue;
pub mod tickets;

pub use board::BoardAggregator;
pub use clock::{Clock, SystemClock};
pub use dispatch::{plan_transition, Action, Dispatcher};
pub use engine::{AdapterHealth, QueueEngine};
pub use position::PositionIndex;
pub use tickets::{format_ticket, TicketAllocator};
