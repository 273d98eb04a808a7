// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Queuedesk integration tests.
//!
//! Everything needed to run the engine deterministically without a transport.
//!
//! # Components
//!
//! - [`TestHarness`] - engine over a memory or temp SQLite store
//! - [`MockNotifier`] - captures publishes, can be told to fail
//! - [`StepClock`] - advances a fixed step on every read
//! - [`FlakyCountStore`] - store wrapper whose index counts go missing on demand

pub mod flaky_store;
pub mod harness;
pub mod mock_notifier;
pub mod step_clock;

pub use flaky_store::FlakyCountStore;
pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_notifier::MockNotifier;
pub use step_clock::StepClock;
