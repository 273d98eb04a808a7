// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic clock.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use queuedesk_engine::Clock;

/// Returns `start`, `start + step`, `start + 2*step`, ... on successive reads.
pub struct StepClock {
    next_micros: AtomicI64,
    step_micros: i64,
}

impl StepClock {
    pub fn new(start: DateTime<Utc>, step: TimeDelta) -> Self {
        Self {
            next_micros: AtomicI64::new(start.timestamp_micros()),
            step_micros: step.num_microseconds().unwrap_or(1).max(1),
        }
    }

    /// The time the next read will return, without consuming it.
    pub fn peek(&self) -> DateTime<Utc> {
        to_time(self.next_micros.load(Ordering::SeqCst))
    }

    /// Jump backwards (or forwards) so the next read returns `at`.
    pub fn set(&self, at: DateTime<Utc>) {
        self.next_micros.store(at.timestamp_micros(), Ordering::SeqCst);
    }
}

impl Default for StepClock {
    /// Starts at 2026-01-05 09:00:00 UTC and steps one second.
    fn default() -> Self {
        let start = Utc
            .with_ymd_and_hms(2026, 1, 5, 9, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        Self::new(start, TimeDelta::seconds(1))
    }
}

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        to_time(self.next_micros.fetch_add(self.step_micros, Ordering::SeqCst))
    }
}

fn to_time(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or_default()
}
