// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human-friendly ticket codes such as `A-007`.
//!
//! One counter per first letter of the service name, kept in the store under
//! the configured pool. Counters are only ever incremented.

use std::sync::Arc;

use tracing::debug;

use queuedesk_config::model::TicketConfig;
use queuedesk_core::codec::attr;
use queuedesk_core::{keys, QueueDeskError, RecordStore, Service};

pub struct TicketAllocator {
    store: Arc<dyn RecordStore>,
    config: TicketConfig,
}

impl TicketAllocator {
    pub fn new(store: Arc<dyn RecordStore>, config: TicketConfig) -> Self {
        Self { store, config }
    }

    /// Allocate the next code for `service`.
    pub async fn allocate(&self, service: &Service) -> Result<String, QueueDeskError> {
        let letter = pool_letter(service)?;
        let key = keys::ticket_pool_key(&self.config.pool_name, letter);
        let counter = self.store.increment(&key, attr::COUNTER, 1).await?;
        let code = format_ticket(letter, counter, self.config.rotate_at)?;
        debug!(service = %service.id, counter, code = %code, "ticket allocated");
        Ok(code)
    }
}

/// First non-blank character of the service name, case preserved.
fn pool_letter(service: &Service) -> Result<char, QueueDeskError> {
    service
        .name
        .trim_start()
        .chars()
        .next()
        .ok_or_else(|| {
            QueueDeskError::InvalidState(format!("service {} has an empty name", service.id))
        })
}

/// Render `counter` as `<letter>-<number>`, zero-padded to three digits.
///
/// With `rotate_at` set, the displayed number cycles through `1..=rotate_at`.
pub fn format_ticket(letter: char, counter: i64, rotate_at: Option<u64>) -> Result<String, QueueDeskError> {
    let counter = u64::try_from(counter)
        .ok()
        .filter(|c| *c > 0)
        .ok_or_else(|| QueueDeskError::Internal(format!("ticket counter is {counter}")))?;
    let shown = match rotate_at {
        Some(cycle) if cycle > 0 => (counter - 1) % cycle + 1,
        _ => counter,
    };
    Ok(format!("{letter}-{shown:03}"))
}
