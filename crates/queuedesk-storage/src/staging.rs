// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Condition evaluation and next-state computation shared by both backends.

use std::collections::HashSet;

use queuedesk_core::{QueueDeskError, Record, WriteOp};

/// What a single op does to its key once admitted.
#[derive(Debug)]
pub(crate) enum Staged {
    Write(Record),
    Remove,
    Keep,
}

/// Evaluate `op` against the current record and compute its effect.
pub(crate) fn stage(op: &WriteOp, current: Option<&Record>) -> Result<Staged, QueueDeskError> {
    if !op.admits(current) {
        return Err(QueueDeskError::ConditionFailed {
            key: op.key().to_string(),
        });
    }
    Ok(match (op, current) {
        (WriteOp::Put { record, .. }, _) => Staged::Write(record.clone()),
        (WriteOp::Update { update, .. }, Some(existing)) => {
            let mut next = existing.clone();
            next.apply(update);
            Staged::Write(next)
        }
        (WriteOp::Delete { .. }, _) => Staged::Remove,
        // Update on an absent record is refused by `admits`.
        (WriteOp::Update { .. }, None) | (WriteOp::Check { .. }, _) => Staged::Keep,
    })
}

/// A transaction may touch each key at most once.
pub(crate) fn ensure_distinct_keys(ops: &[WriteOp]) -> Result<(), QueueDeskError> {
    let mut seen = HashSet::with_capacity(ops.len());
    for op in ops {
        if !seen.insert(op.key()) {
            return Err(QueueDeskError::Internal(format!(
                "transaction touches {} more than once",
                op.key()
            )));
        }
    }
    Ok(())
}

/// Numeric value of `attribute`, treating an absent record or attribute as zero.
pub(crate) fn counter_value(current: Option<&Record>, attribute: &str) -> Result<i64, QueueDeskError> {
    match current.and_then(|r| r.attr(attribute)) {
        None => Ok(0),
        Some(value) => value.as_i64().ok_or_else(|| {
            QueueDeskError::Internal(format!("attribute `{attribute}` is not an integer: {value}"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use queuedesk_core::{Condition, RecordKey, RecordUpdate};

    fn key() -> RecordKey {
        RecordKey::new("SP#", "SP#1")
    }

    #[test]
    fn failed_condition_names_the_key() {
        let op = WriteOp::Check {
            key: key(),
            conditions: vec![Condition::Exists],
        };
        match stage(&op, None) {
            Err(QueueDeskError::ConditionFailed { key }) => assert_eq!(key, "SP#/SP#1"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn update_merges_into_current() {
        let current = Record::new(key()).with_attr("name", "Desk").with_attr("n", 1);
        let op = WriteOp::Update {
            key: key(),
            update: RecordUpdate::default().set("n", 2),
            conditions: vec![],
        };
        match stage(&op, Some(&current)).unwrap() {
            Staged::Write(next) => {
                assert_eq!(next.str_attr("name"), Some("Desk"));
                assert_eq!(next.attr("n").and_then(|v| v.as_i64()), Some(2));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let check = WriteOp::Check {
            key: key(),
            conditions: vec![],
        };
        assert!(ensure_distinct_keys(&[check.clone(), check]).is_err());
    }

    #[test]
    fn counter_defaults_to_zero() {
        assert_eq!(counter_value(None, "counter").unwrap(), 0);
        let rec = Record::new(key()).with_attr("counter", "x");
        assert!(counter_value(Some(&rec), "counter").is_err());
    }
}
