// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The generic record shape understood by every [`RecordStore`](crate::RecordStore).
//!
//! A record lives under a two-part [`RecordKey`] and may carry an [`IndexKey`]
//! that places it in the single secondary index. Everything else is a flat
//! JSON attribute map. Writes are guarded by [`Condition`]s, which are the only
//! concurrency-control primitive the engine relies on.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Non-key attributes of a record.
pub type Attributes = serde_json::Map<String, Value>;

/// Primary key: partition key plus sort key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    pub pk: String,
    pub sk: String,
}

impl RecordKey {
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.pk, self.sk)
    }
}

/// Secondary index key. Records sharing `pk` are range-queryable by `sk`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexKey {
    pub pk: String,
    pub sk: String,
}

/// A stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub key: RecordKey,
    pub index: Option<IndexKey>,
    pub attributes: Attributes,
}

impl Record {
    pub fn new(key: RecordKey) -> Self {
        Self {
            key,
            index: None,
            attributes: Attributes::new(),
        }
    }

    pub fn with_index(mut self, pk: impl Into<String>, sk: impl Into<String>) -> Self {
        self.index = Some(IndexKey {
            pk: pk.into(),
            sk: sk.into(),
        });
        self
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn str_attr(&self, name: &str) -> Option<&str> {
        self.attr(name).and_then(Value::as_str)
    }

    /// Apply an update in place: merge attributes, then replace the index sort key.
    pub fn apply(&mut self, update: &RecordUpdate) {
        for (name, value) in &update.set {
            self.attributes.insert(name.clone(), value.clone());
        }
        if let (Some(sk), Some(index)) = (&update.index_sort_key, self.index.as_mut()) {
            index.sk = sk.clone();
        }
    }
}

/// A precondition on the current state of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// The record exists.
    Exists,
    /// The record does not exist.
    NotExists,
    /// The attribute is present and equal to `value`.
    Equals { attribute: String, value: Value },
    /// The attribute is absent or differs from `value`.
    NotEquals { attribute: String, value: Value },
}

impl Condition {
    pub fn equals(attribute: &str, value: impl Into<Value>) -> Self {
        Self::Equals {
            attribute: attribute.to_string(),
            value: value.into(),
        }
    }

    pub fn not_equals(attribute: &str, value: impl Into<Value>) -> Self {
        Self::NotEquals {
            attribute: attribute.to_string(),
            value: value.into(),
        }
    }

    /// Evaluate against the record as currently stored (`None` if absent).
    pub fn holds(&self, current: Option<&Record>) -> bool {
        match self {
            Self::Exists => current.is_some(),
            Self::NotExists => current.is_none(),
            Self::Equals { attribute, value } => {
                current.and_then(|r| r.attr(attribute)) == Some(value)
            }
            Self::NotEquals { attribute, value } => {
                current.and_then(|r| r.attr(attribute)) != Some(value)
            }
        }
    }
}

/// True when every condition holds.
pub fn all_hold(conditions: &[Condition], current: Option<&Record>) -> bool {
    conditions.iter().all(|c| c.holds(current))
}

/// Partial update of an existing record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordUpdate {
    /// Attributes to set (overwriting any previous value).
    pub set: Attributes,
    /// Replacement index sort key; ignored for records outside the index.
    pub index_sort_key: Option<String>,
}

impl RecordUpdate {
    pub fn set(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set.insert(name.to_string(), value.into());
        self
    }

    pub fn index_sort_key(mut self, sk: impl Into<String>) -> Self {
        self.index_sort_key = Some(sk.into());
        self
    }
}

/// One member of a multi-item transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WriteOp {
    Put {
        record: Record,
        conditions: Vec<Condition>,
    },
    Update {
        key: RecordKey,
        update: RecordUpdate,
        conditions: Vec<Condition>,
    },
    Delete {
        key: RecordKey,
        conditions: Vec<Condition>,
    },
    /// Check conditions without writing.
    Check {
        key: RecordKey,
        conditions: Vec<Condition>,
    },
}

impl WriteOp {
    pub fn key(&self) -> &RecordKey {
        match self {
            Self::Put { record, .. } => &record.key,
            Self::Update { key, .. } | Self::Delete { key, .. } | Self::Check { key, .. } => key,
        }
    }

    pub fn conditions(&self) -> &[Condition] {
        match self {
            Self::Put { conditions, .. }
            | Self::Update { conditions, .. }
            | Self::Delete { conditions, .. }
            | Self::Check { conditions, .. } => conditions,
        }
    }

    /// Whether this op may proceed against `current`.
    ///
    /// Updates additionally require the record to exist.
    pub fn admits(&self, current: Option<&Record>) -> bool {
        if matches!(self, Self::Update { .. }) && current.is_none() {
            return false;
        }
        all_hold(self.conditions(), current)
    }
}

/// Range condition on the index sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexRange {
    All,
    BeginsWith(String),
    LessThan(String),
}

impl IndexRange {
    pub fn matches(&self, sk: &str) -> bool {
        match self {
            Self::All => true,
            Self::BeginsWith(prefix) => sk.starts_with(prefix.as_str()),
            Self::LessThan(bound) => sk < bound.as_str(),
        }
    }
}

/// A range query against the secondary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexQuery {
    pub pk: String,
    pub range: IndexRange,
    pub limit: Option<usize>,
    pub ascending: bool,
}

impl IndexQuery {
    pub fn new(pk: impl Into<String>, range: IndexRange) -> Self {
        Self {
            pk: pk.into(),
            range,
            limit: None,
            ascending: true,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn descending(mut self) -> Self {
        self.ascending = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn point() -> Record {
        Record::new(RecordKey::new("SP#", "SP#1"))
            .with_attr("servicePointStatus", "WAITING")
            .with_attr("currentQueueItem", "")
    }

    #[test]
    fn existence_conditions() {
        let rec = point();
        assert!(Condition::Exists.holds(Some(&rec)));
        assert!(!Condition::Exists.holds(None));
        assert!(Condition::NotExists.holds(None));
        assert!(!Condition::NotExists.holds(Some(&rec)));
    }

    #[test]
    fn equality_conditions_on_absent_values() {
        let rec = point();
        assert!(Condition::equals("currentQueueItem", "").holds(Some(&rec)));
        assert!(!Condition::equals("currentQueueItem", "").holds(None));
        assert!(!Condition::equals("missing", "x").holds(Some(&rec)));
        assert!(Condition::not_equals("missing", "x").holds(Some(&rec)));
        assert!(!Condition::not_equals("servicePointStatus", "WAITING").holds(Some(&rec)));
    }

    #[test]
    fn update_requires_existing_record() {
        let op = WriteOp::Update {
            key: RecordKey::new("SP#", "SP#1"),
            update: RecordUpdate::default().set("name", "Desk"),
            conditions: vec![],
        };
        assert!(!op.admits(None));
        assert!(op.admits(Some(&point())));
    }

    #[test]
    fn apply_merges_attributes_and_index() {
        let mut rec = Record::new(RecordKey::new("Q#", "Q#1"))
            .with_index("Q#S#s1", "old")
            .with_attr("queueStatus", "QUEUED");
        rec.apply(
            &RecordUpdate::default()
                .set("queueStatus", "PENDING")
                .index_sort_key("new"),
        );
        assert_eq!(rec.attr("queueStatus"), Some(&json!("PENDING")));
        assert_eq!(rec.index.as_ref().map(|i| i.sk.as_str()), Some("new"));
    }

    #[test]
    fn index_range_matching() {
        assert!(IndexRange::All.matches("anything"));
        assert!(IndexRange::BeginsWith("Q_STATUS#01".into()).matches("Q_STATUS#01_QUEUED"));
        assert!(!IndexRange::BeginsWith("Q_STATUS#02".into()).matches("Q_STATUS#01_QUEUED"));
        assert!(IndexRange::LessThan("b".into()).matches("a"));
        assert!(!IndexRange::LessThan("a".into()).matches("a"));
    }
}
