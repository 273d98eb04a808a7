// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service point state machine.
//!
//! A status change request is first turned into a plan, a short list of
//! [`Action`]s, by [`plan_transition`]. The [`Dispatcher`] then runs each action
//! as one conditioned multi-record write. Conditions are checked against the
//! state observed when the action started, so a concurrent change between the
//! read and the write surfaces as `ConditionFailed` instead of a lost update.
//!
//! | Current    | Requested  | Plan                         |
//! |------------|------------|------------------------------|
//! | CLOSED     | WAITING    | start waiting                |
//! | WAITING    | CLOSED     | put item back, close         |
//! | WAITING    | IN_SERVICE | start servicing              |
//! | WAITING    | WAITING    | start waiting                |
//! | IN_SERVICE | CLOSED     | mark served, close           |
//! | IN_SERVICE | WAITING    | mark served, start waiting   |
//! | SERVED     | CLOSED     | close                        |
//! | SERVED     | WAITING    | start waiting                |
//!
//! Requesting the current status is a no-op for CLOSED, IN_SERVICE and SERVED.
//! Everything else is an invalid transition.

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info, warn};

use queuedesk_bus::Topics;
use queuedesk_core::codec::{attr, ordering_update};
use queuedesk_core::{
    keys, Condition, EntityKind, IndexQuery, IndexRange, NotificationSink, QueueDeskError,
    QueueItem, QueueStatus, Record, RecordCodec, RecordStore, RecordUpdate, ServicePoint,
    ServicePointStatus, WriteOp,
};

use crate::clock::Clock;
use crate::fetch;

/// One atomic step of a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Claim the next QUEUED item (if unbound) and mark the point WAITING.
    StartWaiting,
    /// Move the bound item to IN_SERVICE.
    StartServicing,
    /// Finish the bound item and release it.
    MarkServed,
    /// Return the bound item to the queue and release it.
    PutBack,
    Close,
}

/// Actions that take a service point from `current` to `requested`.
pub fn plan_transition(
    current: ServicePointStatus,
    requested: ServicePointStatus,
) -> Result<&'static [Action], QueueDeskError> {
    use Action::*;
    use ServicePointStatus as S;

    let plan: &'static [Action] = match (current, requested) {
        (S::Closed, S::Waiting) => &[StartWaiting],
        (S::Closed, S::Closed) => &[],
        (S::Waiting, S::Closed) => &[PutBack, Close],
        (S::Waiting, S::InService) => &[StartServicing],
        (S::Waiting, S::Waiting) => &[StartWaiting],
        (S::InService, S::Closed) => &[MarkServed, Close],
        (S::InService, S::Waiting) => &[MarkServed, StartWaiting],
        (S::InService, S::InService) => &[],
        (S::Served, S::Closed) => &[Close],
        (S::Served, S::Waiting) => &[StartWaiting],
        (S::Served, S::Served) => &[],
        (from, to) => return Err(QueueDeskError::InvalidTransition { from, to }),
    };
    Ok(plan)
}

/// Executes transitions against the store and announces claims.
pub struct Dispatcher {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn NotificationSink>,
    topics: Topics,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn NotificationSink>,
        topics: Topics,
    ) -> Self {
        Self {
            store,
            clock,
            notifier,
            topics,
        }
    }

    /// Move service point `id` to `requested`, running every planned action.
    pub async fn update_status(
        &self,
        id: &str,
        requested: ServicePointStatus,
    ) -> Result<ServicePoint, QueueDeskError> {
        let mut point = self.load_point(id).await?;
        let current = point.service_point_status;
        let plan = plan_transition(current, requested)?;

        let reopening = matches!(current, ServicePointStatus::Closed | ServicePointStatus::Served);
        if requested == ServicePointStatus::Waiting && reopening && point.service_ids.is_empty() {
            return Err(QueueDeskError::NoServiceConfigured {
                service_point_id: point.id,
            });
        }

        for (step, action) in plan.iter().enumerate() {
            // A later action must see what the earlier one wrote.
            if step > 0 && *action == Action::StartWaiting {
                point = self.load_point(id).await?;
            }
            point = self.perform(*action, point).await?;
        }

        if !plan.is_empty() {
            info!(
                service_point = %id,
                from = %current,
                to = %point.service_point_status,
                bound = point.bound_item().unwrap_or(""),
                "service point status changed"
            );
        }
        Ok(point)
    }

    /// Offer a newly queued item of `service_id` to every idle WAITING point
    /// serving it, one after another. Returns the points that claimed an item.
    ///
    /// A point that loses a claim race to another point is skipped.
    pub async fn on_queue_item_inserted(
        &self,
        service_id: &str,
    ) -> Result<Vec<ServicePoint>, QueueDeskError> {
        let idle: Vec<ServicePoint> = fetch::all::<ServicePoint>(
            self.store.as_ref(),
            keys::SERVICE_POINT_PREFIX,
        )
        .await?
        .into_iter()
        .filter(|p| {
            p.service_point_status == ServicePointStatus::Waiting
                && p.bound_item().is_none()
                && p.serves(service_id)
        })
        .collect();
        debug!(service = %service_id, candidates = idle.len(), "re-dispatching");

        let mut claimed = Vec::new();
        for point in idle {
            match self.start_waiting(point).await {
                Ok(point) if point.bound_item().is_some() => claimed.push(point),
                Ok(_) => {}
                Err(QueueDeskError::ConditionFailed { key }) => {
                    debug!(%key, "claim lost to a concurrent writer");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(claimed)
    }

    pub async fn load_point(&self, id: &str) -> Result<ServicePoint, QueueDeskError> {
        fetch::one(
            self.store.as_ref(),
            &keys::service_point_key(id),
            EntityKind::ServicePoint,
            id,
        )
        .await
    }

    async fn load_item(&self, id: &str) -> Result<QueueItem, QueueDeskError> {
        fetch::one(
            self.store.as_ref(),
            &keys::queue_item_key(id),
            EntityKind::QueueItem,
            id,
        )
        .await
    }

    async fn perform(
        &self,
        action: Action,
        point: ServicePoint,
    ) -> Result<ServicePoint, QueueDeskError> {
        debug!(service_point = %point.id, ?action, "performing");
        match action {
            Action::StartWaiting => self.start_waiting(point).await,
            Action::StartServicing => self.start_servicing(point).await,
            Action::MarkServed => self.mark_served(point).await,
            Action::PutBack => self.put_back(point).await,
            Action::Close => self.close(point).await,
        }
    }

    /// Head of the QUEUED section across `service_ids`, smallest index key first.
    async fn next_queued(&self, service_ids: &[String]) -> Result<Option<QueueItem>, QueueDeskError> {
        let queued = keys::status_prefix(QueueStatus::Queued);
        let heads = try_join_all(service_ids.iter().map(|service_id| {
            let query = IndexQuery::new(
                keys::queue_index_pk(service_id),
                IndexRange::BeginsWith(queued.clone()),
            )
            .limit(1);
            async move { self.store.query_index(&query).await }
        }))
        .await?;

        heads
            .into_iter()
            .flatten()
            .min_by(|a, b| index_sk(a).cmp(&index_sk(b)))
            .map(|record| QueueItem::from_record(&record))
            .transpose()
    }

    async fn start_waiting(&self, mut point: ServicePoint) -> Result<ServicePoint, QueueDeskError> {
        if let Some(bound) = point.bound_item() {
            debug!(service_point = %point.id, item = %bound, "already bound, nothing to claim");
            return Ok(point);
        }

        // The point must still be unbound and unchanged when the write lands;
        // this is what keeps two points from claiming the same item.
        let point_guard = vec![
            Condition::equals(attr::CURRENT_QUEUE_ITEM, ""),
            Condition::equals(
                attr::SERVICE_POINT_STATUS,
                point.service_point_status.to_string(),
            ),
        ];
        let waiting = ServicePointStatus::Waiting.to_string();

        let Some(mut item) = self.next_queued(&point.service_ids).await? else {
            let record = self
                .store
                .update(
                    &point.key(),
                    RecordUpdate::default().set(attr::SERVICE_POINT_STATUS, waiting),
                    point_guard,
                )
                .await?;
            debug!(service_point = %point.id, "queue empty, waiting");
            return ServicePoint::from_record(&record);
        };

        item.advance(QueueStatus::Pending, self.clock.now());
        self.store
            .transact_write(vec![
                WriteOp::Update {
                    key: item.key(),
                    update: ordering_update(&item),
                    conditions: vec![Condition::equals(
                        attr::QUEUE_STATUS,
                        QueueStatus::Queued.to_string(),
                    )],
                },
                WriteOp::Update {
                    key: point.key(),
                    update: RecordUpdate::default()
                        .set(attr::CURRENT_QUEUE_ITEM, item.id.as_str())
                        .set(attr::SERVICE_POINT_STATUS, waiting),
                    conditions: point_guard,
                },
            ])
            .await?;

        point.current_queue_item = Some(item.id.clone());
        point.service_point_status = ServicePointStatus::Waiting;
        info!(
            service_point = %point.id,
            item = %item.id,
            ticket = %item.memorable_id,
            "queue item claimed"
        );
        self.publish_point(&point).await;
        Ok(point)
    }

    async fn start_servicing(&self, mut point: ServicePoint) -> Result<ServicePoint, QueueDeskError> {
        let item_id = bound_or_missing(&point)?;
        let mut item = self.load_item(&item_id).await?;
        item.advance(QueueStatus::InService, self.clock.now());

        self.store
            .transact_write(vec![
                WriteOp::Update {
                    key: item.key(),
                    update: ordering_update(&item),
                    conditions: vec![Condition::equals(
                        attr::QUEUE_STATUS,
                        QueueStatus::Pending.to_string(),
                    )],
                },
                WriteOp::Update {
                    key: point.key(),
                    update: RecordUpdate::default().set(
                        attr::SERVICE_POINT_STATUS,
                        ServicePointStatus::InService.to_string(),
                    ),
                    conditions: vec![
                        Condition::equals(attr::CURRENT_QUEUE_ITEM, item_id.as_str()),
                        Condition::equals(
                            attr::SERVICE_POINT_STATUS,
                            ServicePointStatus::Waiting.to_string(),
                        ),
                    ],
                },
            ])
            .await?;

        point.service_point_status = ServicePointStatus::InService;
        Ok(point)
    }

    async fn mark_served(&self, mut point: ServicePoint) -> Result<ServicePoint, QueueDeskError> {
        let item_id = bound_or_missing(&point)?;
        let mut item = self.load_item(&item_id).await?;
        item.advance(QueueStatus::Served, self.clock.now());

        self.release(&point, &item, QueueStatus::InService, Some(ServicePointStatus::Served))
            .await?;

        point.current_queue_item = None;
        point.service_point_status = ServicePointStatus::Served;
        Ok(point)
    }

    async fn put_back(&self, mut point: ServicePoint) -> Result<ServicePoint, QueueDeskError> {
        let Some(item_id) = point.bound_item().map(str::to_string) else {
            return Ok(point);
        };
        let mut item = self.load_item(&item_id).await?;
        item.advance(QueueStatus::Queued, self.clock.now());

        self.release(&point, &item, QueueStatus::Pending, None).await?;
        info!(service_point = %point.id, item = %item.id, "queue item returned to queue");

        point.current_queue_item = None;
        Ok(point)
    }

    /// Write the item's new state and clear the binding in one transaction,
    /// optionally setting a new point status.
    ///
    /// The item must still be in `from` when the write lands.
    async fn release(
        &self,
        point: &ServicePoint,
        item: &QueueItem,
        from: QueueStatus,
        status: Option<ServicePointStatus>,
    ) -> Result<(), QueueDeskError> {
        let mut point_update = RecordUpdate::default().set(attr::CURRENT_QUEUE_ITEM, "");
        if let Some(status) = status {
            point_update = point_update.set(attr::SERVICE_POINT_STATUS, status.to_string());
        }
        self.store
            .transact_write(vec![
                WriteOp::Update {
                    key: item.key(),
                    update: ordering_update(item),
                    conditions: vec![Condition::equals(attr::QUEUE_STATUS, from.to_string())],
                },
                WriteOp::Update {
                    key: point.key(),
                    update: point_update,
                    conditions: vec![Condition::equals(attr::CURRENT_QUEUE_ITEM, item.id.as_str())],
                },
            ])
            .await
    }

    async fn close(&self, point: ServicePoint) -> Result<ServicePoint, QueueDeskError> {
        let closed = ServicePointStatus::Closed.to_string();
        let record = self
            .store
            .update(
                &point.key(),
                RecordUpdate::default().set(attr::SERVICE_POINT_STATUS, closed.as_str()),
                vec![Condition::not_equals(attr::SERVICE_POINT_STATUS, closed.as_str())],
            )
            .await?;
        ServicePoint::from_record(&record)
    }

    async fn publish_point(&self, point: &ServicePoint) {
        let topic = self.topics.service_point(&point.id);
        let payload = match serde_json::to_value(point) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(%topic, error = %e, "could not encode service point");
                return;
            }
        };
        if let Err(e) = self.notifier.publish(&topic, payload).await {
            warn!(%topic, error = %e, "service point notification failed");
        }
    }
}

fn bound_or_missing(point: &ServicePoint) -> Result<String, QueueDeskError> {
    point
        .bound_item()
        .map(str::to_string)
        .ok_or_else(|| QueueDeskError::MissingBoundItem {
            service_point_id: point.id.clone(),
        })
}

fn index_sk(record: &Record) -> Option<&str> {
    record.index.as_ref().map(|index| index.sk.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ServicePointStatus::{Closed, InService, Served, Waiting};

    #[test]
    fn listed_pairs_have_plans() {
        let listed = [
            (Closed, Waiting, vec![Action::StartWaiting]),
            (Closed, Closed, vec![]),
            (Waiting, Closed, vec![Action::PutBack, Action::Close]),
            (Waiting, InService, vec![Action::StartServicing]),
            (Waiting, Waiting, vec![Action::StartWaiting]),
            (InService, Closed, vec![Action::MarkServed, Action::Close]),
            (InService, Waiting, vec![Action::MarkServed, Action::StartWaiting]),
            (InService, InService, vec![]),
            (Served, Closed, vec![Action::Close]),
            (Served, Waiting, vec![Action::StartWaiting]),
            (Served, Served, vec![]),
        ];
        for (from, to, expected) in listed {
            assert_eq!(plan_transition(from, to).unwrap(), expected.as_slice(), "{from} -> {to}");
        }
    }

    #[test]
    fn every_other_pair_is_invalid() {
        let mut invalid = 0;
        for from in ServicePointStatus::ALL {
            for to in ServicePointStatus::ALL {
                if let Err(err) = plan_transition(from, to) {
                    assert!(matches!(
                        err,
                        QueueDeskError::InvalidTransition { from: f, to: t } if f == from && t == to
                    ));
                    invalid += 1;
                }
            }
        }
        // 16 pairs, 11 listed.
        assert_eq!(invalid, 5);
    }

    #[test]
    fn served_is_never_requested_from_elsewhere() {
        for from in [Closed, Waiting, InService] {
            assert!(plan_transition(from, Served).is_err());
        }
    }
}
