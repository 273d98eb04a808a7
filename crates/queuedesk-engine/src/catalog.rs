// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Administration of services and service points.

use std::collections::HashSet;

use tracing::info;
use uuid::Uuid;

use queuedesk_core::codec::attr;
use queuedesk_core::{
    keys, Condition, EntityKind, IndexQuery, IndexRange, NewService, NewServicePoint,
    QueueDeskError, QueueStatus, RecordCodec, RecordUpdate, Service, ServicePoint,
    ServicePointStatus, UpdateServicePointRequest, UpdateServiceRequest,
};

use crate::engine::QueueEngine;
use crate::fetch;

/// Statuses that keep a service in use.
const ACTIVE: [QueueStatus; 3] = [QueueStatus::Queued, QueueStatus::Pending, QueueStatus::InService];

impl QueueEngine {
    // --- Services ---

    pub async fn create_service(&self, new: NewService) -> Result<Service, QueueDeskError> {
        if new.name.trim().is_empty() {
            return Err(QueueDeskError::InvalidState(
                "service name must not be empty".to_string(),
            ));
        }
        let service = Service {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            description: new.description,
        };
        self.store
            .put(service.to_record(), vec![Condition::NotExists])
            .await?;
        info!(service = %service.id, name = %service.name, "service created");
        Ok(service)
    }

    pub async fn get_service(&self, id: &str) -> Result<Service, QueueDeskError> {
        fetch::one(self.store.as_ref(), &keys::service_key(id), EntityKind::Service, id).await
    }

    pub async fn list_services(&self) -> Result<Vec<Service>, QueueDeskError> {
        fetch::all(self.store.as_ref(), keys::SERVICE_PREFIX).await
    }

    pub async fn update_service(
        &self,
        id: &str,
        request: UpdateServiceRequest,
    ) -> Result<Service, QueueDeskError> {
        let current = self.get_service(id).await?;
        let mut update = RecordUpdate::default();
        if let Some(name) = request.name {
            if name.trim().is_empty() {
                return Err(QueueDeskError::InvalidState(
                    "service name must not be empty".to_string(),
                ));
            }
            update = update.set(attr::NAME, name);
        }
        if let Some(description) = request.description {
            update = update.set(attr::DESCRIPTION, description);
        }
        if update.set.is_empty() {
            return Ok(current);
        }
        let record = self
            .store
            .update(&current.key(), update, vec![Condition::Exists])
            .await?;
        Service::from_record(&record)
    }

    /// Delete a service nobody refers to any more.
    ///
    /// Refused with `Conflict` while a service point lists it or one of its
    /// items is still queued, pending, or in service.
    pub async fn delete_service(&self, id: &str) -> Result<(), QueueDeskError> {
        let service = self.get_service(id).await?;

        let users: Vec<String> = self
            .list_service_points()
            .await?
            .into_iter()
            .filter(|p| p.serves(id))
            .map(|p| p.id)
            .collect();
        if !users.is_empty() {
            return Err(QueueDeskError::Conflict(format!(
                "service {id} is used by service points {}",
                users.join(", ")
            )));
        }

        for status in ACTIVE {
            let query = IndexQuery::new(
                keys::queue_index_pk(id),
                IndexRange::BeginsWith(keys::status_prefix(status)),
            )
            .limit(1);
            if !self.store.query_index(&query).await?.is_empty() {
                return Err(QueueDeskError::Conflict(format!(
                    "service {id} still has {status} queue items"
                )));
            }
        }

        self.store
            .delete(&service.key(), vec![Condition::Exists])
            .await?;
        info!(service = %id, "service deleted");
        Ok(())
    }

    // --- Service points ---

    pub async fn create_service_point(
        &self,
        new: NewServicePoint,
    ) -> Result<ServicePoint, QueueDeskError> {
        let service_ids = dedup(new.service_ids);
        self.verify_services(&service_ids).await?;
        let point = ServicePoint {
            id: Uuid::new_v4().to_string(),
            service_ids,
            name: new.name,
            description: new.description,
            service_point_status: ServicePointStatus::Closed,
            current_queue_item: None,
            service_point_number: new.service_point_number,
        };
        self.store
            .put(point.to_record(), vec![Condition::NotExists])
            .await?;
        info!(service_point = %point.id, number = %point.service_point_number, "service point created");
        Ok(point)
    }

    pub async fn get_service_point(&self, id: &str) -> Result<ServicePoint, QueueDeskError> {
        self.dispatcher.load_point(id).await
    }

    pub async fn list_service_points(&self) -> Result<Vec<ServicePoint>, QueueDeskError> {
        fetch::all(self.store.as_ref(), keys::SERVICE_POINT_PREFIX).await
    }

    /// Change descriptive fields and the served services. Status and binding
    /// are only ever changed by the dispatch state machine.
    pub async fn update_service_point(
        &self,
        id: &str,
        request: UpdateServicePointRequest,
    ) -> Result<ServicePoint, QueueDeskError> {
        let current = self.get_service_point(id).await?;
        if request.is_empty() {
            return Ok(current);
        }

        let mut update = RecordUpdate::default();
        if let Some(service_ids) = request.service_ids {
            let service_ids = dedup(service_ids);
            self.verify_services(&service_ids).await?;
            update = update.set(attr::SERVICE_IDS, service_ids);
        }
        if let Some(name) = request.name {
            update = update.set(attr::NAME, name);
        }
        if let Some(description) = request.description {
            update = update.set(attr::DESCRIPTION, description);
        }
        if let Some(number) = request.service_point_number {
            update = update.set(attr::SERVICE_POINT_NUMBER, number);
        }

        let record = self
            .store
            .update(&current.key(), update, vec![Condition::Exists])
            .await?;
        ServicePoint::from_record(&record)
    }

    /// Delete an unbound service point.
    pub async fn delete_service_point(&self, id: &str) -> Result<(), QueueDeskError> {
        let point = self.get_service_point(id).await?;
        if let Some(item) = point.bound_item() {
            return Err(QueueDeskError::Conflict(format!(
                "service point {id} is handling queue item {item}"
            )));
        }
        self.store
            .delete(
                &point.key(),
                vec![Condition::equals(attr::CURRENT_QUEUE_ITEM, "")],
            )
            .await?;
        info!(service_point = %id, "service point deleted");
        Ok(())
    }

    /// Every id must name an existing service; checked with one batch read.
    async fn verify_services(&self, service_ids: &[String]) -> Result<(), QueueDeskError> {
        if service_ids.is_empty() {
            return Ok(());
        }
        let wanted: Vec<_> = service_ids.iter().map(|id| keys::service_key(id)).collect();
        let found: HashSet<String> = self
            .store
            .batch_get(&wanted)
            .await?
            .into_iter()
            .map(|record| record.key.sk)
            .collect();
        match wanted.into_iter().zip(service_ids).find(|(key, _)| !found.contains(&key.sk)) {
            Some((_, missing)) => Err(QueueDeskError::not_found(EntityKind::Service, missing.as_str())),
            None => Ok(()),
        }
    }
}

/// Drop repeated ids, keeping first occurrences in order.
fn dedup(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_occurrence() {
        let ids = vec!["b".to_string(), "a".into(), "b".into()];
        assert_eq!(dedup(ids), ["b", "a"]);
    }
}
