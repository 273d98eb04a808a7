// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command execution against the engine.
//!
//! Every command yields the JSON value printed on success. Commands that
//! change the queue also run the change-feed callbacks in-process, standing in
//! for the external watcher.

use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use queuedesk_core::{
    NewService, NewServicePoint, QueueDeskError, UpdateServicePointRequest, UpdateServiceRequest,
};
use queuedesk_engine::QueueEngine;

use crate::{Commands, ItemCommand, PointCommand, PointFields, ServiceCommand};

pub(crate) async fn execute(engine: &QueueEngine, command: Commands) -> Result<Value, QueueDeskError> {
    match command {
        Commands::Service(cmd) => service(engine, cmd).await,
        Commands::Point(cmd) => point(engine, cmd).await,
        Commands::Join { service_id } => {
            let view = engine.join_queue(&service_id).await?;
            let claimed = engine.on_queue_item_inserted(&service_id).await?;
            engine.on_queue_changed().await?;
            debug!(claimed = claimed.len(), "change feed callbacks ran");
            // The claim may already have moved the item out of QUEUED.
            if claimed.is_empty() {
                to_json(&view)
            } else {
                to_json(&engine.get_queue_item(&view.item.id).await?)
            }
        }
        Commands::Item(cmd) => item(engine, cmd).await,
        Commands::Board { limit } => to_json(&engine.board_status(limit).await?),
        Commands::Health => {
            let health: Vec<Value> = engine
                .health()
                .await
                .into_iter()
                .map(|a| {
                    json!({
                        "name": a.name,
                        "adapterType": a.adapter_type.to_string(),
                        "status": format!("{:?}", a.status),
                    })
                })
                .collect();
            Ok(Value::Array(health))
        }
    }
}

async fn service(engine: &QueueEngine, cmd: ServiceCommand) -> Result<Value, QueueDeskError> {
    match cmd {
        ServiceCommand::Add { name, description } => {
            to_json(&engine.create_service(NewService { name, description }).await?)
        }
        ServiceCommand::List => to_json(&engine.list_services().await?),
        ServiceCommand::Show { id } => to_json(&engine.get_service(&id).await?),
        ServiceCommand::Update {
            id,
            name,
            description,
        } => to_json(
            &engine
                .update_service(&id, UpdateServiceRequest { name, description })
                .await?,
        ),
        ServiceCommand::Rm { id } => {
            engine.delete_service(&id).await?;
            Ok(json!({ "deleted": id }))
        }
    }
}

async fn point(engine: &QueueEngine, cmd: PointCommand) -> Result<Value, QueueDeskError> {
    match cmd {
        PointCommand::Add { number, fields } => {
            let new = NewServicePoint {
                name: fields.name.unwrap_or_else(|| format!("Desk {number}")),
                description: fields.description.unwrap_or_default(),
                service_ids: fields.services,
                service_point_number: number,
            };
            to_json(&engine.create_service_point(new).await?)
        }
        PointCommand::List => to_json(&engine.list_service_points().await?),
        PointCommand::Show { id } => to_json(&engine.get_service_point(&id).await?),
        PointCommand::Update {
            id,
            number,
            fields,
            clear_services,
        } => {
            let request = update_request(number, fields, clear_services);
            to_json(&engine.update_service_point(&id, request).await?)
        }
        PointCommand::Rm { id } => {
            engine.delete_service_point(&id).await?;
            Ok(json!({ "deleted": id }))
        }
        PointCommand::Status { id, status } => {
            let point = engine.update_service_point_status(&id, status).await?;
            engine.on_queue_changed().await?;
            to_json(&point)
        }
    }
}

async fn item(engine: &QueueEngine, cmd: ItemCommand) -> Result<Value, QueueDeskError> {
    match cmd {
        ItemCommand::Show { id } => to_json(&engine.get_queue_item(&id).await?),
        ItemCommand::List { service_id } => to_json(&engine.list_queue_items(&service_id).await?),
        ItemCommand::Priority { id, priority } => {
            let view = engine.update_queue_item_priority(&id, priority).await?;
            engine.on_queue_changed().await?;
            to_json(&view)
        }
    }
}

/// Only the fields given on the command line are changed.
fn update_request(
    number: Option<String>,
    fields: PointFields,
    clear_services: bool,
) -> UpdateServicePointRequest {
    let service_ids = if clear_services {
        Some(Vec::new())
    } else if fields.services.is_empty() {
        None
    } else {
        Some(fields.services)
    };
    UpdateServicePointRequest {
        name: fields.name,
        description: fields.description,
        service_ids,
        service_point_number: number,
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, QueueDeskError> {
    serde_json::to_value(value).map_err(|e| QueueDeskError::Internal(format!("output encoding: {e}")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use queuedesk_bus::NotificationBus;
    use queuedesk_config::model::{QueueDeskConfig, StorageBackend};
    use queuedesk_core::ServicePointStatus;
    use queuedesk_engine::SystemClock;

    use super::*;

    async fn engine() -> QueueEngine {
        let mut config = QueueDeskConfig::default();
        config.storage.backend = StorageBackend::Memory;
        let store = queuedesk_storage::open_store(&config.storage).await.unwrap();
        QueueEngine::new(store, Arc::new(NotificationBus::new(16)), Arc::new(SystemClock), &config)
    }

    fn fields(services: &[&str]) -> PointFields {
        PointFields {
            name: None,
            description: None,
            services: services.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn update_request_keeps_services_unless_asked() {
        assert_eq!(update_request(None, fields(&[]), false).service_ids, None);
        assert_eq!(update_request(None, fields(&[]), true).service_ids, Some(vec![]));
        assert_eq!(
            update_request(Some("4".into()), fields(&["a"]), false).service_ids,
            Some(vec!["a".to_string()])
        );
    }

    #[tokio::test]
    async fn join_reports_the_item_after_dispatch() {
        let engine = engine().await;
        let service = execute(
            &engine,
            Commands::Service(ServiceCommand::Add {
                name: "Front Desk".into(),
                description: String::new(),
            }),
        )
        .await
        .unwrap();
        let service_id = service["id"].as_str().unwrap().to_string();

        let point = execute(
            &engine,
            Commands::Point(PointCommand::Add {
                number: "1".into(),
                fields: fields(&[&service_id]),
            }),
        )
        .await
        .unwrap();
        assert_eq!(point["name"], "Desk 1");
        let point_id = point["id"].as_str().unwrap().to_string();

        execute(
            &engine,
            Commands::Point(PointCommand::Status {
                id: point_id,
                status: ServicePointStatus::Waiting,
            }),
        )
        .await
        .unwrap();

        let joined = execute(&engine, Commands::Join { service_id }).await.unwrap();
        assert_eq!(joined["item"]["memorableId"], "F-001");
        assert_eq!(joined["item"]["queueStatus"], "PENDING");
        assert_eq!(joined["position"], Value::Null);
    }

    #[tokio::test]
    async fn errors_propagate_with_their_kind() {
        let engine = engine().await;
        let err = execute(&engine, Commands::Item(ItemCommand::Show { id: "nope".into() }))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), queuedesk_core::ErrorKind::NotFound);
    }
}
