// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests of service and service point administration.

use queuedesk_core::{
    AdapterType, ErrorKind, HealthStatus, NewServicePoint, QueueDeskError, ServicePointStatus,
    UpdateServicePointRequest, UpdateServiceRequest,
};
use queuedesk_test_utils::TestHarness;

// ---- Services ----

#[tokio::test]
async fn service_crud() {
    let h = TestHarness::memory().await.unwrap();
    let service = h.service("Front Desk").await.unwrap();
    assert_eq!(h.engine.get_service(&service.id).await.unwrap(), service);

    let renamed = h
        .engine
        .update_service(
            &service.id,
            UpdateServiceRequest {
                name: Some("Reception".into()),
                description: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Reception");
    assert_eq!(renamed.description, service.description);
    assert_eq!(h.engine.list_services().await.unwrap(), vec![renamed]);

    h.engine.delete_service(&service.id).await.unwrap();
    let err = h.engine.get_service(&service.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn blank_service_names_are_rejected() {
    let h = TestHarness::memory().await.unwrap();
    let err = h.service("   ").await.unwrap_err();
    assert!(matches!(err, QueueDeskError::InvalidState(_)));

    let service = h.service("Front Desk").await.unwrap();
    let err = h
        .engine
        .update_service(
            &service.id,
            UpdateServiceRequest {
                name: Some(String::new()),
                description: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, QueueDeskError::InvalidState(_)));
}

#[tokio::test]
async fn service_used_by_a_point_cannot_be_deleted() {
    let h = TestHarness::memory().await.unwrap();
    let service = h.service("Front Desk").await.unwrap();
    h.point("1", &[&service.id]).await.unwrap();

    let err = h.engine.delete_service(&service.id).await.unwrap_err();
    assert!(matches!(err, QueueDeskError::Conflict(_)));
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn service_with_waiting_customers_cannot_be_deleted() {
    let h = TestHarness::memory().await.unwrap();
    let service = h.service("Front Desk").await.unwrap();
    h.join(&service.id).await.unwrap();

    let err = h.engine.delete_service(&service.id).await.unwrap_err();
    assert!(matches!(err, QueueDeskError::Conflict(_)));
}

#[tokio::test]
async fn service_with_only_finished_items_can_be_deleted() {
    let h = TestHarness::memory().await.unwrap();
    let service = h.service("Front Desk").await.unwrap();
    h.join(&service.id).await.unwrap();
    let point = h.point("1", &[&service.id]).await.unwrap();
    h.set_status(&point.id, ServicePointStatus::Waiting).await.unwrap();
    h.set_status(&point.id, ServicePointStatus::InService).await.unwrap();
    h.set_status(&point.id, ServicePointStatus::Closed).await.unwrap();
    h.engine
        .update_service_point(
            &point.id,
            UpdateServicePointRequest {
                service_ids: Some(vec![]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    h.engine.delete_service(&service.id).await.unwrap();
    assert!(h.engine.list_services().await.unwrap().is_empty());
}

// ---- Service points ----

#[tokio::test]
async fn new_points_start_closed_and_unbound_with_unique_services() {
    let h = TestHarness::memory().await.unwrap();
    let service = h.service("Front Desk").await.unwrap();
    let point = h
        .engine
        .create_service_point(NewServicePoint {
            name: "Desk 1".into(),
            description: "by the door".into(),
            service_ids: vec![service.id.clone(), service.id.clone()],
            service_point_number: "1".into(),
        })
        .await
        .unwrap();

    assert_eq!(point.service_point_status, ServicePointStatus::Closed);
    assert_eq!(point.bound_item(), None);
    assert_eq!(point.service_ids, vec![service.id]);
    assert_eq!(h.engine.get_service_point(&point.id).await.unwrap(), point);
}

#[tokio::test]
async fn points_must_reference_existing_services() {
    let h = TestHarness::memory().await.unwrap();
    let service = h.service("Front Desk").await.unwrap();
    let err = h.point("1", &[&service.id, "ghost"]).await.unwrap_err();
    assert!(matches!(
        err,
        QueueDeskError::NotFound { ref id, .. } if id == "ghost"
    ));

    let point = h.point("1", &[&service.id]).await.unwrap();
    let err = h
        .engine
        .update_service_point(
            &point.id,
            UpdateServicePointRequest {
                service_ids: Some(vec!["ghost".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn point_update_changes_only_given_fields() {
    let h = TestHarness::memory().await.unwrap();
    let service = h.service("Front Desk").await.unwrap();
    let point = h.point("1", &[&service.id]).await.unwrap();

    let unchanged = h
        .engine
        .update_service_point(&point.id, UpdateServicePointRequest::default())
        .await
        .unwrap();
    assert_eq!(unchanged, point);

    let updated = h
        .engine
        .update_service_point(
            &point.id,
            UpdateServicePointRequest {
                name: Some("Window".into()),
                service_point_number: Some("7".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Window");
    assert_eq!(updated.service_point_number, "7");
    assert_eq!(updated.service_ids, point.service_ids);
    assert_eq!(updated.service_point_status, ServicePointStatus::Closed);
}

#[tokio::test]
async fn bound_points_cannot_be_deleted() {
    let h = TestHarness::memory().await.unwrap();
    let service = h.service("Front Desk").await.unwrap();
    h.join(&service.id).await.unwrap();
    let point = h.point("1", &[&service.id]).await.unwrap();
    h.set_status(&point.id, ServicePointStatus::Waiting).await.unwrap();

    let err = h.engine.delete_service_point(&point.id).await.unwrap_err();
    assert!(matches!(err, QueueDeskError::Conflict(_)));

    h.set_status(&point.id, ServicePointStatus::Closed).await.unwrap();
    h.engine.delete_service_point(&point.id).await.unwrap();
    let err = h.engine.get_service_point(&point.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ---- Health ----

#[tokio::test]
async fn health_reports_both_adapters() {
    let h = TestHarness::memory().await.unwrap();
    let health = h.engine.health().await;
    assert_eq!(health.len(), 2);
    assert_eq!(health[0].name, "memory");
    assert_eq!(health[0].adapter_type, AdapterType::Storage);
    assert_eq!(health[1].name, "mock-notifier");
    assert_eq!(health[1].adapter_type, AdapterType::Notification);
    assert!(health.iter().all(|a| a.status == HealthStatus::Healthy));

    h.notifier.fail(true);
    let health = h.engine.health().await;
    assert!(matches!(health[1].status, HealthStatus::Degraded(_)));
    h.engine.shutdown().await.unwrap();
}
