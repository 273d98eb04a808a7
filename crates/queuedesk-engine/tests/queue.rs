// SPDX-FileCopyrightText: 2026 Queuedesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests of joining, ordering, positions, and tickets.

use queuedesk_core::{ErrorKind, QueueDeskError, QueuePriority, QueueStatus, ServicePointStatus};
use queuedesk_test_utils::TestHarness;

// ---- Tickets ----

#[tokio::test]
async fn services_sharing_a_first_letter_share_a_counter() {
    let h = TestHarness::memory().await.unwrap();
    let apostilles = h.service("Apostilles").await.unwrap();
    let archives = h.service("Archives").await.unwrap();
    let benefits = h.service("Benefits").await.unwrap();

    let a1 = h.join(&apostilles.id).await.unwrap();
    let a2 = h.join(&archives.id).await.unwrap();
    let b1 = h.join(&benefits.id).await.unwrap();
    let a3 = h.join(&apostilles.id).await.unwrap();

    assert_eq!(a1.item.memorable_id, "A-001");
    assert_eq!(a2.item.memorable_id, "A-002");
    assert_eq!(b1.item.memorable_id, "B-001");
    assert_eq!(a3.item.memorable_id, "A-003");
}

#[tokio::test]
async fn ticket_pools_are_case_sensitive() {
    let h = TestHarness::memory().await.unwrap();
    let lower = h.service("apple").await.unwrap();
    let upper = h.service("Apple").await.unwrap();

    assert_eq!(h.join(&lower.id).await.unwrap().item.memorable_id, "a-001");
    assert_eq!(h.join(&upper.id).await.unwrap().item.memorable_id, "A-001");
    assert_eq!(h.join(&lower.id).await.unwrap().item.memorable_id, "a-002");
}

#[tokio::test]
async fn ticket_numbers_wrap_when_rotation_is_configured() {
    let h = TestHarness::builder()
        .with_ticket_rotation(2)
        .build()
        .await
        .unwrap();
    let service = h.service("Apostilles").await.unwrap();

    let mut tickets = Vec::new();
    for _ in 0..3 {
        tickets.push(h.join(&service.id).await.unwrap().item.memorable_id);
    }
    assert_eq!(tickets, ["A-001", "A-002", "A-001"]);
}

#[tokio::test]
async fn tickets_survive_on_sqlite() {
    let h = TestHarness::builder().with_sqlite().build().await.unwrap();
    let first = h.service("Apostilles").await.unwrap();
    let second = h.service("Archives").await.unwrap();
    assert_eq!(h.join(&first.id).await.unwrap().item.memorable_id, "A-001");
    assert_eq!(h.join(&second.id).await.unwrap().item.memorable_id, "A-002");
}

// ---- Joining ----

#[tokio::test]
async fn joining_an_unknown_service_is_not_found() {
    let h = TestHarness::memory().await.unwrap();
    let err = h.engine.join_queue("nope").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn new_items_are_queued_with_medium_priority() {
    let h = TestHarness::memory().await.unwrap();
    let service = h.service("Front Desk").await.unwrap();
    let view = h.join(&service.id).await.unwrap();
    assert_eq!(view.item.service_id, service.id);
    assert_eq!(view.item.queue_status, QueueStatus::Queued);
    assert_eq!(view.item.priority, QueuePriority::Medium);
    assert_eq!(h.engine.get_queue_item(&view.item.id).await.unwrap(), view);
}

// ---- Positions ----

async fn positions_follow_join_order(h: TestHarness) {
    let service = h.service("Front Desk").await.unwrap();
    let other = h.service("Passports").await.unwrap();

    let mut items = Vec::new();
    for k in 1..=5 {
        let view = h.join(&service.id).await.unwrap();
        assert_eq!(view.position, Some(k));
        // Items of another service never count.
        h.join(&other.id).await.unwrap();
        items.push(view.item);
    }

    for (k, item) in items.iter().enumerate() {
        let view = h.engine.get_queue_item(&item.id).await.unwrap();
        assert_eq!(view.position, Some(k as u32 + 1));
    }

    let point = h.point("1", &[&service.id]).await.unwrap();
    h.engine
        .update_service_point_status(&point.id, ServicePointStatus::Waiting)
        .await
        .unwrap();

    assert_eq!(h.engine.get_queue_item(&items[0].id).await.unwrap().position, None);
    for (k, item) in items.iter().enumerate().skip(1) {
        let view = h.engine.get_queue_item(&item.id).await.unwrap();
        assert_eq!(view.position, Some(k as u32));
    }
}

#[tokio::test]
async fn positions_in_memory() {
    positions_follow_join_order(TestHarness::memory().await.unwrap()).await;
}

#[tokio::test]
async fn positions_on_sqlite() {
    positions_follow_join_order(TestHarness::builder().with_sqlite().build().await.unwrap()).await;
}

#[tokio::test]
async fn missing_count_is_retried_once() {
    let h = TestHarness::builder()
        .with_count_misses(1)
        .build()
        .await
        .unwrap();
    let service = h.service("Front Desk").await.unwrap();
    let view = h.join(&service.id).await.unwrap();
    assert_eq!(view.position, Some(1));
    assert_eq!(h.flaky.as_ref().unwrap().remaining_misses(), 0);
}

#[tokio::test]
async fn persistently_missing_count_is_a_consistency_violation() {
    let h = TestHarness::builder()
        .with_count_misses(0)
        .build()
        .await
        .unwrap();
    let service = h.service("Front Desk").await.unwrap();
    let view = h.join(&service.id).await.unwrap();

    h.flaky.as_ref().unwrap().miss_next(2);
    let err = h.engine.get_queue_item(&view.item.id).await.unwrap_err();
    assert!(matches!(err, QueueDeskError::ConsistencyViolation(_)));
    assert!(err.is_retryable());

    // The index catches up and the next read works.
    let view = h.engine.get_queue_item(&view.item.id).await.unwrap();
    assert_eq!(view.position, Some(1));
}

// ---- Listing ----

#[tokio::test]
async fn list_is_in_index_order() {
    let h = TestHarness::memory().await.unwrap();
    let service = h.service("Front Desk").await.unwrap();
    let first = h.join(&service.id).await.unwrap();
    let second = h.join(&service.id).await.unwrap();
    let third = h.join(&service.id).await.unwrap();

    let point = h.point("1", &[&service.id]).await.unwrap();
    h.set_status(&point.id, ServicePointStatus::Waiting).await.unwrap();

    let listed: Vec<_> = h
        .engine
        .list_queue_items(&service.id)
        .await
        .unwrap()
        .into_iter()
        .map(|item| (item.id, item.queue_status))
        .collect();
    assert_eq!(
        listed,
        vec![
            (second.item.id, QueueStatus::Queued),
            (third.item.id, QueueStatus::Queued),
            (first.item.id, QueueStatus::Pending),
        ]
    );
}

#[tokio::test]
async fn listing_an_unknown_service_is_not_found() {
    let h = TestHarness::memory().await.unwrap();
    let err = h.engine.list_queue_items("nope").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ---- Priority ----

#[tokio::test]
async fn raising_priority_moves_an_item_to_the_front() {
    let h = TestHarness::memory().await.unwrap();
    let service = h.service("Front Desk").await.unwrap();
    let first = h.join(&service.id).await.unwrap();
    h.join(&service.id).await.unwrap();
    let last = h.join(&service.id).await.unwrap();

    let view = h
        .engine
        .update_queue_item_priority(&last.item.id, QueuePriority::High)
        .await
        .unwrap();
    assert_eq!(view.item.priority, QueuePriority::High);
    assert_eq!(view.position, Some(1));
    assert_eq!(h.engine.get_queue_item(&first.item.id).await.unwrap().position, Some(2));

    let point = h.point("1", &[&service.id]).await.unwrap();
    let point = h.set_status(&point.id, ServicePointStatus::Waiting).await.unwrap();
    assert_eq!(point.bound_item(), Some(last.item.id.as_str()));
}

#[tokio::test]
async fn unchanged_priority_is_a_no_op() {
    let h = TestHarness::memory().await.unwrap();
    let service = h.service("Front Desk").await.unwrap();
    let view = h.join(&service.id).await.unwrap();
    let same = h
        .engine
        .update_queue_item_priority(&view.item.id, QueuePriority::Medium)
        .await
        .unwrap();
    assert_eq!(same, view);
}

#[tokio::test]
async fn priority_of_a_claimed_item_cannot_change() {
    let h = TestHarness::memory().await.unwrap();
    let service = h.service("Front Desk").await.unwrap();
    let view = h.join(&service.id).await.unwrap();
    let point = h.point("1", &[&service.id]).await.unwrap();
    h.set_status(&point.id, ServicePointStatus::Waiting).await.unwrap();

    let err = h
        .engine
        .update_queue_item_priority(&view.item.id, QueuePriority::High)
        .await
        .unwrap_err();
    assert!(matches!(err, QueueDeskError::InvalidState(_)));
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
}

#[tokio::test]
async fn priority_of_an_unknown_item_is_not_found() {
    let h = TestHarness::memory().await.unwrap();
    let err = h
        .engine
        .update_queue_item_priority("nope", QueuePriority::High)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
