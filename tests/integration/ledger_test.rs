//! Integration tests for the PostgreSQL ledger and contact directory

use std::sync::Arc;

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use schoolcast::error::AppError;
use schoolcast::ledger::{DeliveryLedger, PgLedger};
use schoolcast::models::{
    BatchFilter, Channel, ContactCard, DeliveryResult, EntityKind, EntityRef, NewBatch,
    OverallStatus,
};
use schoolcast::pagination::PageParams;
use schoolcast::services::{ContactDirectory, PgContactDirectory};
use uuid::Uuid;

use crate::common::TestDb;

fn new_batch(channel: Channel, submitted_by: &str) -> NewBatch {
    NewBatch {
        channel,
        message: "Fee due".to_string(),
        recipients: vec!["+971501234567".to_string(), "+971552345678".to_string()],
        submitted_by: submitted_by.to_string(),
    }
}

// =============================================================================
// Batch Lifecycle
// =============================================================================

#[tokio::test]
async fn test_batch_lifecycle() {
    let db = TestDb::new().await;
    let ledger = PgLedger::new(db.pool.clone());

    let batch = ledger.create(new_batch(Channel::Sms, "office")).await.unwrap();
    assert_eq!(batch.overall_status, OverallStatus::Pending);
    assert!(batch.results.is_empty());
    assert_eq!(batch.recipients.len(), 2);

    let delivered = DeliveryResult::success("+971501234567");
    let rejected = DeliveryResult::failure("+971552345678", "Twilio error 21610: unsubscribed");
    ledger.append_result(batch.id, &delivered).await.unwrap();
    ledger.append_result(batch.id, &rejected).await.unwrap();

    let finalized = ledger
        .finalize(batch.id, OverallStatus::PartiallyFailed)
        .await
        .unwrap();

    assert_eq!(finalized.overall_status, OverallStatus::PartiallyFailed);
    assert!(finalized.finalized_at.is_some());
    assert_eq!(finalized.results.len(), 2);
    assert_eq!(finalized.results[0].recipient, delivered.recipient);
    assert_eq!(finalized.results[1].error, rejected.error);

    let fetched = ledger.get_by_id(batch.id).await.unwrap();
    assert_eq!(fetched.results.len(), 2);
    assert_eq!(fetched.submitted_by, "office");
}

#[tokio::test]
async fn test_finalized_batch_is_immutable() {
    let db = TestDb::new().await;
    let ledger = PgLedger::new(db.pool.clone());

    let batch = ledger.create(new_batch(Channel::Sms, "office")).await.unwrap();
    ledger.finalize(batch.id, OverallStatus::Failed).await.unwrap();

    let err = ledger
        .append_result(batch.id, &DeliveryResult::success("+971501234567"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = ledger
        .finalize(batch.id, OverallStatus::Sent)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let stored = ledger.get_by_id(batch.id).await.unwrap();
    assert_eq!(stored.overall_status, OverallStatus::Failed);
    assert!(stored.results.is_empty());
}

#[tokio::test]
async fn test_finalize_requires_terminal_status() {
    let db = TestDb::new().await;
    let ledger = PgLedger::new(db.pool.clone());

    let batch = ledger.create(new_batch(Channel::Sms, "office")).await.unwrap();
    let err = ledger
        .finalize(batch.id, OverallStatus::Pending)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_unknown_batch_is_not_found() {
    let db = TestDb::new().await;
    let ledger = PgLedger::new(db.pool.clone());
    let missing = Uuid::new_v4();

    assert!(matches!(
        ledger.get_by_id(missing).await.unwrap_err(),
        AppError::NotFound(_)
    ));
    assert!(matches!(
        ledger
            .append_result(missing, &DeliveryResult::success("+971501234567"))
            .await
            .unwrap_err(),
        AppError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_concurrent_appends_are_not_lost() {
    let db = TestDb::new().await;
    let ledger = Arc::new(PgLedger::new(db.pool.clone()));
    let batch_id = ledger
        .create(new_batch(Channel::Whatsapp, "office"))
        .await
        .unwrap()
        .id;

    let mut handles = Vec::new();
    for i in 0..25 {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move {
            let result = DeliveryResult::success(format!("+9715000000{:02}", i));
            ledger.append_result(batch_id, &result).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = ledger.get_by_id(batch_id).await.unwrap();
    assert_eq!(stored.results.len(), 25);
}

// =============================================================================
// History Listing
// =============================================================================

#[tokio::test]
async fn test_list_filters_and_orders() {
    let db = TestDb::new().await;
    let ledger = PgLedger::new(db.pool.clone());

    let sms = ledger.create(new_batch(Channel::Sms, "office")).await.unwrap();
    let email = ledger.create(new_batch(Channel::Email, "accounts")).await.unwrap();
    let whatsapp = ledger.create(new_batch(Channel::Whatsapp, "office")).await.unwrap();
    ledger.finalize(sms.id, OverallStatus::Sent).await.unwrap();
    ledger.finalize(email.id, OverallStatus::Failed).await.unwrap();

    let all = ledger
        .list(&BatchFilter::default(), PageParams::default())
        .await
        .unwrap();
    assert_eq!(all.total_count, 3);
    let ids: Vec<Uuid> = all.items.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![whatsapp.id, email.id, sms.id]);

    let office = ledger
        .list(
            &BatchFilter {
                submitted_by: Some("office".to_string()),
                ..Default::default()
            },
            PageParams::default(),
        )
        .await
        .unwrap();
    assert_eq!(office.total_count, 2);

    let pending = ledger
        .list(
            &BatchFilter {
                status: Some(OverallStatus::Pending),
                ..Default::default()
            },
            PageParams::default(),
        )
        .await
        .unwrap();
    assert_eq!(pending.items.len(), 1);
    assert_eq!(pending.items[0].id, whatsapp.id);

    let email_only = ledger
        .list(
            &BatchFilter {
                channel: Some(Channel::Email),
                ..Default::default()
            },
            PageParams::default(),
        )
        .await
        .unwrap();
    assert_eq!(email_only.items[0].id, email.id);

    let future = ledger
        .list(
            &BatchFilter {
                created_after: Some(Utc::now() + Duration::hours(1)),
                ..Default::default()
            },
            PageParams::default(),
        )
        .await
        .unwrap();
    assert_eq!(future.total_count, 0);
}

#[tokio::test]
async fn test_list_paginates() {
    let db = TestDb::new().await;
    let ledger = PgLedger::new(db.pool.clone());

    for _ in 0..5 {
        ledger.create(new_batch(Channel::Sms, "office")).await.unwrap();
    }

    let page = ledger
        .list(
            &BatchFilter::default(),
            PageParams {
                page: 3,
                per_page: 2,
            },
        )
        .await
        .unwrap();

    assert_eq!(page.total_count, 5);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.items.len(), 1);
}

#[tokio::test]
async fn test_health_check() {
    let db = TestDb::new().await;
    let ledger = PgLedger::new(db.pool.clone());

    assert!(ledger.health_check().await);
}

// =============================================================================
// Contact Directory
// =============================================================================

#[tokio::test]
async fn test_student_falls_back_to_guardian_phone() {
    let db = TestDb::new().await;
    let directory = PgContactDirectory::new(db.pool.clone());

    let own_phone = db
        .insert_student("R-001", Some("+971501111111"), Some("+971502222222"), None)
        .await;
    let guardian_only = db
        .insert_student("R-002", Some(" "), Some("+971503333333"), Some("kid@example.com"))
        .await;

    let card = directory
        .lookup(EntityRef {
            kind: EntityKind::Student,
            id: own_phone,
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(card.address_for(Channel::Sms), Some("+971501111111"));

    let card = directory
        .lookup(EntityRef {
            kind: EntityKind::Student,
            id: guardian_only,
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        card,
        ContactCard::phone("+971503333333").with_email("kid@example.com")
    );
}

#[tokio::test]
async fn test_staff_lookup_and_unknown_entities() {
    let db = TestDb::new().await;
    let directory = PgContactDirectory::new(db.pool.clone());

    let staff = db.insert_staff(None, Some("teacher@school.edu")).await;

    let card = directory
        .lookup(EntityRef {
            kind: EntityKind::Staff,
            id: staff,
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(card.address_for(Channel::Email), Some("teacher@school.edu"));
    assert_eq!(card.address_for(Channel::Sms), None);

    // A staff id is not a student id
    let missing = directory
        .lookup(EntityRef {
            kind: EntityKind::Student,
            id: staff,
        })
        .await
        .unwrap();
    assert!(missing.is_none());
}
