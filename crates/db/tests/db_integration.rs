//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `pulse_test`)
//!   `TEST_DB_PASSWORD` (default: `pulse_test`)
//!   `TEST_DB_NAME` (default: `pulse_test`)

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use pulse_common::IdGenerator;
use pulse_db::entities::{notification_queue, proactive_notification};
use pulse_db::repositories::{
    NotificationQueueRepository, ProactiveNotificationRepository, TriggerStateRepository,
};
use pulse_db::test_utils::{TestDatabase, TestDbConfig};
use sea_orm::Set;

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_connection() {
    let config = TestDbConfig::default();
    let result = TestDatabase::with_config(config).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_cleanup() {
    let db = TestDatabase::new().await.expect("Failed to connect");
    let result = db.cleanup().await;
    assert!(result.is_ok(), "Cleanup failed: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_record_firing_starts_cooldown() {
    let db = TestDatabase::create_unique().await.expect("create db");
    let repo = TriggerStateRepository::new(Arc::clone(&db.conn));

    let fired = repo
        .try_record_firing("user-1", "streak_at_risk", 240)
        .await
        .unwrap();
    assert!(fired, "first firing should win");

    let again = repo
        .try_record_firing("user-1", "streak_at_risk", 240)
        .await
        .unwrap();
    assert!(!again, "second firing inside cooldown should lose");

    assert!(repo.is_on_cooldown("user-1", "streak_at_risk", 240).await.unwrap());

    // Other users and other triggers are unaffected
    assert!(repo.try_record_firing("user-2", "streak_at_risk", 240).await.unwrap());
    assert!(repo.try_record_firing("user-1", "overdue_items", 240).await.unwrap());

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_record_firing_after_cooldown_expires() {
    let db = TestDatabase::create_unique().await.expect("create db");
    let repo = TriggerStateRepository::new(Arc::clone(&db.conn));

    assert!(repo.try_record_firing("user-1", "morning_briefing", 0).await.unwrap());
    // Zero cooldown means every attempt fires
    assert!(repo.try_record_firing("user-1", "morning_briefing", 0).await.unwrap());

    let state = repo.find("user-1", "morning_briefing").await.unwrap().unwrap();
    assert_eq!(state.trigger_count, 2);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_concurrent_firing_exactly_one_wins() {
    let db = TestDatabase::create_unique().await.expect("create db");
    let conn = Arc::clone(&db.conn);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let repo = TriggerStateRepository::new(Arc::clone(&conn));
        handles.push(tokio::spawn(async move {
            repo.try_record_firing("user-race", "goal_stalled", 1440).await
        }));
    }

    let mut wins = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap() {
            wins += 1;
        }
    }
    assert_eq!(wins, 1, "exactly one concurrent firing may win");

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_notification_history_pagination() {
    let db = TestDatabase::create_unique().await.expect("create db");
    let repo = ProactiveNotificationRepository::new(Arc::clone(&db.conn));
    let id_gen = IdGenerator::new();

    for i in 0..5 {
        repo.create(proactive_notification::ActiveModel {
            id: Set(id_gen.generate()),
            user_id: Set("user-1".to_string()),
            trigger_type: Set("overdue_items".to_string()),
            message_json: Set(serde_json::json!({ "title": format!("Message {i}") })),
            channels_json: Set(serde_json::json!(["in_app"])),
            sent_at: Set(Utc::now().into()),
            ..Default::default()
        })
        .await
        .unwrap();
    }

    let first_page = repo.find_by_user("user-1", 3, None, false).await.unwrap();
    assert_eq!(first_page.len(), 3);

    let last_id = first_page.last().unwrap().id.clone();
    let second_page = repo
        .find_by_user("user-1", 3, Some(&last_id), false)
        .await
        .unwrap();
    assert_eq!(second_page.len(), 2);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_daily_cap_excludes_queued() {
    let db = TestDatabase::create_unique().await.expect("create db");
    let repo = ProactiveNotificationRepository::new(Arc::clone(&db.conn));
    let id_gen = IdGenerator::new();

    for channels in [
        serde_json::json!(["in_app", "push"]),
        serde_json::json!(["queued"]),
        serde_json::json!(["queued_limit"]),
        // Every channel failed: nothing was delivered
        serde_json::json!([]),
    ] {
        repo.create(proactive_notification::ActiveModel {
            id: Set(id_gen.generate()),
            user_id: Set("user-1".to_string()),
            trigger_type: Set("checkin_reminder".to_string()),
            message_json: Set(serde_json::json!({ "title": "Check-in" })),
            channels_json: Set(channels),
            sent_at: Set(Utc::now().into()),
            ..Default::default()
        })
        .await
        .unwrap();
    }

    let since = Utc::now() - Duration::hours(1);
    let delivered = repo.count_delivered_since("user-1", since).await.unwrap();
    assert_eq!(
        delivered, 1,
        "queued and failed outcomes must not count toward the cap"
    );

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_queue_due_and_mark_delivered() {
    let db = TestDatabase::create_unique().await.expect("create db");
    let repo = NotificationQueueRepository::new(Arc::clone(&db.conn));
    let id_gen = IdGenerator::new();

    let now = Utc::now();
    let due = repo
        .enqueue(notification_queue::ActiveModel {
            id: Set(id_gen.generate()),
            user_id: Set("user-1".to_string()),
            message_json: Set(serde_json::json!({ "title": "Due now" })),
            queued_at: Set(now.into()),
            deliver_after: Set((now - Duration::minutes(5)).into()),
            delivered: Set(false),
            ..Default::default()
        })
        .await
        .unwrap();

    repo.enqueue(notification_queue::ActiveModel {
        id: Set(id_gen.generate()),
        user_id: Set("user-1".to_string()),
        message_json: Set(serde_json::json!({ "title": "Tomorrow" })),
        queued_at: Set(now.into()),
        deliver_after: Set((now + Duration::hours(10)).into()),
        delivered: Set(false),
        ..Default::default()
    })
    .await
    .unwrap();

    let due_entries = repo.find_due(now).await.unwrap();
    assert_eq!(due_entries.len(), 1);
    assert_eq!(due_entries[0].id, due.id);

    repo.mark_delivered(&due.id).await.unwrap();
    let due_entries = repo.find_due(now).await.unwrap();
    assert!(due_entries.is_empty(), "delivered entries must not reappear");

    db.drop_database().await.unwrap();
}

#[test]
fn test_config_from_env() {
    // Test that default config is valid
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}

#[test]
fn test_database_url_format() {
    let config = TestDbConfig {
        host: "testhost".to_string(),
        port: 5432,
        username: "testuser".to_string(),
        password: "testpass".to_string(),
        database: "testdb".to_string(),
    };

    let url = config.database_url();
    assert!(url.starts_with("postgres://"));
    assert!(url.contains("testhost"));
    assert!(url.contains("5432"));
    assert!(url.contains("testuser"));
    assert!(url.contains("testdb"));
}
