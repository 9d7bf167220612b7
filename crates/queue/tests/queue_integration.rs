//! Scheduler lifecycle tests.
//!
//! These run the real sweep loops against in-memory collaborators and a
//! mock database, so they exercise startup, ticking, and cooperative
//! shutdown without external services.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use pulse_core::{
    ActionExecutor, CooldownService, InMemoryContextProvider, InMemoryFiringStore,
    MemoryAuditSink, MessageDispatch, NotificationManager, PreferenceService, ProactiveEngine,
};
use pulse_db::repositories::{
    InAppNotificationRepository, NotificationQueueRepository, PreferenceRepository,
    ProactiveNotificationRepository,
};
use pulse_queue::{Scheduler, SchedulerConfig};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};

fn mock_connection() -> Arc<DatabaseConnection> {
    // Enough empty result sets to cover every queue-sweep SELECT a short
    // test can issue.
    let empty: Vec<pulse_db::entities::notification_queue::Model> = Vec::new();
    Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![empty; 256])
            .into_connection(),
    )
}

fn harness() -> (Arc<ProactiveEngine>, Arc<NotificationManager>) {
    let db = mock_connection();
    let manager = Arc::new(NotificationManager::new(
        ProactiveNotificationRepository::new(Arc::clone(&db)),
        NotificationQueueRepository::new(Arc::clone(&db)),
        InAppNotificationRepository::new(Arc::clone(&db)),
    ));
    let engine = Arc::new(ProactiveEngine::new(
        Arc::new(InMemoryContextProvider::new()),
        CooldownService::new(Arc::new(InMemoryFiringStore::new())),
        Arc::new(PreferenceService::new(PreferenceRepository::new(
            Arc::clone(&db),
        ))),
        Arc::clone(&manager) as Arc<dyn MessageDispatch>,
        Arc::new(ActionExecutor::new(Arc::new(MemoryAuditSink::new()))),
    ));
    (engine, manager)
}

fn fast_config() -> SchedulerConfig {
    SchedulerConfig {
        sweep_interval: Duration::from_millis(10),
        queue_interval: Duration::from_millis(10),
        activity_window: chrono::Duration::hours(24),
    }
}

#[tokio::test]
async fn test_scheduler_runs_and_stops() {
    let (engine, manager) = harness();
    let handle = Scheduler::start(engine, manager, fast_config());

    // Let both loops tick a few times.
    tokio::time::sleep(Duration::from_millis(50)).await;

    tokio::time::timeout(Duration::from_secs(5), handle.stop())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_stop_before_first_scheduled_tick() {
    let (engine, manager) = harness();
    let config = SchedulerConfig {
        sweep_interval: Duration::from_secs(3600),
        queue_interval: Duration::from_secs(3600),
        activity_window: chrono::Duration::hours(24),
    };
    let handle = Scheduler::start(engine, manager, config);

    // Only the immediate first tick has run; stop must not wait for the
    // next interval.
    tokio::time::timeout(Duration::from_secs(5), handle.stop())
        .await
        .unwrap();
}
