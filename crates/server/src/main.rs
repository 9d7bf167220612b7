//! Pulse server entry point.

use std::sync::Arc;

use axum::{Json, Router, routing::get};
use pulse_common::Config;
use pulse_core::{
    ActionExecutor, AutomationService, CooldownService, HttpPushTransport, InMemoryContextProvider,
    MessageDispatch, NotificationManager, PreferenceService, ProactiveEngine, RecipientDirectory,
    SmtpEmailTransport, register_builtin_handlers,
};
use pulse_db::repositories::{
    ActionLogRepository, AutomationRuleRepository, InAppNotificationRepository,
    NotificationQueueRepository, PreferenceRepository, ProactiveNotificationRepository,
    TriggerStateRepository,
};
use pulse_queue::{Scheduler, SchedulerConfig};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Recipient lookup stub. The embedding application provides the real
/// address lookup; without one, email sends fail per channel and are
/// logged by the notification manager.
struct NullDirectory;

impl RecipientDirectory for NullDirectory {
    fn email_address(&self, _user_id: &str) -> Option<String> {
        None
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pulse=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting pulse server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = Arc::new(pulse_db::init(&config).await?);
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    pulse_db::migrate(&db).await?;
    info!("Migrations completed");

    // Repositories
    let trigger_state_repo = TriggerStateRepository::new(Arc::clone(&db));
    let notification_repo = ProactiveNotificationRepository::new(Arc::clone(&db));
    let queue_repo = NotificationQueueRepository::new(Arc::clone(&db));
    let in_app_repo = InAppNotificationRepository::new(Arc::clone(&db));
    let action_log_repo = ActionLogRepository::new(Arc::clone(&db));
    let rule_repo = AutomationRuleRepository::new(Arc::clone(&db));
    let preference_repo = PreferenceRepository::new(Arc::clone(&db));

    // Services
    let preferences = PreferenceService::new(preference_repo);
    let cooldowns = CooldownService::new(Arc::new(trigger_state_repo));
    let executor = Arc::new(ActionExecutor::new(Arc::new(action_log_repo)));
    register_builtin_handlers(&executor, preferences.clone(), in_app_repo.clone());

    let mut manager = NotificationManager::new(notification_repo, queue_repo, in_app_repo);
    manager.set_preference_source(Arc::new(preferences.clone()));
    if let Some(push_settings) = &config.push {
        manager.set_push_transport(Arc::new(HttpPushTransport::new(push_settings)?));
        info!("Push transport configured");
    }
    if let Some(email_settings) = &config.email {
        manager.set_email_transport(Arc::new(SmtpEmailTransport::new(
            email_settings,
            Arc::new(NullDirectory),
        )?));
        info!("Email transport configured");
    }
    let notifications = Arc::new(manager);

    let automation = Arc::new(AutomationService::new(rule_repo, Arc::clone(&executor)));

    // The embedding application seeds context snapshots and registers its
    // trigger catalog on the engine before traffic arrives.
    let context = Arc::new(InMemoryContextProvider::new());

    let mut engine = ProactiveEngine::new(
        context,
        cooldowns,
        Arc::new(preferences),
        Arc::clone(&notifications) as Arc<dyn MessageDispatch>,
        executor,
    );
    engine.set_automation(automation);
    let engine = Arc::new(engine);
    info!(triggers = engine.trigger_count(), "Proactive engine ready");

    // Start the recurring sweeps
    let scheduler = Scheduler::start(
        Arc::clone(&engine),
        Arc::clone(&notifications),
        SchedulerConfig::from(&config.scheduler),
    );

    let app = Router::new()
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http());

    // Start server with graceful shutdown
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop().await;
    info!("Server shutdown complete");
    Ok(())
}
