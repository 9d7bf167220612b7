//! Recurring trigger and queue sweeps.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pulse_common::SchedulerSettings;
use pulse_core::{NotificationManager, ProactiveEngine};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::interval;

/// Scheduler timing configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between trigger sweeps (default: 15 minutes).
    pub sweep_interval: Duration,
    /// Interval between deferred-queue sweeps (default: 60 seconds).
    pub queue_interval: Duration,
    /// Domain-activity window that makes a user "active" (default: 24 hours).
    pub activity_window: chrono::Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(900),
            queue_interval: Duration::from_secs(60),
            activity_window: chrono::Duration::hours(24),
        }
    }
}

impl From<&SchedulerSettings> for SchedulerConfig {
    fn from(settings: &SchedulerSettings) -> Self {
        Self {
            sweep_interval: Duration::from_secs(settings.sweep_interval_secs),
            queue_interval: Duration::from_secs(settings.queue_interval_secs),
            activity_window: chrono::Duration::hours(
                i64::try_from(settings.activity_window_hours).unwrap_or(24),
            ),
        }
    }
}

/// The running scheduler's two loop tasks.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    sweep_task: JoinHandle<()>,
    queue_task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal shutdown and wait for both loops to finish. An in-flight
    /// trigger sweep finishes its current user first. Safe to call when the
    /// loops have already exited.
    pub async fn stop(self) {
        // Receivers may already be gone if the tasks exited on their own.
        let _ = self.shutdown.send(true);
        if let Err(e) = self.sweep_task.await {
            tracing::warn!(error = %e, "Trigger sweep task did not shut down cleanly");
        }
        if let Err(e) = self.queue_task.await {
            tracing::warn!(error = %e, "Queue sweep task did not shut down cleanly");
        }
        tracing::info!("Scheduler stopped");
    }
}

/// Spawns and owns the recurring sweeps.
pub struct Scheduler;

impl Scheduler {
    /// Start the trigger sweep and queue sweep on independent intervals.
    /// Both perform an immediate first tick.
    #[must_use]
    pub fn start(
        engine: Arc<ProactiveEngine>,
        notifications: Arc<NotificationManager>,
        config: SchedulerConfig,
    ) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let sweep_task = {
            let mut shutdown = shutdown_rx.clone();
            let activity_window = config.activity_window;
            let sweep_interval = config.sweep_interval;
            tokio::spawn(async move {
                let mut ticker = interval(sweep_interval);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {}
                        _ = shutdown.changed() => break,
                    }
                    let since = Utc::now() - activity_window;
                    match engine.sweep(since, Some(&shutdown)).await {
                        Ok(stats) => {
                            if stats.messages > 0 || stats.failures > 0 {
                                tracing::info!(
                                    users = stats.users,
                                    messages = stats.messages,
                                    failures = stats.failures,
                                    "Trigger sweep completed"
                                );
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Trigger sweep failed");
                        }
                    }
                    if *shutdown.borrow() {
                        break;
                    }
                }
            })
        };

        let queue_task = {
            let mut shutdown = shutdown_rx;
            let queue_interval = config.queue_interval;
            tokio::spawn(async move {
                let mut ticker = interval(queue_interval);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {}
                        _ = shutdown.changed() => break,
                    }
                    match notifications.process_queue(Utc::now()).await {
                        Ok(count) => {
                            if count > 0 {
                                tracing::info!(count, "Delivered deferred notifications");
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Queue sweep failed");
                        }
                    }
                    if *shutdown.borrow() {
                        break;
                    }
                }
            })
        };

        tracing::info!(
            sweep_interval_secs = config.sweep_interval.as_secs(),
            queue_interval_secs = config.queue_interval.as_secs(),
            "Scheduler started"
        );

        SchedulerHandle {
            shutdown: shutdown_tx,
            sweep_task,
            queue_task,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.sweep_interval, Duration::from_secs(900));
        assert_eq!(config.queue_interval, Duration::from_secs(60));
        assert_eq!(config.activity_window, chrono::Duration::hours(24));
    }

    #[test]
    fn test_config_from_settings() {
        let settings = SchedulerSettings {
            sweep_interval_secs: 60,
            queue_interval_secs: 10,
            activity_window_hours: 48,
        };
        let config = SchedulerConfig::from(&settings);
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.activity_window, chrono::Duration::hours(48));
    }
}
