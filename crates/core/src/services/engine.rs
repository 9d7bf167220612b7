//! The proactive trigger engine.
//!
//! Holds the registered trigger catalog; on a sweep tick, a domain event, or
//! a manual check it assembles per-user context, filters triggers by
//! preference and cooldown, evaluates conditions, and routes produced
//! messages through the notification manager.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use pulse_common::AppResult;
use tokio::sync::watch;

use crate::services::actions::ActionExecutor;
use crate::services::automation::AutomationService;
use crate::services::context::ContextProvider;
use crate::services::cooldown::{CooldownService, effective_cooldown};
use crate::services::events::SystemEvent;
use crate::services::notifications::MessageDispatch;
use crate::services::preferences::PreferenceSource;
use crate::services::trigger::{ProactiveMessage, Trigger};

/// Counters from one sweep over active users.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Users evaluated without a store fault.
    pub users: u64,
    /// Messages produced across those users.
    pub messages: u64,
    /// Users skipped because of a store fault.
    pub failures: u64,
}

/// The current instant in the given IANA timezone. Missing or unparseable
/// names fall back to UTC.
fn local_now(timezone: Option<&str>) -> DateTime<FixedOffset> {
    timezone
        .and_then(|name| name.parse::<Tz>().ok())
        .map_or_else(
            || Utc::now().fixed_offset(),
            |tz| Utc::now().with_timezone(&tz).fixed_offset(),
        )
}

/// The trigger evaluator.
pub struct ProactiveEngine {
    triggers: RwLock<Vec<Arc<dyn Trigger>>>,
    context: Arc<dyn ContextProvider>,
    cooldowns: CooldownService,
    preferences: Arc<dyn PreferenceSource>,
    dispatch: Arc<dyn MessageDispatch>,
    executor: Arc<ActionExecutor>,
    automation: Option<Arc<AutomationService>>,
}

impl ProactiveEngine {
    /// Create an engine with an empty trigger catalog.
    #[must_use]
    pub fn new(
        context: Arc<dyn ContextProvider>,
        cooldowns: CooldownService,
        preferences: Arc<dyn PreferenceSource>,
        dispatch: Arc<dyn MessageDispatch>,
        executor: Arc<ActionExecutor>,
    ) -> Self {
        Self {
            triggers: RwLock::new(Vec::new()),
            context,
            cooldowns,
            preferences,
            dispatch,
            executor,
            automation: None,
        }
    }

    /// Enable automation-rule dispatch on incoming events.
    pub fn set_automation(&mut self, automation: Arc<AutomationService>) {
        self.automation = Some(automation);
    }

    /// Register a trigger. Idempotent by type: a later registration replaces
    /// the earlier one in place, keeping its position in evaluation order.
    pub fn register_trigger(&self, trigger: Arc<dyn Trigger>) {
        let mut triggers = self
            .triggers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = triggers
            .iter_mut()
            .find(|t| t.trigger_type() == trigger.trigger_type())
        {
            *existing = trigger;
        } else {
            triggers.push(trigger);
        }
    }

    /// Register a batch of triggers.
    pub fn register_triggers(&self, triggers: Vec<Arc<dyn Trigger>>) {
        for trigger in triggers {
            self.register_trigger(trigger);
        }
    }

    /// Number of registered triggers.
    #[must_use]
    pub fn trigger_count(&self) -> usize {
        self.triggers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Evaluate every registered trigger for one user, in registration order.
    ///
    /// Condition errors are recovered per trigger; store faults propagate to
    /// the caller (the sweep logs them and moves to the next user).
    pub async fn check_triggers_for_user(
        &self,
        user_id: &str,
        event: Option<&SystemEvent>,
    ) -> AppResult<Vec<ProactiveMessage>> {
        let context = self.context.assemble_context(user_id).await?;
        let prefs = self.preferences.get(user_id).await?;
        // Quiet hours and the daily-cap window are wall-clock concepts in the
        // user's timezone
        let now = local_now(context.timezone.as_deref());
        let triggers: Vec<Arc<dyn Trigger>> = {
            let guard = self
                .triggers
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            guard.clone()
        };

        let mut messages = Vec::new();
        for trigger in triggers {
            let trigger_type = trigger.trigger_type();

            if trigger.user_can_disable() && prefs.disabled_triggers.contains(trigger_type) {
                continue;
            }

            let cooldown = effective_cooldown(
                &prefs.custom_cooldowns,
                trigger_type,
                trigger.cooldown_minutes(),
            );
            if self
                .cooldowns
                .is_on_cooldown(user_id, trigger_type, cooldown)
                .await?
            {
                continue;
            }

            let fired = match trigger.evaluate(&context, event) {
                Ok(fired) => fired,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        trigger_type,
                        user_id = %user_id,
                        "Trigger condition evaluation failed, treating as non-firing"
                    );
                    false
                }
            };
            if !fired {
                continue;
            }

            let details = match trigger.details(&context, event) {
                Ok(details) => details,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        trigger_type,
                        user_id = %user_id,
                        "Trigger detail extraction failed, treating as non-firing"
                    );
                    continue;
                }
            };

            // The atomic check-then-fire. A false return means a concurrent
            // evaluation recorded this firing first.
            if !self
                .cooldowns
                .try_record_firing(user_id, trigger_type, cooldown)
                .await?
            {
                continue;
            }

            let message = trigger.build_message(&details);
            let outcomes = self
                .dispatch
                .dispatch(user_id, trigger_type, &message, &prefs.notifications, now)
                .await?;
            tracing::debug!(
                trigger_type,
                user_id = %user_id,
                outcomes = outcomes.len(),
                "Trigger fired"
            );

            for auto in trigger.auto_actions(&details) {
                let result = self.executor.execute(auto.action, &auto.params, user_id).await;
                if !result.success {
                    tracing::warn!(
                        trigger_type,
                        action = %auto.action,
                        message = %result.message,
                        "Auto-action failed"
                    );
                }
            }

            messages.push(message);
        }
        Ok(messages)
    }

    /// Handle a discrete domain event: evaluate triggers with the event
    /// payload, then dispatch the user's automation rules.
    pub async fn on_event(&self, event: &SystemEvent) -> AppResult<Vec<ProactiveMessage>> {
        let messages = self
            .check_triggers_for_user(event.user_id(), Some(event))
            .await?;

        if let Some(ref automation) = self.automation
            && let Err(e) = automation.handle_event(event).await
        {
            tracing::warn!(
                error = %e,
                event_type = event.event_type(),
                "Automation rule dispatch failed"
            );
        }

        Ok(messages)
    }

    /// Manual, user-initiated re-evaluation with no event payload.
    pub async fn check_now(&self, user_id: &str) -> AppResult<Vec<ProactiveMessage>> {
        self.check_triggers_for_user(user_id, None).await
    }

    /// Sweep every user with domain activity since `since`. A store fault for
    /// one user is logged and the sweep continues with the next; a shutdown
    /// signal lets the current user finish, then halts iteration.
    pub async fn sweep(
        &self,
        since: DateTime<Utc>,
        shutdown: Option<&watch::Receiver<bool>>,
    ) -> AppResult<SweepStats> {
        let user_ids = self.context.active_user_ids(since).await?;
        let mut stats = SweepStats::default();

        for user_id in user_ids {
            if let Some(rx) = shutdown
                && *rx.borrow()
            {
                tracing::info!("Sweep interrupted by shutdown");
                break;
            }
            match self.check_triggers_for_user(&user_id, None).await {
                Ok(messages) => {
                    stats.users += 1;
                    stats.messages += messages.len() as u64;
                }
                Err(e) => {
                    stats.failures += 1;
                    tracing::warn!(
                        error = %e,
                        user_id = %user_id,
                        "Sweep failed for user, continuing"
                    );
                }
            }
        }
        Ok(stats)
    }
}
