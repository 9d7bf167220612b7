//! Engine behavior tests over in-memory collaborators.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use pulse_common::{AppError, AppResult};
use pulse_core::{
    ActionExecutor, AutoAction, CooldownService, DeliveryOutcome, HabitSnapshot,
    InMemoryContextProvider, InMemoryFiringStore, MemoryAuditSink, MessageDispatch,
    NotificationPreferences, PreferenceSource, ProactiveEngine, ProactiveMessage, SystemEvent,
    Trigger, TriggerPriority, UserContext, UserTriggerPreferences,
};

struct StaticPrefs(Mutex<UserTriggerPreferences>);

impl StaticPrefs {
    fn new(prefs: UserTriggerPreferences) -> Self {
        Self(Mutex::new(prefs))
    }
}

#[async_trait]
impl PreferenceSource for StaticPrefs {
    async fn get(&self, _user_id: &str) -> AppResult<UserTriggerPreferences> {
        Ok(self.0.lock().unwrap().clone())
    }
}

#[derive(Default)]
struct MemoryDispatch {
    records: Mutex<Vec<(String, String, String)>>,
    offsets: Mutex<Vec<i32>>,
}

impl MemoryDispatch {
    fn records(&self) -> Vec<(String, String, String)> {
        self.records.lock().unwrap().clone()
    }

    fn offsets(&self) -> Vec<i32> {
        self.offsets.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageDispatch for MemoryDispatch {
    async fn dispatch(
        &self,
        user_id: &str,
        trigger_type: &str,
        message: &ProactiveMessage,
        _prefs: &NotificationPreferences,
        now: DateTime<FixedOffset>,
    ) -> AppResult<Vec<DeliveryOutcome>> {
        self.records.lock().unwrap().push((
            user_id.to_string(),
            trigger_type.to_string(),
            message.title.clone(),
        ));
        self.offsets
            .lock()
            .unwrap()
            .push(now.offset().local_minus_utc());
        Ok(vec![DeliveryOutcome::Delivered(
            pulse_core::Channel::InApp,
        )])
    }
}

struct StreakAtRiskTrigger;

impl Trigger for StreakAtRiskTrigger {
    fn trigger_type(&self) -> &'static str {
        "streak_at_risk"
    }

    fn priority(&self) -> TriggerPriority {
        TriggerPriority::Medium
    }

    fn cooldown_minutes(&self) -> i64 {
        240
    }

    fn evaluate(&self, context: &UserContext, _event: Option<&SystemEvent>) -> AppResult<bool> {
        Ok(context.local_hour >= 18
            && context
                .habits
                .iter()
                .any(|h| !h.completed_today && h.streak_days >= 7))
    }

    fn details(
        &self,
        context: &UserContext,
        _event: Option<&SystemEvent>,
    ) -> AppResult<serde_json::Value> {
        let habit = context
            .habits
            .iter()
            .find(|h| !h.completed_today && h.streak_days >= 7)
            .ok_or_else(|| AppError::Internal("no at-risk habit".to_string()))?;
        Ok(serde_json::json!({ "name": habit.name, "streak_days": habit.streak_days }))
    }

    fn build_message(&self, details: &serde_json::Value) -> ProactiveMessage {
        ProactiveMessage {
            title: "Streak at Risk".to_string(),
            body: format!(
                "Your {} streak of {} days ends at midnight.",
                details["name"].as_str().unwrap_or("habit"),
                details["streak_days"]
            ),
            suggestions: Vec::new(),
            priority: self.priority(),
        }
    }
}

struct NamedTrigger {
    trigger_type: &'static str,
    disableable: bool,
    fires: bool,
    errors: bool,
}

impl NamedTrigger {
    const fn firing(trigger_type: &'static str) -> Self {
        Self {
            trigger_type,
            disableable: true,
            fires: true,
            errors: false,
        }
    }
}

impl Trigger for NamedTrigger {
    fn trigger_type(&self) -> &'static str {
        self.trigger_type
    }

    fn priority(&self) -> TriggerPriority {
        TriggerPriority::Medium
    }

    fn cooldown_minutes(&self) -> i64 {
        0
    }

    fn user_can_disable(&self) -> bool {
        self.disableable
    }

    fn evaluate(&self, _context: &UserContext, _event: Option<&SystemEvent>) -> AppResult<bool> {
        if self.errors {
            return Err(AppError::Internal("condition blew up".to_string()));
        }
        Ok(self.fires)
    }

    fn details(
        &self,
        _context: &UserContext,
        _event: Option<&SystemEvent>,
    ) -> AppResult<serde_json::Value> {
        Ok(serde_json::json!({}))
    }

    fn build_message(&self, _details: &serde_json::Value) -> ProactiveMessage {
        ProactiveMessage {
            title: self.trigger_type.to_string(),
            body: String::new(),
            suggestions: Vec::new(),
            priority: TriggerPriority::Medium,
        }
    }
}

struct Harness {
    engine: ProactiveEngine,
    context: Arc<InMemoryContextProvider>,
    dispatch: Arc<MemoryDispatch>,
}

fn harness(prefs: UserTriggerPreferences) -> Harness {
    let context = Arc::new(InMemoryContextProvider::new());
    let dispatch = Arc::new(MemoryDispatch::default());
    let executor = Arc::new(ActionExecutor::new(Arc::new(MemoryAuditSink::new())));
    let engine = ProactiveEngine::new(
        context.clone(),
        CooldownService::new(Arc::new(InMemoryFiringStore::new())),
        Arc::new(StaticPrefs::new(prefs)),
        dispatch.clone(),
        executor,
    );
    Harness {
        engine,
        context,
        dispatch,
    }
}

fn evening_context_with_streak(user_id: &str) -> UserContext {
    let mut context = UserContext::empty(user_id, Utc::now());
    context.local_hour = 19;
    context.habits.push(HabitSnapshot {
        id: "h1".to_string(),
        name: "meditation".to_string(),
        streak_days: 8,
        completed_today: false,
        usual_hour: Some(7),
    });
    context
}

#[tokio::test]
async fn test_streak_at_risk_fires_once_per_cooldown() {
    let h = harness(UserTriggerPreferences::default());
    h.engine.register_trigger(Arc::new(StreakAtRiskTrigger));
    h.context.set_context(evening_context_with_streak("u1"));

    let messages = h.engine.check_triggers_for_user("u1", None).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].title, "Streak at Risk");
    assert_eq!(messages[0].priority, TriggerPriority::Medium);

    // Within the 240-minute cooldown window nothing fires
    let messages = h.engine.check_triggers_for_user("u1", None).await.unwrap();
    assert!(messages.is_empty());

    // Exactly one dispatch reached the delivery pipeline
    assert_eq!(h.dispatch.records().len(), 1);
}

#[tokio::test]
async fn test_condition_false_produces_nothing() {
    let h = harness(UserTriggerPreferences::default());
    h.engine.register_trigger(Arc::new(StreakAtRiskTrigger));

    let mut context = evening_context_with_streak("u1");
    context.local_hour = 10; // before the evening threshold
    h.context.set_context(context);

    let messages = h.engine.check_triggers_for_user("u1", None).await.unwrap();
    assert!(messages.is_empty());
    assert!(h.dispatch.records().is_empty());
}

#[tokio::test]
async fn test_disabled_trigger_never_fires() {
    let mut prefs = UserTriggerPreferences::default();
    prefs.disabled_triggers.insert("nudge".to_string());
    let h = harness(prefs);
    h.engine.register_trigger(Arc::new(NamedTrigger::firing("nudge")));

    let messages = h.engine.check_triggers_for_user("u1", None).await.unwrap();
    assert!(messages.is_empty());
}

#[tokio::test]
async fn test_non_disableable_trigger_ignores_preference() {
    let mut prefs = UserTriggerPreferences::default();
    prefs.disabled_triggers.insert("safety_check".to_string());
    let h = harness(prefs);
    h.engine.register_trigger(Arc::new(NamedTrigger {
        trigger_type: "safety_check",
        disableable: false,
        fires: true,
        errors: false,
    }));

    let messages = h.engine.check_triggers_for_user("u1", None).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].title, "safety_check");
}

#[tokio::test]
async fn test_condition_error_does_not_abort_siblings() {
    let h = harness(UserTriggerPreferences::default());
    h.engine.register_trigger(Arc::new(NamedTrigger {
        trigger_type: "broken",
        disableable: true,
        fires: true,
        errors: true,
    }));
    h.engine.register_trigger(Arc::new(NamedTrigger::firing("healthy")));

    let messages = h.engine.check_triggers_for_user("u1", None).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].title, "healthy");
}

#[tokio::test]
async fn test_triggers_evaluate_in_registration_order() {
    let h = harness(UserTriggerPreferences::default());
    h.engine.register_triggers(vec![
        Arc::new(NamedTrigger::firing("first")),
        Arc::new(NamedTrigger::firing("second")),
        Arc::new(NamedTrigger::firing("third")),
    ]);

    let messages = h.engine.check_triggers_for_user("u1", None).await.unwrap();
    let titles: Vec<&str> = messages.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn test_reregistration_replaces_in_place() {
    let h = harness(UserTriggerPreferences::default());
    h.engine.register_trigger(Arc::new(NamedTrigger::firing("a")));
    h.engine.register_trigger(Arc::new(NamedTrigger::firing("b")));
    // Replace "a" with a non-firing version; it keeps its slot
    h.engine.register_trigger(Arc::new(NamedTrigger {
        trigger_type: "a",
        disableable: true,
        fires: false,
        errors: false,
    }));
    assert_eq!(h.engine.trigger_count(), 2);

    let messages = h.engine.check_triggers_for_user("u1", None).await.unwrap();
    let titles: Vec<&str> = messages.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["b"]);
}

#[tokio::test]
async fn test_custom_cooldown_override_applies() {
    let mut prefs = UserTriggerPreferences::default();
    // Overriding to zero removes suppression entirely
    prefs.custom_cooldowns.insert("streak_at_risk".to_string(), 0);
    let h = harness(prefs);
    h.engine.register_trigger(Arc::new(StreakAtRiskTrigger));
    h.context.set_context(evening_context_with_streak("u1"));

    let first = h.engine.check_triggers_for_user("u1", None).await.unwrap();
    let second = h.engine.check_triggers_for_user("u1", None).await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
}

#[tokio::test]
async fn test_dispatch_clock_follows_user_timezone() {
    let h = harness(UserTriggerPreferences::default());
    h.engine.register_trigger(Arc::new(NamedTrigger::firing("nudge")));

    let mut context = UserContext::empty("u1", Utc::now());
    context.timezone = Some("Asia/Tokyo".to_string());
    h.context.set_context(context);

    let messages = h.engine.check_triggers_for_user("u1", None).await.unwrap();
    assert_eq!(messages.len(), 1);
    // Delivery policy saw a Tokyo wall clock, not UTC
    assert_eq!(h.dispatch.offsets(), vec![9 * 3600]);
}

#[tokio::test]
async fn test_on_event_targets_the_event_user() {
    let h = harness(UserTriggerPreferences::default());
    h.engine.register_trigger(Arc::new(NamedTrigger::firing("event_echo")));

    let event = SystemEvent::ItemCompleted {
        user_id: "u7".to_string(),
        item_id: "i1".to_string(),
        title: "Ship release".to_string(),
        completed_at: Utc::now(),
    };
    let messages = h.engine.on_event(&event).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(h.dispatch.records()[0].0, "u7");
}

#[tokio::test]
async fn test_sweep_covers_active_users_only() {
    let h = harness(UserTriggerPreferences::default());
    h.engine.register_trigger(Arc::new(NamedTrigger::firing("nudge")));

    let now = Utc::now();
    h.context.mark_active("u1", now);
    h.context.mark_active("u2", now);
    h.context
        .mark_active("dormant", now - chrono::Duration::hours(48));

    let stats = h
        .engine
        .sweep(now - chrono::Duration::hours(24), None)
        .await
        .unwrap();
    assert_eq!(stats.users, 2);
    assert_eq!(stats.messages, 2);
    assert_eq!(stats.failures, 0);

    let mut users: Vec<String> = h.dispatch.records().iter().map(|r| r.0.clone()).collect();
    users.sort();
    assert_eq!(users, vec!["u1".to_string(), "u2".to_string()]);
}

#[tokio::test]
async fn test_sweep_halts_between_users_on_shutdown() {
    let h = harness(UserTriggerPreferences::default());
    h.engine.register_trigger(Arc::new(NamedTrigger::firing("nudge")));

    let now = Utc::now();
    h.context.mark_active("u1", now);
    h.context.mark_active("u2", now);

    let (tx, rx) = tokio::sync::watch::channel(true);
    let stats = h
        .engine
        .sweep(now - chrono::Duration::hours(24), Some(&rx))
        .await
        .unwrap();
    drop(tx);
    assert_eq!(stats.users, 0);
    assert!(h.dispatch.records().is_empty());
}

#[tokio::test]
async fn test_auto_actions_run_through_executor() {
    struct AutoActionTrigger;

    impl Trigger for AutoActionTrigger {
        fn trigger_type(&self) -> &'static str {
            "with_auto_action"
        }
        fn priority(&self) -> TriggerPriority {
            TriggerPriority::Low
        }
        fn cooldown_minutes(&self) -> i64 {
            0
        }
        fn evaluate(&self, _: &UserContext, _: Option<&SystemEvent>) -> AppResult<bool> {
            Ok(true)
        }
        fn details(&self, _: &UserContext, _: Option<&SystemEvent>) -> AppResult<serde_json::Value> {
            Ok(serde_json::json!({}))
        }
        fn build_message(&self, _: &serde_json::Value) -> ProactiveMessage {
            ProactiveMessage {
                title: "auto".to_string(),
                body: String::new(),
                suggestions: Vec::new(),
                priority: TriggerPriority::Low,
            }
        }
        fn auto_actions(&self, _: &serde_json::Value) -> Vec<AutoAction> {
            vec![AutoAction {
                action: pulse_core::ActionType::LogHabit,
                params: serde_json::json!({ "habit_id": "h1" }),
            }]
        }
    }

    let context = Arc::new(InMemoryContextProvider::new());
    let audit = Arc::new(MemoryAuditSink::new());
    let executor = Arc::new(ActionExecutor::new(audit.clone()));
    let engine = ProactiveEngine::new(
        context,
        CooldownService::new(Arc::new(InMemoryFiringStore::new())),
        Arc::new(StaticPrefs::new(UserTriggerPreferences::default())),
        Arc::new(MemoryDispatch::default()),
        executor,
    );
    engine.register_trigger(Arc::new(AutoActionTrigger));

    // No handler registered: the auto-action fails, but the firing survives
    // and the attempt is audited.
    let messages = engine.check_triggers_for_user("u1", None).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(audit.rows().len(), 1);
    assert_eq!(audit.rows()[0].1, "log_habit");
    assert!(!audit.rows()[0].2);
}
