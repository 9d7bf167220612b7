//! Business logic services.

pub mod actions;
pub mod automation;
pub mod context;
pub mod cooldown;
pub mod engine;
pub mod events;
pub mod handlers;
pub mod notifications;
pub mod preferences;
pub mod transports;
pub mod trigger;

pub use actions::{
    ActionExecutor, ActionHandler, ActionResult, ActionType, AuditSink, MemoryAuditSink,
};
pub use automation::{
    AutomationService, CreateRuleInput, RuleCondition, RuleOperator, RuleTrigger, UpdateRuleInput,
};
pub use context::{
    BehaviorPatterns, CalendarEventSnapshot, ContextProvider, GoalSnapshot, HabitSnapshot,
    InMemoryContextProvider, UserContext, WorkloadSnapshot,
};
pub use cooldown::{CooldownService, FiringStore, InMemoryFiringStore, effective_cooldown};
pub use engine::{ProactiveEngine, SweepStats};
pub use events::SystemEvent;
pub use handlers::{SendNotificationHandler, SnoozeTriggerHandler, register_builtin_handlers};
pub use notifications::{
    DeliveryDecision, DeliveryOutcome, MessageDispatch, NotificationManager, QueueReason,
};
pub use preferences::{
    Channel, NotificationPreferences, NotificationPreferencesUpdate, PreferenceService,
    PreferenceSource, QuietHours, UserTriggerPreferences,
};
pub use transports::{
    EmailTransport, HttpPushTransport, PushTransport, RecipientDirectory, SmtpEmailTransport,
};
pub use trigger::{ActionKind, AutoAction, ProactiveMessage, Suggestion, Trigger, TriggerPriority};
