//! User trigger preferences: disabled triggers, cooldown overrides, and
//! notification delivery preferences.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use pulse_common::{AppError, AppResult};
use pulse_db::entities::user_trigger_preferences;
use pulse_db::repositories::PreferenceRepository;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

/// A notification delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// In-app inbox / toast surface.
    InApp,
    /// Push via the configured gateway.
    Push,
    /// Email.
    Email,
}

impl Channel {
    /// Stable string form, matching the serialized representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InApp => "in_app",
            Self::Push => "push",
            Self::Email => "email",
        }
    }
}

/// A daily time-of-day window during which non-urgent delivery is deferred.
/// Wraparound is allowed: `start = 22, end = 8` covers 22:00 through 07:59.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHours {
    /// Hour the window opens, 0..=23.
    pub start: u32,
    /// Hour the window closes (exclusive), 0..=23.
    pub end: u32,
}

/// Notification delivery preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    /// Channels to deliver on.
    pub channels: Vec<Channel>,
    /// Quiet-hours window, when configured.
    pub quiet_hours: Option<QuietHours>,
    /// Whether urgent messages may override quiet hours.
    pub urgent_overrides_quiet: bool,
    /// Maximum deliveries per day; urgent and high priority are exempt.
    pub max_per_day: u32,
    /// Whether similar pending messages are grouped.
    pub group_similar: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            channels: vec![Channel::InApp],
            quiet_hours: Some(QuietHours { start: 22, end: 8 }),
            urgent_overrides_quiet: true,
            max_per_day: 10,
            group_similar: true,
        }
    }
}

/// A user's full trigger preference record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserTriggerPreferences {
    /// Trigger types the user has disabled.
    pub disabled_triggers: HashSet<String>,
    /// Per-trigger cooldown overrides, in minutes.
    pub custom_cooldowns: HashMap<String, i64>,
    /// Delivery preferences.
    #[serde(default)]
    pub notifications: NotificationPreferences,
}

/// Partial update of notification preferences. `quiet_hours` distinguishes
/// "leave unchanged" (`None`) from "clear the window" (`Some(None)`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationPreferencesUpdate {
    /// Replacement channel list.
    pub channels: Option<Vec<Channel>>,
    /// Replacement quiet-hours window, or `Some(None)` to clear it.
    pub quiet_hours: Option<Option<QuietHours>>,
    /// Replacement urgent-override flag.
    pub urgent_overrides_quiet: Option<bool>,
    /// Replacement daily cap.
    pub max_per_day: Option<u32>,
    /// Replacement grouping flag.
    pub group_similar: Option<bool>,
}

/// Read-only preference lookup, the engine's view of the preference store.
#[async_trait]
pub trait PreferenceSource: Send + Sync {
    /// Get a user's preferences, falling back to defaults when absent.
    async fn get(&self, user_id: &str) -> AppResult<UserTriggerPreferences>;
}

/// Preference service for business logic.
#[derive(Clone)]
pub struct PreferenceService {
    repo: PreferenceRepository,
}

impl PreferenceService {
    /// Create a new preference service.
    #[must_use]
    pub const fn new(repo: PreferenceRepository) -> Self {
        Self { repo }
    }

    /// Get a user's preferences. Absent rows yield defaults: all triggers
    /// enabled, in-app channel only, quiet hours 22:00–08:00, urgent
    /// overrides quiet, ten per day, grouping on.
    pub async fn get(&self, user_id: &str) -> AppResult<UserTriggerPreferences> {
        let Some(model) = self.repo.find_by_user(user_id).await? else {
            return Ok(UserTriggerPreferences::default());
        };
        Ok(Self::from_model(&model))
    }

    /// Enable or disable a trigger type for a user.
    pub async fn set_trigger_enabled(
        &self,
        user_id: &str,
        trigger_type: &str,
        enabled: bool,
    ) -> AppResult<()> {
        let mut prefs = self.get(user_id).await?;
        if enabled {
            prefs.disabled_triggers.remove(trigger_type);
        } else {
            prefs.disabled_triggers.insert(trigger_type.to_string());
        }
        self.save(user_id, &prefs).await
    }

    /// Set a per-trigger cooldown override. Negative values are rejected:
    /// a negative effective cooldown would disable suppression entirely.
    pub async fn set_custom_cooldown(
        &self,
        user_id: &str,
        trigger_type: &str,
        minutes: i64,
    ) -> AppResult<()> {
        if minutes < 0 {
            return Err(AppError::Validation(
                "custom cooldown minutes must be non-negative".to_string(),
            ));
        }
        let mut prefs = self.get(user_id).await?;
        prefs
            .custom_cooldowns
            .insert(trigger_type.to_string(), minutes);
        self.save(user_id, &prefs).await
    }

    /// Remove a per-trigger cooldown override, restoring the trigger default.
    pub async fn clear_custom_cooldown(&self, user_id: &str, trigger_type: &str) -> AppResult<()> {
        let mut prefs = self.get(user_id).await?;
        prefs.custom_cooldowns.remove(trigger_type);
        self.save(user_id, &prefs).await
    }

    /// Apply a partial update to delivery preferences.
    pub async fn update_notification_preferences(
        &self,
        user_id: &str,
        update: NotificationPreferencesUpdate,
    ) -> AppResult<NotificationPreferences> {
        let mut prefs = self.get(user_id).await?;
        let n = &mut prefs.notifications;

        if let Some(channels) = update.channels {
            if channels.is_empty() {
                return Err(AppError::Validation(
                    "at least one delivery channel is required".to_string(),
                ));
            }
            n.channels = channels;
        }
        if let Some(quiet_hours) = update.quiet_hours {
            if let Some(window) = quiet_hours
                && (window.start > 23 || window.end > 23)
            {
                return Err(AppError::Validation(
                    "quiet hours must be hours of day in 0..=23".to_string(),
                ));
            }
            n.quiet_hours = quiet_hours;
        }
        if let Some(flag) = update.urgent_overrides_quiet {
            n.urgent_overrides_quiet = flag;
        }
        if let Some(max_per_day) = update.max_per_day {
            if max_per_day == 0 {
                return Err(AppError::Validation(
                    "max_per_day must be at least 1".to_string(),
                ));
            }
            n.max_per_day = max_per_day;
        }
        if let Some(flag) = update.group_similar {
            n.group_similar = flag;
        }

        let updated = prefs.notifications.clone();
        self.save(user_id, &prefs).await?;
        Ok(updated)
    }

    /// Delete a user's preferences (account deletion cascade).
    pub async fn delete_for_user(&self, user_id: &str) -> AppResult<()> {
        self.repo.delete_for_user(user_id).await
    }

    fn from_model(model: &user_trigger_preferences::Model) -> UserTriggerPreferences {
        UserTriggerPreferences {
            disabled_triggers: serde_json::from_value(model.disabled_triggers_json.clone())
                .unwrap_or_default(),
            custom_cooldowns: serde_json::from_value(model.custom_cooldowns_json.clone())
                .unwrap_or_default(),
            notifications: serde_json::from_value(model.notification_prefs_json.clone())
                .unwrap_or_default(),
        }
    }

    async fn save(&self, user_id: &str, prefs: &UserTriggerPreferences) -> AppResult<()> {
        let model = user_trigger_preferences::ActiveModel {
            user_id: Set(user_id.to_string()),
            disabled_triggers_json: Set(serde_json::to_value(&prefs.disabled_triggers)
                .map_err(|e| AppError::Internal(e.to_string()))?),
            custom_cooldowns_json: Set(serde_json::to_value(&prefs.custom_cooldowns)
                .map_err(|e| AppError::Internal(e.to_string()))?),
            notification_prefs_json: Set(serde_json::to_value(&prefs.notifications)
                .map_err(|e| AppError::Internal(e.to_string()))?),
            updated_at: Set(Utc::now().into()),
        };
        self.repo.upsert(model).await
    }
}

#[async_trait]
impl PreferenceSource for PreferenceService {
    async fn get(&self, user_id: &str) -> AppResult<UserTriggerPreferences> {
        Self::get(self, user_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preferences() {
        let prefs = UserTriggerPreferences::default();
        assert!(prefs.disabled_triggers.is_empty());
        assert!(prefs.custom_cooldowns.is_empty());
        assert_eq!(prefs.notifications.channels, vec![Channel::InApp]);
        assert_eq!(
            prefs.notifications.quiet_hours,
            Some(QuietHours { start: 22, end: 8 })
        );
        assert!(prefs.notifications.urgent_overrides_quiet);
        assert_eq!(prefs.notifications.max_per_day, 10);
        assert!(prefs.notifications.group_similar);
    }

    #[test]
    fn test_channel_serializes_snake_case() {
        assert_eq!(serde_json::to_value(Channel::InApp).unwrap(), "in_app");
        assert_eq!(Channel::Push.as_str(), "push");
    }

    #[test]
    fn test_preferences_round_trip() {
        let mut prefs = UserTriggerPreferences::default();
        prefs.disabled_triggers.insert("morning_briefing".to_string());
        prefs.custom_cooldowns.insert("streak_at_risk".to_string(), 60);

        let json = serde_json::to_value(&prefs).unwrap();
        let back: UserTriggerPreferences = serde_json::from_value(json).unwrap();
        assert!(back.disabled_triggers.contains("morning_briefing"));
        assert_eq!(back.custom_cooldowns.get("streak_at_risk"), Some(&60));
    }
}
