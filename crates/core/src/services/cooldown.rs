//! Cooldown tracking: per (user, trigger type) firing state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use pulse_common::AppResult;
use pulse_db::repositories::TriggerStateRepository;

/// Resolve the cooldown that applies to a trigger for a user: the custom
/// override when present, otherwise the trigger's default, clamped
/// non-negative.
#[must_use]
pub fn effective_cooldown(
    custom_cooldowns: &HashMap<String, i64>,
    trigger_type: &str,
    default_minutes: i64,
) -> i64 {
    custom_cooldowns
        .get(trigger_type)
        .copied()
        .unwrap_or(default_minutes)
        .max(0)
}

/// Per (user, trigger type) firing state store.
///
/// `try_record_firing` is the atomicity seam: the check-then-fire sequence
/// must be a single conditional write so that two concurrent evaluators
/// cannot both observe "not on cooldown" and both fire.
#[async_trait]
pub trait FiringStore: Send + Sync {
    /// Whether the trigger is currently suppressed for the user.
    /// `cooldown_minutes <= 0` never suppresses.
    async fn is_on_cooldown(
        &self,
        user_id: &str,
        trigger_type: &str,
        cooldown_minutes: i64,
    ) -> AppResult<bool>;

    /// Record a firing, but only if the cooldown window has elapsed.
    /// Returns whether the firing was recorded.
    async fn try_record_firing(
        &self,
        user_id: &str,
        trigger_type: &str,
        cooldown_minutes: i64,
    ) -> AppResult<bool>;
}

#[async_trait]
impl FiringStore for TriggerStateRepository {
    async fn is_on_cooldown(
        &self,
        user_id: &str,
        trigger_type: &str,
        cooldown_minutes: i64,
    ) -> AppResult<bool> {
        Self::is_on_cooldown(self, user_id, trigger_type, cooldown_minutes).await
    }

    async fn try_record_firing(
        &self,
        user_id: &str,
        trigger_type: &str,
        cooldown_minutes: i64,
    ) -> AppResult<bool> {
        Self::try_record_firing(self, user_id, trigger_type, cooldown_minutes).await
    }
}

/// Cooldown service wrapping a firing store.
#[derive(Clone)]
pub struct CooldownService {
    store: Arc<dyn FiringStore>,
}

impl CooldownService {
    /// Create a new cooldown service.
    #[must_use]
    pub fn new(store: Arc<dyn FiringStore>) -> Self {
        Self { store }
    }

    /// Whether the trigger is currently suppressed for the user.
    pub async fn is_on_cooldown(
        &self,
        user_id: &str,
        trigger_type: &str,
        cooldown_minutes: i64,
    ) -> AppResult<bool> {
        self.store
            .is_on_cooldown(user_id, trigger_type, cooldown_minutes)
            .await
    }

    /// Atomically record a firing if the cooldown window has elapsed.
    pub async fn try_record_firing(
        &self,
        user_id: &str,
        trigger_type: &str,
        cooldown_minutes: i64,
    ) -> AppResult<bool> {
        self.store
            .try_record_firing(user_id, trigger_type, cooldown_minutes)
            .await
    }
}

/// In-memory firing store. The mutex makes check-then-record atomic, mirroring
/// the conditional upsert the database store uses.
#[derive(Default)]
pub struct InMemoryFiringStore {
    state: Mutex<HashMap<(String, String), (DateTime<Utc>, i64)>>,
}

impl InMemoryFiringStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire count recorded for a (user, trigger type) pair.
    #[must_use]
    pub fn fire_count(&self, user_id: &str, trigger_type: &str) -> i64 {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .get(&(user_id.to_string(), trigger_type.to_string()))
            .map_or(0, |(_, count)| *count)
    }
}

#[async_trait]
impl FiringStore for InMemoryFiringStore {
    async fn is_on_cooldown(
        &self,
        user_id: &str,
        trigger_type: &str,
        cooldown_minutes: i64,
    ) -> AppResult<bool> {
        if cooldown_minutes <= 0 {
            return Ok(false);
        }
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let on_cooldown = state
            .get(&(user_id.to_string(), trigger_type.to_string()))
            .is_some_and(|(last, _)| *last > Utc::now() - Duration::minutes(cooldown_minutes));
        Ok(on_cooldown)
    }

    async fn try_record_firing(
        &self,
        user_id: &str,
        trigger_type: &str,
        cooldown_minutes: i64,
    ) -> AppResult<bool> {
        let now = Utc::now();
        let cutoff = now - Duration::minutes(cooldown_minutes.max(0));
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let key = (user_id.to_string(), trigger_type.to_string());
        match state.get_mut(&key) {
            Some((last, count)) => {
                if *last > cutoff {
                    return Ok(false);
                }
                *last = now;
                *count += 1;
            }
            None => {
                state.insert(key, (now, 1));
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use maplit::hashmap;

    #[test]
    fn test_effective_cooldown_prefers_override() {
        let custom = hashmap! { "streak_at_risk".to_string() => 60 };
        assert_eq!(effective_cooldown(&custom, "streak_at_risk", 240), 60);
        assert_eq!(effective_cooldown(&custom, "overdue_items", 240), 240);
    }

    #[test]
    fn test_effective_cooldown_clamps_negative() {
        let custom = hashmap! { "streak_at_risk".to_string() => -30 };
        assert_eq!(effective_cooldown(&custom, "streak_at_risk", 240), 0);
        assert_eq!(effective_cooldown(&HashMap::new(), "x", -5), 0);
    }

    #[tokio::test]
    async fn test_memory_store_enforces_window() {
        let store = InMemoryFiringStore::new();
        assert!(store.try_record_firing("u1", "t", 60).await.unwrap());
        assert!(!store.try_record_firing("u1", "t", 60).await.unwrap());
        assert!(store.is_on_cooldown("u1", "t", 60).await.unwrap());
        assert_eq!(store.fire_count("u1", "t"), 1);
    }

    #[tokio::test]
    async fn test_zero_cooldown_never_suppresses() {
        let store = InMemoryFiringStore::new();
        assert!(store.try_record_firing("u1", "t", 0).await.unwrap());
        assert!(!store.is_on_cooldown("u1", "t", 0).await.unwrap());
        assert!(store.try_record_firing("u1", "t", 0).await.unwrap());
        assert_eq!(store.fire_count("u1", "t"), 2);
    }

    #[tokio::test]
    async fn test_windows_are_per_user_and_type() {
        let store = InMemoryFiringStore::new();
        assert!(store.try_record_firing("u1", "t", 60).await.unwrap());
        assert!(store.try_record_firing("u2", "t", 60).await.unwrap());
        assert!(store.try_record_firing("u1", "other", 60).await.unwrap());
    }
}
