//! User-authored automation rules: flat condition lists over event payloads,
//! executed through the action executor.

use std::sync::Arc;

use chrono::Utc;
use pulse_common::{AppError, AppResult, IdGenerator};
use pulse_db::entities::automation_rule;
use pulse_db::repositories::AutomationRuleRepository;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::actions::{ActionExecutor, ActionResult};
use crate::services::events::SystemEvent;
use crate::services::trigger::AutoAction;

/// Comparison operator in a rule condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOperator {
    /// Exact JSON value equality.
    Equals,
    /// Exact JSON value inequality.
    NotEquals,
    /// Substring match; strings only.
    Contains,
    /// Numeric greater-than; numbers only.
    GreaterThan,
    /// Numeric less-than; numbers only.
    LessThan,
}

/// One condition over an event payload field. A type mismatch between the
/// field and the operand evaluates to `false`, never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleCondition {
    /// Payload field name.
    pub field: String,
    /// Comparison operator.
    pub operator: RuleOperator,
    /// Operand value.
    pub value: serde_json::Value,
}

/// The trigger half of a rule: ANDed conditions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleTrigger {
    /// Conditions, all of which must hold.
    #[serde(default)]
    pub conditions: Vec<RuleCondition>,
}

/// Input for creating a rule.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRuleInput {
    /// Rule name.
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Whether the rule starts enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Conditions.
    pub trigger: RuleTrigger,
    /// Actions to run on match, in declared order.
    #[validate(length(min = 1))]
    pub actions: Vec<AutoAction>,
}

const fn default_enabled() -> bool {
    true
}

/// Input for updating a rule. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateRuleInput {
    /// Replacement name.
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    /// Replacement enabled flag.
    pub enabled: Option<bool>,
    /// Replacement conditions.
    pub trigger: Option<RuleTrigger>,
    /// Replacement actions.
    #[validate(length(min = 1))]
    pub actions: Option<Vec<AutoAction>>,
}

/// Evaluate one condition against an event payload. Missing fields and type
/// mismatches are `false`.
#[must_use]
pub fn evaluate_condition(condition: &RuleCondition, event_data: &serde_json::Value) -> bool {
    let Some(field_value) = event_data.get(&condition.field) else {
        return false;
    };
    match condition.operator {
        RuleOperator::Equals => field_value == &condition.value,
        RuleOperator::NotEquals => field_value != &condition.value,
        RuleOperator::Contains => match (field_value.as_str(), condition.value.as_str()) {
            (Some(haystack), Some(needle)) => haystack.contains(needle),
            _ => false,
        },
        RuleOperator::GreaterThan => match (field_value.as_f64(), condition.value.as_f64()) {
            (Some(a), Some(b)) => a > b,
            _ => false,
        },
        RuleOperator::LessThan => match (field_value.as_f64(), condition.value.as_f64()) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        },
    }
}

/// Whether a rule matches an event payload: enabled and every condition holds.
#[must_use]
pub fn evaluate_rule(enabled: bool, trigger: &RuleTrigger, event_data: &serde_json::Value) -> bool {
    enabled
        && trigger
            .conditions
            .iter()
            .all(|c| evaluate_condition(c, event_data))
}

/// Automation rule service: CRUD plus evaluation and execution.
#[derive(Clone)]
pub struct AutomationService {
    repo: AutomationRuleRepository,
    executor: Arc<ActionExecutor>,
    id_gen: IdGenerator,
}

impl AutomationService {
    /// Create a new automation service.
    #[must_use]
    pub const fn new(repo: AutomationRuleRepository, executor: Arc<ActionExecutor>) -> Self {
        Self {
            repo,
            executor,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a rule.
    pub async fn create_rule(
        &self,
        user_id: &str,
        input: CreateRuleInput,
    ) -> AppResult<automation_rule::Model> {
        input.validate()?;
        let model = automation_rule::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            name: Set(input.name),
            enabled: Set(input.enabled),
            trigger_json: Set(serde_json::to_value(&input.trigger)
                .map_err(|e| AppError::Internal(e.to_string()))?),
            actions_json: Set(serde_json::to_value(&input.actions)
                .map_err(|e| AppError::Internal(e.to_string()))?),
            created_at: Set(Utc::now().into()),
            last_triggered_at: Set(None),
            trigger_count: Set(0),
            deleted_at: Set(None),
        };
        self.repo.create(model).await
    }

    /// Update a rule owned by the user.
    pub async fn update_rule(
        &self,
        user_id: &str,
        rule_id: &str,
        input: UpdateRuleInput,
    ) -> AppResult<automation_rule::Model> {
        input.validate()?;
        let rule = self.find_owned(user_id, rule_id).await?;
        let mut active: automation_rule::ActiveModel = rule.into();

        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(enabled) = input.enabled {
            active.enabled = Set(enabled);
        }
        if let Some(trigger) = input.trigger {
            active.trigger_json = Set(
                serde_json::to_value(&trigger).map_err(|e| AppError::Internal(e.to_string()))?
            );
        }
        if let Some(actions) = input.actions {
            active.actions_json = Set(
                serde_json::to_value(&actions).map_err(|e| AppError::Internal(e.to_string()))?
            );
        }

        self.repo.update(active).await
    }

    /// Soft-delete a rule owned by the user.
    pub async fn delete_rule(&self, user_id: &str, rule_id: &str) -> AppResult<()> {
        self.find_owned(user_id, rule_id).await?;
        self.repo.soft_delete(rule_id).await
    }

    /// List a user's rules.
    pub async fn list_rules(&self, user_id: &str) -> AppResult<Vec<automation_rule::Model>> {
        self.repo.find_by_user(user_id).await
    }

    /// Execute a rule's actions sequentially. Partial failure does not abort
    /// remaining actions, and the firing is recorded unconditionally: a rule
    /// "triggered" by reaching execution, not by unanimous success.
    pub async fn execute_rule(
        &self,
        rule: &automation_rule::Model,
        user_id: &str,
    ) -> AppResult<Vec<ActionResult>> {
        let actions: Vec<AutoAction> = serde_json::from_value(rule.actions_json.clone())
            .map_err(|e| AppError::Internal(format!("Malformed rule actions: {e}")))?;

        let mut results = Vec::with_capacity(actions.len());
        for action in &actions {
            let result = self
                .executor
                .execute(action.action, &action.params, user_id)
                .await;
            if !result.success {
                tracing::warn!(
                    rule_id = %rule.id,
                    action = %action.action,
                    message = %result.message,
                    "Automation rule action failed"
                );
            }
            results.push(result);
        }

        self.repo.record_firing(&rule.id).await?;
        Ok(results)
    }

    /// Evaluate every enabled rule of the event's user and execute matches.
    /// Returns the number of rules that fired.
    pub async fn handle_event(&self, event: &SystemEvent) -> AppResult<u64> {
        let user_id = event.user_id();
        let rules = self.repo.find_enabled_by_user(user_id).await?;
        let payload = event.to_payload();

        let mut fired = 0;
        for rule in &rules {
            let trigger: RuleTrigger = match serde_json::from_value(rule.trigger_json.clone()) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(rule_id = %rule.id, error = %e, "Malformed rule trigger, skipping");
                    continue;
                }
            };
            if !evaluate_rule(rule.enabled, &trigger, &payload) {
                continue;
            }
            self.execute_rule(rule, user_id).await?;
            fired += 1;
        }
        Ok(fired)
    }

    async fn find_owned(&self, user_id: &str, rule_id: &str) -> AppResult<automation_rule::Model> {
        let rule = self
            .repo
            .find_by_id(rule_id)
            .await?
            .ok_or_else(|| AppError::RuleNotFound(rule_id.to_string()))?;
        if rule.user_id != user_id {
            return Err(AppError::RuleNotFound(rule_id.to_string()));
        }
        Ok(rule)
    }
}
