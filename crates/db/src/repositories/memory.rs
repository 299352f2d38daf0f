//! In-memory repository implementations, used by workflow and handler tests
//! that do not need a real database. Storage order is insertion order, same
//! as the SQL implementations.

use chrono::Utc;
use tokio::sync::RwLock;

use callwatch_core::domain::alert::{Alert, AlertId, NewAlert};
use callwatch_core::domain::call::{Call, CallId, NewCall};
use callwatch_core::domain::rule::{NewRule, Rule, RuleId, RuleUpdate};
use callwatch_core::id;

use super::{
    AlertFilter, AlertRepository, CallRepository, RepositoryError, RuleRepository,
};

#[derive(Default)]
pub struct InMemoryRuleRepository {
    rules: RwLock<Vec<Rule>>,
}

#[async_trait::async_trait]
impl RuleRepository for InMemoryRuleRepository {
    async fn create(&self, rule: NewRule) -> Result<Rule, RepositoryError> {
        let created = Rule {
            id: RuleId(id::rule_id()),
            name: rule.name,
            keywords: rule.keywords,
            enabled: rule.enabled,
        };
        self.rules.write().await.push(created.clone());
        Ok(created)
    }

    async fn list(&self, only_enabled: bool) -> Result<Vec<Rule>, RepositoryError> {
        let rules = self.rules.read().await;
        Ok(rules.iter().filter(|rule| !only_enabled || rule.enabled).cloned().collect())
    }

    async fn update(
        &self,
        id: &RuleId,
        update: RuleUpdate,
    ) -> Result<Option<Rule>, RepositoryError> {
        let mut rules = self.rules.write().await;
        let Some(rule) = rules.iter_mut().find(|rule| &rule.id == id) else {
            return Ok(None);
        };
        update.apply(rule);
        Ok(Some(rule.clone()))
    }

    async fn toggle(&self, id: &RuleId) -> Result<Option<Rule>, RepositoryError> {
        let mut rules = self.rules.write().await;
        let Some(rule) = rules.iter_mut().find(|rule| &rule.id == id) else {
            return Ok(None);
        };
        rule.enabled = !rule.enabled;
        Ok(Some(rule.clone()))
    }
}

#[derive(Default)]
pub struct InMemoryCallRepository {
    calls: RwLock<Vec<Call>>,
}

impl InMemoryCallRepository {
    pub async fn count(&self) -> usize {
        self.calls.read().await.len()
    }
}

#[async_trait::async_trait]
impl CallRepository for InMemoryCallRepository {
    async fn save(&self, call: NewCall) -> Result<Call, RepositoryError> {
        let saved = Call {
            id: CallId(id::call_id()),
            timestamp: call.timestamp,
            phone: call.phone,
            location: call.location,
            transcript: call.transcript,
        };
        self.calls.write().await.push(saved.clone());
        Ok(saved)
    }

    async fn find_by_id(&self, id: &CallId) -> Result<Option<Call>, RepositoryError> {
        let calls = self.calls.read().await;
        Ok(calls.iter().find(|call| &call.id == id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryAlertRepository {
    alerts: RwLock<Vec<Alert>>,
}

#[async_trait::async_trait]
impl AlertRepository for InMemoryAlertRepository {
    async fn create_batch(&self, alerts: Vec<NewAlert>) -> Result<Vec<Alert>, RepositoryError> {
        if alerts.is_empty() {
            return Ok(Vec::new());
        }

        let created_at = Utc::now().to_rfc3339();
        let created: Vec<Alert> = alerts
            .into_iter()
            .map(|alert| Alert {
                id: AlertId(id::alert_id()),
                rule_id: alert.rule_id,
                call_id: alert.call_id,
                created_at: created_at.clone(),
                matched_keywords: alert.matched_keywords,
            })
            .collect();

        self.alerts.write().await.extend(created.clone());
        Ok(created)
    }

    async fn list(&self, filter: AlertFilter) -> Result<Vec<Alert>, RepositoryError> {
        let alerts = self.alerts.read().await;
        Ok(alerts
            .iter()
            .filter(|alert| {
                filter.rule_id.as_ref().map_or(true, |rule_id| &alert.rule_id == rule_id)
                    && filter.call_id.as_ref().map_or(true, |call_id| &alert.call_id == call_id)
            })
            .cloned()
            .collect())
    }
}
