//! Ingestion workflow: persist the call, match it against enabled rules,
//! persist the resulting alerts, and return both.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use callwatch_core::domain::alert::{Alert, NewAlert};
use callwatch_core::domain::call::{Call, NewCall};
use callwatch_core::errors::DomainError;
use callwatch_core::matching;
use callwatch_db::repositories::{
    AlertRepository, CallRepository, RepositoryError, RuleRepository,
};

/// The combined result of one ingestion: the stored call and the alerts it
/// produced, in matching order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
    pub call: Call,
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error("storage failure: {0}")]
    Repository(#[from] RepositoryError),
}

/// Process-scoped record of completed keyed ingestions. Entries live for the
/// lifetime of the process; replay safety is not durable across restarts.
#[derive(Clone, Default)]
pub struct IdempotencyStore {
    outcomes: Arc<Mutex<HashMap<String, IngestOutcome>>>,
}

pub struct IngestionService {
    calls: Arc<dyn CallRepository>,
    rules: Arc<dyn RuleRepository>,
    alerts: Arc<dyn AlertRepository>,
    idempotency: IdempotencyStore,
}

impl IngestionService {
    pub fn new(
        calls: Arc<dyn CallRepository>,
        rules: Arc<dyn RuleRepository>,
        alerts: Arc<dyn AlertRepository>,
    ) -> Self {
        Self::with_idempotency(calls, rules, alerts, IdempotencyStore::default())
    }

    pub fn with_idempotency(
        calls: Arc<dyn CallRepository>,
        rules: Arc<dyn RuleRepository>,
        alerts: Arc<dyn AlertRepository>,
        idempotency: IdempotencyStore,
    ) -> Self {
        Self { calls, rules, alerts, idempotency }
    }

    /// Runs the workflow. When `idempotency_key` was already seen, the
    /// recorded outcome is returned verbatim and nothing is re-persisted or
    /// re-matched. Keyed submissions hold the store lock across the
    /// workflow, so two concurrent requests carrying the same key cannot
    /// both execute it.
    pub async fn ingest(
        &self,
        call: NewCall,
        idempotency_key: Option<String>,
    ) -> Result<IngestOutcome, IngestError> {
        call.validate()?;

        let Some(key) = idempotency_key else {
            return self.run(call).await;
        };

        let mut outcomes = self.idempotency.outcomes.lock().await;
        if let Some(outcome) = outcomes.get(&key) {
            info!(
                event_name = "ingest.replayed",
                call_id = %outcome.call.id.0,
                "replaying recorded outcome for repeated idempotency key"
            );
            return Ok(outcome.clone());
        }

        let outcome = self.run(call).await?;
        outcomes.insert(key, outcome.clone());
        Ok(outcome)
    }

    async fn run(&self, call: NewCall) -> Result<IngestOutcome, IngestError> {
        let call = self.calls.save(call).await?;

        let enabled_rules = self.rules.list(true).await?;
        let matches = matching::match_rules(&call.transcript, &enabled_rules);

        let batch: Vec<NewAlert> = matches
            .into_iter()
            .map(|hit| NewAlert {
                rule_id: hit.rule_id,
                call_id: call.id.clone(),
                matched_keywords: hit.matched_keywords,
            })
            .collect();

        let alerts = self.alerts.create_batch(batch).await?;

        info!(
            event_name = "ingest.completed",
            call_id = %call.id.0,
            alert_count = alerts.len(),
            "call ingested and matched"
        );

        Ok(IngestOutcome { call, alerts })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use callwatch_core::domain::call::NewCall;
    use callwatch_core::domain::rule::NewRule;
    use callwatch_db::repositories::{
        AlertFilter, AlertRepository, InMemoryAlertRepository, InMemoryCallRepository,
        InMemoryRuleRepository, RuleRepository,
    };

    use super::{IngestError, IngestionService};

    struct Fixture {
        calls: Arc<InMemoryCallRepository>,
        rules: Arc<InMemoryRuleRepository>,
        alerts: Arc<InMemoryAlertRepository>,
        service: IngestionService,
    }

    fn fixture() -> Fixture {
        let calls = Arc::new(InMemoryCallRepository::default());
        let rules = Arc::new(InMemoryRuleRepository::default());
        let alerts = Arc::new(InMemoryAlertRepository::default());
        let service =
            IngestionService::new(calls.clone(), rules.clone(), alerts.clone());
        Fixture { calls, rules, alerts, service }
    }

    fn call(transcript: &str) -> NewCall {
        NewCall {
            timestamp: "2026-08-30T10:00:00Z".to_string(),
            phone: "+15550100".to_string(),
            location: "Sector 7".to_string(),
            transcript: transcript.to_string(),
        }
    }

    async fn add_rule(fixture: &Fixture, name: &str, keywords: &[&str], enabled: bool) {
        fixture
            .rules
            .create(NewRule {
                name: name.to_string(),
                keywords: keywords.iter().map(ToString::to_string).collect(),
                enabled,
            })
            .await
            .expect("create rule");
    }

    #[tokio::test]
    async fn matching_rule_produces_an_alert_with_the_hit_keywords() {
        let fixture = fixture();
        add_rule(&fixture, "distress", &["help", "emergency"], true).await;

        let outcome =
            fixture.service.ingest(call("please send help now"), None).await.expect("ingest");

        assert_eq!(outcome.alerts.len(), 1);
        assert_eq!(outcome.alerts[0].matched_keywords, vec!["help"]);
        assert_eq!(outcome.alerts[0].call_id, outcome.call.id);
    }

    #[tokio::test]
    async fn disabled_rules_are_never_consulted() {
        let fixture = fixture();
        add_rule(&fixture, "distress", &["help"], false).await;

        let outcome = fixture.service.ingest(call("help help help"), None).await.expect("ingest");

        assert!(outcome.alerts.is_empty());
        let stored = fixture.alerts.list(AlertFilter::default()).await.expect("list");
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn blank_required_field_fails_validation_before_any_side_effect() {
        let fixture = fixture();
        add_rule(&fixture, "distress", &["help"], true).await;

        let result = fixture.service.ingest(call(" "), None).await;

        assert!(matches!(result, Err(IngestError::Validation(_))));
        assert_eq!(fixture.calls.count().await, 0);
    }

    #[tokio::test]
    async fn repeated_key_replays_the_recorded_outcome_without_new_rows() {
        let fixture = fixture();
        add_rule(&fixture, "distress", &["help"], true).await;

        let first = fixture
            .service
            .ingest(call("please send help now"), Some("key-1".to_string()))
            .await
            .expect("first ingest");
        let second = fixture
            .service
            .ingest(call("please send help now"), Some("key-1".to_string()))
            .await
            .expect("replayed ingest");

        assert_eq!(first, second);
        assert_eq!(fixture.calls.count().await, 1);
        let stored = fixture.alerts.list(AlertFilter::default()).await.expect("list");
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn distinct_keys_run_the_workflow_independently() {
        let fixture = fixture();

        fixture
            .service
            .ingest(call("first"), Some("key-1".to_string()))
            .await
            .expect("first ingest");
        fixture
            .service
            .ingest(call("second"), Some("key-2".to_string()))
            .await
            .expect("second ingest");

        assert_eq!(fixture.calls.count().await, 2);
    }

    #[tokio::test]
    async fn unkeyed_submissions_always_persist_a_new_call() {
        let fixture = fixture();

        fixture.service.ingest(call("one"), None).await.expect("first ingest");
        fixture.service.ingest(call("one"), None).await.expect("second ingest");

        assert_eq!(fixture.calls.count().await, 2);
    }
}
