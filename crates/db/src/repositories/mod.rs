//! Repository traits over the three stores plus their SQL and in-memory
//! implementations.
//!
//! Inputs are validated in `callwatch-core` before they reach a repository;
//! the traits only report storage and decoding failures. Unknown ids are a
//! not-found signal (`Ok(None)`), never an error.

use async_trait::async_trait;
use thiserror::Error;

use callwatch_core::domain::alert::{Alert, NewAlert};
use callwatch_core::domain::call::{Call, CallId, NewCall};
use callwatch_core::domain::rule::{NewRule, Rule, RuleId, RuleUpdate};

pub mod alert;
pub mod call;
pub mod memory;
pub mod rule;

pub use alert::SqlAlertRepository;
pub use call::SqlCallRepository;
pub use memory::{InMemoryAlertRepository, InMemoryCallRepository, InMemoryRuleRepository};
pub use rule::SqlRuleRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait RuleRepository: Send + Sync {
    async fn create(&self, rule: NewRule) -> Result<Rule, RepositoryError>;

    /// Lists rules in storage (insertion) order, optionally restricted to
    /// enabled ones.
    async fn list(&self, only_enabled: bool) -> Result<Vec<Rule>, RepositoryError>;

    /// Applies only the supplied fields. An update with no fields returns
    /// the rule unchanged.
    async fn update(&self, id: &RuleId, update: RuleUpdate)
        -> Result<Option<Rule>, RepositoryError>;

    /// Flips `enabled`.
    async fn toggle(&self, id: &RuleId) -> Result<Option<Rule>, RepositoryError>;
}

#[async_trait]
pub trait CallRepository: Send + Sync {
    /// Persists a call, assigning its id.
    async fn save(&self, call: NewCall) -> Result<Call, RepositoryError>;

    async fn find_by_id(&self, id: &CallId) -> Result<Option<Call>, RepositoryError>;
}

/// Optional alert listing filters; AND semantics when both are supplied.
#[derive(Clone, Debug, Default)]
pub struct AlertFilter {
    pub rule_id: Option<RuleId>,
    pub call_id: Option<CallId>,
}

#[async_trait]
pub trait AlertRepository: Send + Sync {
    /// Persists a batch of alerts all-or-nothing, assigning ids and one
    /// shared server timestamp for the batch.
    async fn create_batch(&self, alerts: Vec<NewAlert>) -> Result<Vec<Alert>, RepositoryError>;

    async fn list(&self, filter: AlertFilter) -> Result<Vec<Alert>, RepositoryError>;
}
