pub mod config;
pub mod domain;
pub mod errors;
pub mod id;
pub mod matching;

pub use domain::alert::{Alert, AlertId, NewAlert};
pub use domain::call::{Call, CallId, NewCall};
pub use domain::rule::{NewRule, Rule, RuleId, RuleUpdate};
pub use errors::DomainError;
pub use matching::{match_rules, RuleMatch};
