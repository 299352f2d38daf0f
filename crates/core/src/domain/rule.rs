use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(pub String);

/// A named, toggleable set of keywords used to flag calls. Keyword order is
/// preserved; matching reports matched keywords in this order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub name: String,
    pub keywords: Vec<String>,
    pub enabled: bool,
}

/// Input for rule creation. `validate` must pass before the rule reaches
/// storage.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct NewRule {
    pub name: String,
    pub keywords: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl NewRule {
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_keywords(&self.keywords)
    }
}

/// Partial update for a rule: only supplied fields are applied. Omitting
/// `keywords` is allowed, emptying it is not.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct RuleUpdate {
    pub name: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub enabled: Option<bool>,
}

impl RuleUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.keywords.is_none() && self.enabled.is_none()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(keywords) = &self.keywords {
            validate_keywords(keywords)?;
        }
        Ok(())
    }

    pub fn apply(&self, rule: &mut Rule) {
        if let Some(name) = &self.name {
            rule.name = name.clone();
        }
        if let Some(keywords) = &self.keywords {
            rule.keywords = keywords.clone();
        }
        if let Some(enabled) = self.enabled {
            rule.enabled = enabled;
        }
    }
}

fn validate_keywords(keywords: &[String]) -> Result<(), DomainError> {
    if keywords.is_empty() {
        return Err(DomainError::validation("keywords must contain at least one entry"));
    }
    if keywords.iter().any(|keyword| keyword.trim().is_empty()) {
        return Err(DomainError::validation("keywords must not contain blank entries"));
    }
    Ok(())
}
