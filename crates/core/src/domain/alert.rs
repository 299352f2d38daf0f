use serde::{Deserialize, Serialize};

use crate::domain::call::CallId;
use crate::domain::rule::RuleId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertId(pub String);

/// A record linking a matching rule to a call, with the keywords that
/// triggered it. Immutable once created; `created_at` is server-assigned.
///
/// Wire field names stay camelCase for compatibility with the legacy API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: AlertId,
    pub rule_id: RuleId,
    pub call_id: CallId,
    pub created_at: String,
    pub matched_keywords: Vec<String>,
}

/// Alert input produced by the matching engine; the alert store assigns the
/// id and timestamp. `matched_keywords` is always a non-empty subsequence of
/// the referenced rule's keywords.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAlert {
    pub rule_id: RuleId,
    pub call_id: CallId,
    pub matched_keywords: Vec<String>,
}
