//! Pure keyword matching over a supplied rule set.
//!
//! The engine never touches storage; the caller fetches the enabled rules
//! and hands them in. Matching is lowercase substring containment with no
//! word-boundary handling, so "cat" matches inside "category". That is a
//! known limitation preserved for compatibility with the legacy service,
//! not a bug.

use crate::domain::rule::{Rule, RuleId};

/// One matching rule and the keywords that fired, in the rule's keyword
/// order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleMatch {
    pub rule_id: RuleId,
    pub matched_keywords: Vec<String>,
}

/// Evaluates `rules` against `transcript` in input order. A rule contributes
/// a match only when at least one of its keywords occurs case-insensitively
/// in the transcript. Disabled rules are skipped.
pub fn match_rules(transcript: &str, rules: &[Rule]) -> Vec<RuleMatch> {
    let transcript = transcript.to_lowercase();

    rules
        .iter()
        .filter(|rule| rule.enabled)
        .filter_map(|rule| {
            let matched_keywords: Vec<String> = rule
                .keywords
                .iter()
                .filter(|keyword| transcript.contains(&keyword.to_lowercase()))
                .cloned()
                .collect();

            if matched_keywords.is_empty() {
                None
            } else {
                Some(RuleMatch { rule_id: rule.id.clone(), matched_keywords })
            }
        })
        .collect()
}
