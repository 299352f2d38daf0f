//! Entity id generation.
//!
//! Ids are uuid-v4 strings prefixed by entity kind (`rule_`, `call_`,
//! `alert_`) so a bare id in a log line or a foreign-key column is
//! self-describing.

use uuid::Uuid;

pub fn rule_id() -> String {
    format!("rule_{}", Uuid::new_v4())
}

pub fn call_id() -> String {
    format!("call_{}", Uuid::new_v4())
}

pub fn alert_id() -> String {
    format!("alert_{}", Uuid::new_v4())
}
