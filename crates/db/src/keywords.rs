//! Codec for keyword lists stored in a single TEXT column.
//!
//! Format: a JSON array of strings, e.g. `["help","emergency"]`. Order is
//! preserved on both sides. Both rule keyword sets and alert matched-keyword
//! lists go through this pair; nothing else in the crate touches the raw
//! column value.

pub fn encode(keywords: &[String]) -> Result<String, serde_json::Error> {
    serde_json::to_string(keywords)
}

pub fn decode(raw: &str) -> Result<Vec<String>, serde_json::Error> {
    serde_json::from_str(raw)
}
