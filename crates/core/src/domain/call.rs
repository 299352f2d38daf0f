use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(pub String);

/// An ingested call record. Immutable after creation. The `timestamp` is
/// caller-supplied and treated as an opaque string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub id: CallId,
    pub timestamp: String,
    pub phone: String,
    pub location: String,
    pub transcript: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct NewCall {
    pub timestamp: String,
    pub phone: String,
    pub location: String,
    pub transcript: String,
}

impl NewCall {
    pub fn validate(&self) -> Result<(), DomainError> {
        for (field, value) in [
            ("timestamp", &self.timestamp),
            ("phone", &self.phone),
            ("location", &self.location),
            ("transcript", &self.transcript),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::validation(format!("missing required field: {field}")));
            }
        }
        Ok(())
    }
}
