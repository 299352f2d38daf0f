use thiserror::Error;

/// Failures raised by domain-level validation.
///
/// Not-found outcomes are signaled with `Option::None` at the repository
/// boundary rather than an error variant; storage failures live in the db
/// crate's `RepositoryError`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(String),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
