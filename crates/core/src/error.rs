//! Input failures shared by every domain crate.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// A request that can never succeed as written.
///
/// Missing records and uniqueness clashes are storage outcomes and live in
/// `showcase-infra`; identity and permission failures live in `showcase-auth`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A field failed its format rule (name letters, empty patch, bad email).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A path or body identifier did not parse.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_keeps_the_reason() {
        let err = DomainError::validation("Name should contain only letters");
        assert_eq!(err.to_string(), "validation failed: Name should contain only letters");
        assert!(DomainError::invalid_id("ProductId: bad").to_string().contains("ProductId"));
    }
}
