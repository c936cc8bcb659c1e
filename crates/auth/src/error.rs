//! Identity/authorization failures and their boundary projection.

use thiserror::Error;

/// Failure of the persistence collaborator during a lookup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("account lookup failed: {0}")]
pub struct LookupError(pub String);

/// Internal failure taxonomy.
///
/// Carries more detail than callers are allowed to see; cross the boundary
/// only through [`AuthError::at_boundary`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Login failed (unknown email, wrong password, or inactive account).
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid token")]
    InvalidToken,

    #[error("expired token")]
    ExpiredToken,

    #[error("forbidden")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// What a caller outside the core is allowed to learn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryError {
    InvalidCredentials,
    /// Any bearer-token failure ("could not validate credentials").
    Unauthorized,
    Forbidden,
    NotFound,
    Unavailable,
}

impl AuthError {
    /// Collapse internal causes into caller-visible outcomes.
    ///
    /// Invalid and expired tokens become the same `Unauthorized` so a caller
    /// cannot probe whether a forged token was otherwise well-formed.
    pub fn at_boundary(&self) -> BoundaryError {
        match self {
            AuthError::InvalidCredentials => BoundaryError::InvalidCredentials,
            AuthError::InvalidToken | AuthError::ExpiredToken => BoundaryError::Unauthorized,
            AuthError::Forbidden => BoundaryError::Forbidden,
            AuthError::NotFound => BoundaryError::NotFound,
            AuthError::Lookup(_) => BoundaryError::Unavailable,
        }
    }
}

impl BoundaryError {
    /// Caller-facing message; deliberately cause-free.
    pub fn message(&self) -> &'static str {
        match self {
            BoundaryError::InvalidCredentials => "Incorrect username or password",
            BoundaryError::Unauthorized => "Could not validate credentials",
            BoundaryError::Forbidden => "Forbidden.",
            BoundaryError::NotFound => "Not found.",
            BoundaryError::Unavailable => "Service temporarily unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_failures_are_indistinguishable_at_boundary() {
        let invalid = AuthError::InvalidToken.at_boundary();
        let expired = AuthError::ExpiredToken.at_boundary();
        assert_eq!(invalid, expired);
        assert_eq!(invalid.message(), expired.message());
        assert_eq!(invalid.message(), "Could not validate credentials");
    }

    #[test]
    fn other_outcomes_stay_distinct() {
        let outcomes = [
            AuthError::InvalidCredentials.at_boundary(),
            AuthError::InvalidToken.at_boundary(),
            AuthError::Forbidden.at_boundary(),
            AuthError::NotFound.at_boundary(),
        ];
        for (i, a) in outcomes.iter().enumerate() {
            for b in &outcomes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn lookup_failure_is_not_reported_as_auth_outcome() {
        let err = AuthError::from(LookupError("connection reset".into()));
        assert_eq!(err.at_boundary(), BoundaryError::Unavailable);
        assert!(!err.at_boundary().message().contains("connection"));
    }
}
