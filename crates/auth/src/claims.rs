use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bearer token claims.
///
/// Timestamps are integer UNIX seconds (JWT NumericDate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the account email.
    pub sub: String,

    /// Issued-at.
    pub iat: i64,

    /// Expiration.
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,

    #[error("token subject is missing")]
    MissingSubject,
}

/// Deterministically validate decoded claims against `now`.
///
/// `exp` is the first second at which the token is no longer valid: a token
/// checked at exactly `exp` is expired. Combined with whole-second lifetimes
/// this gives a token issued for `d` seconds exactly `d` seconds of validity.
///
/// Signature verification happens before this, in `TokenService::validate`.
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.sub.trim().is_empty() {
        return Err(TokenValidationError::MissingSubject);
    }
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now.timestamp() >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn claims(iat: i64, exp: i64) -> TokenClaims {
        TokenClaims {
            sub: "ann@example.com".into(),
            iat,
            exp,
        }
    }

    #[test]
    fn valid_inside_window() {
        assert_eq!(validate_claims(&claims(100, 160), at(159)), Ok(()));
    }

    #[test]
    fn expired_at_exact_expiry() {
        assert_eq!(
            validate_claims(&claims(100, 160), at(160)),
            Err(TokenValidationError::Expired)
        );
    }

    #[test]
    fn inverted_window_is_rejected() {
        assert_eq!(
            validate_claims(&claims(160, 160), at(100)),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }

    #[test]
    fn blank_subject_is_rejected() {
        let mut c = claims(100, 160);
        c.sub = "  ".into();
        assert_eq!(validate_claims(&c, at(120)), Err(TokenValidationError::MissingSubject));
    }
}
