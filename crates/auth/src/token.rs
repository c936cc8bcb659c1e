//! Token issuer/validator: signed, time-bounded bearer credentials.
//!
//! Keys, algorithm and lifetime are fixed at construction (`TokenConfig`) and
//! never rotated within a process. Time comes from an injected `Clock`.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Deserialize;
use thiserror::Error;

use crate::claims::{validate_claims, TokenClaims, TokenValidationError};
use crate::error::AuthError;

/// Source of "now" for issuance and expiry checks.
pub trait Clock: Send + Sync + core::fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests.
#[derive(Debug)]
pub struct FixedClock(RwLock<DateTime<Utc>>);

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(RwLock::new(at))
    }

    pub fn set(&self, at: DateTime<Utc>) {
        if let Ok(mut now) = self.0.write() {
            *now = at;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.0.write() {
            *now += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.0.read() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("unsupported signing algorithm '{0}' (expected HS256, HS384 or HS512)")]
    UnsupportedAlgorithm(String),

    #[error("signing secret must not be empty")]
    EmptySecret,

    #[error("token lifetime must be at least one second")]
    LifetimeTooShort,

    #[error("token encoding failed: {0}")]
    Encode(String),
}

/// Process-wide token settings.
#[derive(Clone)]
pub struct TokenConfig {
    secret: Vec<u8>,
    algorithm: Algorithm,
    lifetime: Duration,
}

impl TokenConfig {
    pub fn new(
        secret: impl Into<Vec<u8>>,
        algorithm: &str,
        lifetime: Duration,
    ) -> Result<Self, TokenError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }

        let algorithm = match algorithm.trim().to_ascii_uppercase().as_str() {
            "HS256" => Algorithm::HS256,
            "HS384" => Algorithm::HS384,
            "HS512" => Algorithm::HS512,
            _ => return Err(TokenError::UnsupportedAlgorithm(algorithm.to_string())),
        };

        if lifetime.num_seconds() < 1 {
            return Err(TokenError::LifetimeTooShort);
        }

        Ok(Self {
            secret,
            algorithm,
            lifetime,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }
}

impl core::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

/// Shape accepted on decode; every field optional so a missing claim is
/// reported as an invalid token rather than a deserializer error string.
#[derive(Debug, Deserialize)]
struct RawClaims {
    sub: Option<String>,
    iat: Option<i64>,
    exp: Option<i64>,
}

pub struct TokenService {
    config: TokenConfig,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(config: TokenConfig, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(config.algorithm);
        // Expiry is checked in `validate_claims` against the injected clock.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(&config.secret),
            decoding: DecodingKey::from_secret(&config.secret),
            validation,
            config,
            clock,
        }
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Mint a token for `subject` valid for `lifetime` (whole seconds).
    pub fn issue(&self, subject: &str, lifetime: Duration) -> Result<String, TokenError> {
        let secs = lifetime.num_seconds();
        if secs < 1 {
            return Err(TokenError::LifetimeTooShort);
        }

        let iat = self.clock.now().timestamp();
        let claims = TokenClaims {
            sub: subject.to_string(),
            iat,
            exp: iat + secs,
        };

        jsonwebtoken::encode(&Header::new(self.config.algorithm), &claims, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Mint a token with the configured lifetime.
    pub fn issue_default(&self, subject: &str) -> Result<String, TokenError> {
        self.issue(subject, self.config.lifetime)
    }

    /// Verify signature and time window, returning the subject.
    ///
    /// Fails with `ExpiredToken` only for an authentic token past its expiry;
    /// every other defect is `InvalidToken`.
    pub fn validate(&self, token: &str) -> Result<String, AuthError> {
        let data = jsonwebtoken::decode::<RawClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| {
                tracing::debug!(reason = %e, "bearer token rejected");
                AuthError::InvalidToken
            })?;

        let (Some(sub), Some(iat), Some(exp)) = (data.claims.sub, data.claims.iat, data.claims.exp)
        else {
            tracing::debug!("bearer token missing required claims");
            return Err(AuthError::InvalidToken);
        };

        let claims = TokenClaims { sub, iat, exp };
        match validate_claims(&claims, self.clock.now()) {
            Ok(()) => Ok(claims.sub),
            Err(TokenValidationError::Expired) => Err(AuthError::ExpiredToken),
            Err(e) => {
                tracing::debug!(reason = %e, "bearer token rejected");
                Err(AuthError::InvalidToken)
            }
        }
    }
}

impl core::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenService")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn service(secret: &str) -> (TokenService, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(start()));
        let config = TokenConfig::new(secret, "HS256", Duration::minutes(30)).unwrap();
        (TokenService::new(config, clock.clone()), clock)
    }

    /// Flip one character in the middle of the given JWT segment.
    fn tamper(token: &str, segment: usize) -> String {
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let seg = &mut parts[segment];
        let mid = seg.len() / 2;
        let replacement = if &seg[mid..=mid] == "A" { "B" } else { "A" };
        seg.replace_range(mid..=mid, replacement);
        parts.join(".")
    }

    #[test]
    fn config_rejects_non_hmac_algorithms() {
        let err = TokenConfig::new("s", "RS256", Duration::minutes(1)).unwrap_err();
        assert_eq!(err, TokenError::UnsupportedAlgorithm("RS256".into()));
    }

    #[test]
    fn config_rejects_empty_secret_and_short_lifetime() {
        assert_eq!(
            TokenConfig::new("", "HS256", Duration::minutes(1)).unwrap_err(),
            TokenError::EmptySecret
        );
        assert_eq!(
            TokenConfig::new("s", "HS256", Duration::milliseconds(500)).unwrap_err(),
            TokenError::LifetimeTooShort
        );
    }

    #[test]
    fn config_debug_redacts_secret() {
        let config = TokenConfig::new("super-secret", "hs512", Duration::minutes(1)).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert_eq!(config.algorithm(), Algorithm::HS512);
    }

    #[test]
    fn issued_token_validates_to_subject() {
        let (svc, _clock) = service("k");
        let token = svc.issue_default("ann@example.com").unwrap();
        assert_eq!(svc.validate(&token).unwrap(), "ann@example.com");
    }

    #[test]
    fn token_expires_once_lifetime_elapsed() {
        let (svc, clock) = service("k");
        let token = svc.issue("ann@example.com", Duration::seconds(90)).unwrap();

        clock.advance(Duration::seconds(89));
        assert!(svc.validate(&token).is_ok());

        clock.advance(Duration::seconds(1));
        assert_eq!(svc.validate(&token), Err(AuthError::ExpiredToken));
    }

    #[test]
    fn tampered_payload_or_signature_is_invalid() {
        let (svc, _clock) = service("k");
        let token = svc.issue_default("ann@example.com").unwrap();

        assert_eq!(svc.validate(&tamper(&token, 1)), Err(AuthError::InvalidToken));
        assert_eq!(svc.validate(&tamper(&token, 2)), Err(AuthError::InvalidToken));
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let (issuer, _) = service("one");
        let (validator, _) = service("two");
        let token = issuer.issue_default("ann@example.com").unwrap();
        assert_eq!(validator.validate(&token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn tampered_expired_token_reports_invalid_not_expired() {
        let (svc, clock) = service("k");
        let token = svc.issue("ann@example.com", Duration::seconds(10)).unwrap();
        clock.advance(Duration::hours(1));
        assert_eq!(svc.validate(&tamper(&token, 2)), Err(AuthError::InvalidToken));
    }

    #[test]
    fn token_without_subject_is_invalid() {
        let (svc, _clock) = service("k");
        let iat = start().timestamp();
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({ "iat": iat, "exp": iat + 60 }),
            &EncodingKey::from_secret(b"k"),
        )
        .unwrap();
        assert_eq!(svc.validate(&token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn garbage_is_invalid() {
        let (svc, _clock) = service("k");
        assert_eq!(svc.validate("not.a.jwt"), Err(AuthError::InvalidToken));
        assert_eq!(svc.validate(""), Err(AuthError::InvalidToken));
    }

    proptest! {
        #[test]
        fn round_trip_then_expiry(subject in "[a-z]{1,12}@[a-z]{1,8}\\.com", secs in 1i64..86_400) {
            let (svc, clock) = service("prop-secret");
            let token = svc.issue(&subject, Duration::seconds(secs)).unwrap();
            prop_assert_eq!(svc.validate(&token).unwrap(), subject);

            clock.advance(Duration::seconds(secs));
            prop_assert_eq!(svc.validate(&token), Err(AuthError::ExpiredToken));
        }
    }
}
