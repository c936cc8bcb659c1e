//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::Duration;
use thiserror::Error;

use showcase_auth::{TokenConfig, TokenError};

const DEV_SECRET_KEY: &str = "showcase-dev-secret-change-me";
const DEFAULT_ALGORITHM: &str = "HS256";
const DEFAULT_EXPIRE_MINUTES: i64 = 30;
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error(transparent)]
    Token(#[from] TokenError),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub token: TokenConfig,
    /// `None` selects the in-memory stores.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub upload_dir: PathBuf,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let secret = get("SECRET_KEY").unwrap_or_else(|| {
            tracing::warn!("SECRET_KEY not set; using insecure dev default");
            DEV_SECRET_KEY.to_string()
        });
        let algorithm = get("ALGORITHM").unwrap_or_else(|| DEFAULT_ALGORITHM.to_string());

        let minutes = match get("ACCESS_TOKEN_EXPIRE_MINUTES") {
            Some(raw) => parse_number::<i64>("ACCESS_TOKEN_EXPIRE_MINUTES", &raw)?,
            None => DEFAULT_EXPIRE_MINUTES,
        };
        if minutes <= 0 {
            return Err(ConfigError::Invalid {
                key: "ACCESS_TOKEN_EXPIRE_MINUTES",
                reason: "must be a positive number of minutes".to_string(),
            });
        }

        let lifetime = Duration::try_minutes(minutes).ok_or_else(|| ConfigError::Invalid {
            key: "ACCESS_TOKEN_EXPIRE_MINUTES",
            reason: format!("{minutes} minutes is out of range"),
        })?;
        let token = TokenConfig::new(secret.into_bytes(), &algorithm, lifetime)?;

        let db_max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => parse_number::<u32>("DATABASE_MAX_CONNECTIONS", &raw)?,
            None => DEFAULT_DB_MAX_CONNECTIONS,
        };

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = parse_number::<SocketAddr>("BIND_ADDR", &bind_raw)?;

        Ok(Self {
            token,
            database_url: get("DATABASE_URL"),
            db_max_connections,
            upload_dir: PathBuf::from(get("UPLOAD_DIR").unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string())),
            bind_addr,
        })
    }
}

fn parse_number<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = config_from(&[]).unwrap();
        assert_eq!(cfg.token.lifetime(), Duration::minutes(30));
        assert_eq!(cfg.token.algorithm(), jsonwebtoken::Algorithm::HS256);
        assert_eq!(cfg.database_url, None);
        assert_eq!(cfg.upload_dir, PathBuf::from("uploads"));
        assert_eq!(cfg.bind_addr.port(), 8000);
    }

    #[test]
    fn explicit_values_are_used() {
        let cfg = config_from(&[
            ("SECRET_KEY", "s3cret"),
            ("ALGORITHM", "HS512"),
            ("ACCESS_TOKEN_EXPIRE_MINUTES", "5"),
            ("DATABASE_URL", "postgres://localhost/showcase"),
            ("UPLOAD_DIR", "/tmp/up"),
            ("BIND_ADDR", "127.0.0.1:9000"),
        ])
        .unwrap();
        assert_eq!(cfg.token.lifetime(), Duration::minutes(5));
        assert_eq!(cfg.token.algorithm(), jsonwebtoken::Algorithm::HS512);
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/showcase"));
        assert_eq!(cfg.bind_addr.port(), 9000);
    }

    #[test]
    fn empty_database_url_means_in_memory() {
        let cfg = config_from(&[("DATABASE_URL", "  ")]).unwrap();
        assert_eq!(cfg.database_url, None);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            config_from(&[("ACCESS_TOKEN_EXPIRE_MINUTES", "soon")]),
            Err(ConfigError::Invalid { key: "ACCESS_TOKEN_EXPIRE_MINUTES", .. })
        ));
        assert!(matches!(
            config_from(&[("ACCESS_TOKEN_EXPIRE_MINUTES", "0")]),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            config_from(&[("ALGORITHM", "RS256")]),
            Err(ConfigError::Token(TokenError::UnsupportedAlgorithm(_)))
        ));
        assert!(matches!(config_from(&[("BIND_ADDR", "nowhere")]), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn huge_token_lifetime_is_an_error_not_a_panic() {
        let huge = i64::MAX.to_string();
        assert!(matches!(
            config_from(&[("ACCESS_TOKEN_EXPIRE_MINUTES", huge.as_str())]),
            Err(ConfigError::Invalid { key: "ACCESS_TOKEN_EXPIRE_MINUTES", .. })
        ));
    }
}
