//! Identity resolver: credentials or bearer tokens → concrete `Account`.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;

use showcase_core::{AccountId, Email};

use crate::error::{AuthError, LookupError};
use crate::password::{hash_password, verify_password};
use crate::token::TokenService;
use crate::Account;

/// Point lookups the persistence layer must provide.
///
/// Neither method filters on `is_active`; callers decide.
#[async_trait]
pub trait AccountLookup: Send + Sync {
    async fn find_account_by_email(&self, email: &Email) -> Result<Option<Account>, LookupError>;
    async fn find_account_by_id(&self, id: AccountId) -> Result<Option<Account>, LookupError>;
}

#[async_trait]
impl<S> AccountLookup for Arc<S>
where
    S: AccountLookup + ?Sized,
{
    async fn find_account_by_email(&self, email: &Email) -> Result<Option<Account>, LookupError> {
        (**self).find_account_by_email(email).await
    }

    async fn find_account_by_id(&self, id: AccountId) -> Result<Option<Account>, LookupError> {
        (**self).find_account_by_id(id).await
    }
}

/// Verified against when no account matches, so "no such email" costs the
/// same Argon2 work as "wrong password".
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("showcase-timing-equalizer").ok());

fn burn_verification(password: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
}

pub struct IdentityResolver<L> {
    lookup: L,
    tokens: Arc<TokenService>,
}

impl<L: AccountLookup> IdentityResolver<L> {
    pub fn new(lookup: L, tokens: Arc<TokenService>) -> Self {
        Self { lookup, tokens }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Single lookup by email; no active/role filtering.
    pub async fn resolve_by_email(&self, email: &Email) -> Result<Account, AuthError> {
        self.lookup
            .find_account_by_email(email)
            .await?
            .ok_or(AuthError::NotFound)
    }

    /// Single lookup by id; no active/role filtering.
    pub async fn resolve_by_id(&self, id: AccountId) -> Result<Account, AuthError> {
        self.lookup
            .find_account_by_id(id)
            .await?
            .ok_or(AuthError::NotFound)
    }

    /// Password login.
    ///
    /// Returns `Ok(None)` for an unknown email, a wrong password and an
    /// inactive account alike; the caller cannot tell which.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Account>, LookupError> {
        let Ok(email) = Email::parse(email) else {
            burn_verification(password);
            return Ok(None);
        };

        let Some(account) = self.lookup.find_account_by_email(&email).await? else {
            burn_verification(password);
            return Ok(None);
        };

        let verified = verify_password(password, &account.password_hash);
        if verified && account.is_active {
            Ok(Some(account))
        } else {
            Ok(None)
        }
    }

    /// `authenticate` with the miss folded into `InvalidCredentials`.
    pub async fn login(&self, email: &str, password: &str) -> Result<Account, AuthError> {
        match self.authenticate(email, password).await? {
            Some(account) => Ok(account),
            None => {
                tracing::info!("login rejected");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Bearer token → acting account.
    ///
    /// A token whose subject no longer exists or is deactivated is treated
    /// exactly like a forged one.
    pub async fn resolve_bearer(&self, token: &str) -> Result<Account, AuthError> {
        let subject = self.tokens.validate(token)?;
        let email = Email::parse(&subject).map_err(|_| AuthError::InvalidToken)?;

        match self.lookup.find_account_by_email(&email).await? {
            Some(account) if account.is_active => Ok(account),
            _ => Err(AuthError::InvalidToken),
        }
    }
}
