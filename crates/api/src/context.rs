use showcase_auth::Account;
use showcase_core::AccountId;

/// The authenticated actor for a request.
///
/// Inserted by the auth middleware; present on every protected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentAccount(Account);

impl CurrentAccount {
    pub fn new(account: Account) -> Self {
        Self(account)
    }

    pub fn id(&self) -> AccountId {
        self.0.id
    }

    pub fn account(&self) -> &Account {
        &self.0
    }
}
