//! Store boundaries used by the HTTP layer.
//!
//! Every method is a single point operation; callers never see a session or
//! transaction. Soft-deleted rows read as absent except through
//! `AccountLookup`, which returns inactive accounts so the identity core can
//! make that call itself.

pub mod in_memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use showcase_auth::{Account, AccountLookup, LookupError, ProfilePatch};
use showcase_core::{AccountId, ImageId, ProductId};
use showcase_products::{Product, ProductImage, ProductPatch};

pub use in_memory::{InMemoryAccountStore, InMemoryImageStore, InMemoryProductStore};
pub use postgres::{PgAccountStore, PgImageStore, PgProductStore};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint would be violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// No active row with that id.
    #[error("not found")]
    NotFound,

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for LookupError {
    fn from(value: StoreError) -> Self {
        LookupError(value.to_string())
    }
}

#[async_trait]
pub trait AccountStore: AccountLookup {
    /// Fails with `Conflict` when the email is already registered.
    async fn insert(&self, account: Account) -> Result<Account, StoreError>;

    /// Active accounts only; returns the updated snapshot.
    async fn update_profile(&self, id: AccountId, patch: &ProfilePatch) -> Result<Account, StoreError>;

    /// Soft delete. Active accounts only.
    async fn deactivate(&self, id: AccountId) -> Result<AccountId, StoreError>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert(&self, product: Product) -> Result<Product, StoreError>;

    /// Active products only.
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    async fn update(&self, id: ProductId, patch: &ProductPatch) -> Result<Product, StoreError>;

    /// Soft delete. Active products only.
    async fn deactivate(&self, id: ProductId) -> Result<ProductId, StoreError>;

    /// Active products of one owner, oldest first.
    async fn list_by_owner(&self, owner_id: AccountId) -> Result<Vec<Product>, StoreError>;
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn insert(&self, image: ProductImage) -> Result<ProductImage, StoreError>;

    async fn find_by_id(&self, id: ImageId) -> Result<Option<ProductImage>, StoreError>;

    /// Oldest first.
    async fn list_for_product(&self, product_id: ProductId) -> Result<Vec<ProductImage>, StoreError>;

    async fn delete(&self, id: ImageId) -> Result<ImageId, StoreError>;
}
