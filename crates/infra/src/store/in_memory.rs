//! In-memory stores for tests/dev.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use showcase_auth::{Account, AccountLookup, LookupError, ProfilePatch};
use showcase_core::{AccountId, Email, ImageId, ProductId};
use showcase_products::{Product, ProductImage, ProductPatch};

use super::{AccountStore, ImageStore, ProductStore, StoreError};

fn poisoned() -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    inner: RwLock<HashMap<AccountId, Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountLookup for InMemoryAccountStore {
    async fn find_account_by_email(&self, email: &Email) -> Result<Option<Account>, LookupError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().find(|a| a.email == *email).cloned())
    }

    async fn find_account_by_id(&self, id: AccountId) -> Result<Option<Account>, LookupError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn insert(&self, account: Account) -> Result<Account, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.values().any(|a| a.email == account.email) {
            return Err(StoreError::Conflict(format!("email {} already registered", account.email)));
        }
        if map.contains_key(&account.id) {
            return Err(StoreError::Conflict(format!("account {} already exists", account.id)));
        }
        map.insert(account.id, account.clone());
        Ok(account)
    }

    async fn update_profile(&self, id: AccountId, patch: &ProfilePatch) -> Result<Account, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        match map.get_mut(&id) {
            Some(account) if account.is_active => {
                patch.apply(&mut account.profile);
                Ok(account.clone())
            }
            _ => Err(StoreError::NotFound),
        }
    }

    async fn deactivate(&self, id: AccountId) -> Result<AccountId, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        match map.get_mut(&id) {
            Some(account) if account.is_active => {
                account.is_active = false;
                Ok(id)
            }
            _ => Err(StoreError::NotFound),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    inner: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn insert(&self, product: Product) -> Result<Product, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.contains_key(&product.id) {
            return Err(StoreError::Conflict(format!("product {} already exists", product.id)));
        }
        map.insert(product.id, product.clone());
        Ok(product)
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).filter(|p| p.is_active).cloned())
    }

    async fn update(&self, id: ProductId, patch: &ProductPatch) -> Result<Product, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        match map.get_mut(&id) {
            Some(product) if product.is_active => {
                patch.apply(product);
                Ok(product.clone())
            }
            _ => Err(StoreError::NotFound),
        }
    }

    async fn deactivate(&self, id: ProductId) -> Result<ProductId, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        match map.get_mut(&id) {
            Some(product) if product.is_active => {
                product.is_active = false;
                Ok(id)
            }
            _ => Err(StoreError::NotFound),
        }
    }

    async fn list_by_owner(&self, owner_id: AccountId) -> Result<Vec<Product>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        let mut products: Vec<Product> = map
            .values()
            .filter(|p| p.is_active && p.owner_id == owner_id)
            .cloned()
            .collect();
        // UUIDv7 ids are time-ordered.
        products.sort_by_key(|p| p.id);
        Ok(products)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryImageStore {
    inner: RwLock<HashMap<ImageId, ProductImage>>,
}

impl InMemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    async fn insert(&self, image: ProductImage) -> Result<ProductImage, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.contains_key(&image.id) {
            return Err(StoreError::Conflict(format!("image {} already exists", image.id)));
        }
        map.insert(image.id, image.clone());
        Ok(image)
    }

    async fn find_by_id(&self, id: ImageId) -> Result<Option<ProductImage>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn list_for_product(&self, product_id: ProductId) -> Result<Vec<ProductImage>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        let mut images: Vec<ProductImage> = map
            .values()
            .filter(|i| i.product_id == product_id)
            .cloned()
            .collect();
        images.sort_by_key(|i| (i.created_at, i.id));
        Ok(images)
    }

    async fn delete(&self, id: ImageId) -> Result<ImageId, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.remove(&id).map(|_| id).ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use showcase_auth::{NewAccount, Profile};
    use showcase_products::{NewProduct, ProductDetails, ProductStatus};

    fn account(email: &str) -> Account {
        let profile = Profile {
            name: "Ann".into(),
            surname: "Lee".into(),
            ..Default::default()
        };
        let new = NewAccount::new(email, "pw".into(), profile).unwrap();
        Account::register(AccountId::new(), new, "hash".into())
    }

    fn product(owner: AccountId) -> Product {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let details = ProductDetails {
            name: "Skyward".into(),
            ..Default::default()
        };
        NewProduct::new(details, ProductStatus::default(), day, vec![])
            .unwrap()
            .into_product(ProductId::new(), owner, day)
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = InMemoryAccountStore::new();
        store.insert(account("ann@example.com")).await.unwrap();
        let err = store.insert(account("ANN@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn deactivated_account_is_still_visible_to_lookup_but_not_mutable() {
        let store = InMemoryAccountStore::new();
        let acc = store.insert(account("ann@example.com")).await.unwrap();

        assert_eq!(store.deactivate(acc.id).await, Ok(acc.id));
        assert_eq!(store.deactivate(acc.id).await, Err(StoreError::NotFound));

        let found = store.find_account_by_id(acc.id).await.unwrap().unwrap();
        assert!(!found.is_active);

        let patch = ProfilePatch {
            about: Some("hi".into()),
            ..Default::default()
        };
        assert_eq!(store.update_profile(acc.id, &patch).await, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn soft_deleted_product_reads_as_absent() {
        let store = InMemoryProductStore::new();
        let owner = AccountId::new();
        let p = store.insert(product(owner)).await.unwrap();

        store.deactivate(p.id).await.unwrap();
        assert_eq!(store.find_by_id(p.id).await, Ok(None));
        assert!(store.list_by_owner(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn images_are_listed_per_product() {
        let store = InMemoryImageStore::new();
        let pid = ProductId::new();
        for _ in 0..2 {
            store
                .insert(ProductImage {
                    id: ImageId::new(),
                    product_id: pid,
                    path: "uploads/x.png".into(),
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }
        let images = store.list_for_product(pid).await.unwrap();
        assert_eq!(images.len(), 2);

        store.delete(images[0].id).await.unwrap();
        assert_eq!(store.delete(images[0].id).await, Err(StoreError::NotFound));
        assert_eq!(store.list_for_product(pid).await.unwrap().len(), 1);
    }
}
