//! Service wiring: stores, identity resolver and the operations the routes
//! call. Every mutating operation resolves its target before asking the
//! policy, so a missing target is a 404 even for an unauthorized actor.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tokio::io::AsyncWriteExt;

use showcase_auth::{
    can_modify_resource, explain_account_modification, hash_password, Account, AuthError,
    Decision, IdentityResolver, NewAccount, ProfilePatch, SystemClock, TokenService,
};
use showcase_core::{AccountId, DomainError, ImageId, ProductId};
use showcase_infra::{
    db, AccountStore, ImageStore, InMemoryAccountStore, InMemoryImageStore, InMemoryProductStore,
    PgAccountStore, PgImageStore, PgProductStore, ProductStore, StoreError,
};
use showcase_products::{image_filename, NewProduct, Product, ProductImage, ProductPatch};

use crate::app::errors::ApiError;
use crate::config::AppConfig;

/// A file received in an upload batch.
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

pub struct AppServices {
    pub accounts: Arc<dyn AccountStore>,
    pub products: Arc<dyn ProductStore>,
    pub images: Arc<dyn ImageStore>,
    pub identity: IdentityResolver<Arc<dyn AccountStore>>,
    pub upload_dir: PathBuf,
}

impl AppServices {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        products: Arc<dyn ProductStore>,
        images: Arc<dyn ImageStore>,
        tokens: Arc<TokenService>,
        upload_dir: PathBuf,
    ) -> Self {
        let identity = IdentityResolver::new(accounts.clone(), tokens);
        Self {
            accounts,
            products,
            images,
            identity,
            upload_dir,
        }
    }

    pub fn in_memory(tokens: Arc<TokenService>, upload_dir: PathBuf) -> Self {
        Self::new(
            Arc::new(InMemoryAccountStore::new()),
            Arc::new(InMemoryProductStore::new()),
            Arc::new(InMemoryImageStore::new()),
            tokens,
            upload_dir,
        )
    }

    pub fn postgres(pool: PgPool, tokens: Arc<TokenService>, upload_dir: PathBuf) -> Self {
        Self::new(
            Arc::new(PgAccountStore::new(pool.clone())),
            Arc::new(PgProductStore::new(pool.clone())),
            Arc::new(PgImageStore::new(pool)),
            tokens,
            upload_dir,
        )
    }

    pub fn tokens(&self) -> &TokenService {
        self.identity.tokens()
    }

    // -------------------------
    // Accounts
    // -------------------------

    pub async fn register(&self, new: NewAccount) -> Result<Account, ApiError> {
        let hash = hash_password(&new.password)?;
        let account = Account::register(AccountId::new(), new, hash);
        let account = self.accounts.insert(account).await?;
        tracing::info!(account_id = %account.id, "account registered");
        Ok(account)
    }

    /// Active account or `NotFound`.
    pub async fn active_account(&self, id: AccountId) -> Result<Account, ApiError> {
        match self.identity.resolve_by_id(id).await {
            Ok(account) if account.is_active => Ok(account),
            Ok(_) => Err(AuthError::NotFound.into()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn update_account(
        &self,
        target_id: AccountId,
        patch: &ProfilePatch,
        actor: &Account,
    ) -> Result<Account, ApiError> {
        let target = self.active_account(target_id).await?;
        ensure_account_modifiable(&target, actor)?;
        patch.validate()?;
        Ok(self.accounts.update_profile(target.id, patch).await?)
    }

    pub async fn deactivate_account(&self, target_id: AccountId, actor: &Account) -> Result<AccountId, ApiError> {
        let target = self.active_account(target_id).await?;
        ensure_account_modifiable(&target, actor)?;
        let id = self.accounts.deactivate(target.id).await?;
        tracing::info!(account_id = %id, actor_id = %actor.id, "account deactivated");
        Ok(id)
    }

    // -------------------------
    // Products
    // -------------------------

    pub async fn create_product(&self, new: NewProduct, actor: &Account) -> Result<Product, ApiError> {
        let product = new.into_product(ProductId::new(), actor.id, Utc::now().date_naive());
        Ok(self.products.insert(product).await?)
    }

    pub async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
        self.products
            .find_by_id(id)
            .await?
            .ok_or(ApiError::Store(StoreError::NotFound))
    }

    pub async fn products_of(&self, owner_id: AccountId) -> Result<Vec<Product>, ApiError> {
        self.active_account(owner_id).await?;
        Ok(self.products.list_by_owner(owner_id).await?)
    }

    pub async fn update_product(
        &self,
        id: ProductId,
        patch: &ProductPatch,
        actor: &Account,
    ) -> Result<Product, ApiError> {
        let product = self.owned_product(id, actor).await?;
        patch.validate()?;
        Ok(self.products.update(product.id, patch).await?)
    }

    pub async fn deactivate_product(&self, id: ProductId, actor: &Account) -> Result<ProductId, ApiError> {
        let product = self.owned_product(id, actor).await?;
        Ok(self.products.deactivate(product.id).await?)
    }

    async fn owned_product(&self, id: ProductId, actor: &Account) -> Result<Product, ApiError> {
        let product = self.product(id).await?;
        ensure_resource_owner(&product, actor)?;
        Ok(product)
    }

    // -------------------------
    // Images
    // -------------------------

    pub async fn upload_images(
        &self,
        product_id: ProductId,
        files: Vec<UploadedFile>,
        actor: &Account,
    ) -> Result<Vec<ProductImage>, ApiError> {
        let product = self.owned_product(product_id, actor).await?;
        if files.is_empty() {
            return Err(DomainError::validation("at least one file in 'images' should be provided").into());
        }

        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| ApiError::Internal(format!("failed to create upload dir: {e}")))?;

        let now = Utc::now();
        let mut written = Vec::with_capacity(files.len());
        let mut stored = Vec::with_capacity(files.len());
        if let Err(e) = self
            .store_batch(product.id, files, now, &mut written, &mut stored)
            .await
        {
            self.rollback_batch(&written, &stored).await;
            return Err(e);
        }

        tracing::info!(product_id = %product.id, count = stored.len(), "images uploaded");
        Ok(stored)
    }

    async fn store_batch(
        &self,
        product_id: ProductId,
        files: Vec<UploadedFile>,
        now: DateTime<Utc>,
        written: &mut Vec<PathBuf>,
        stored: &mut Vec<ProductImage>,
    ) -> Result<(), ApiError> {
        for file in files {
            let id = ImageId::new();
            let path = self
                .upload_dir
                .join(image_filename(product_id, now, id, file.file_name.as_deref()));

            // create_new: never clobber a file another record points at.
            let mut out = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
                .map_err(|e| ApiError::Internal(format!("failed to create {}: {e}", path.display())))?;
            written.push(path.clone());
            out.write_all(&file.bytes)
                .await
                .map_err(|e| ApiError::Internal(format!("failed to write {}: {e}", path.display())))?;
            out.flush()
                .await
                .map_err(|e| ApiError::Internal(format!("failed to write {}: {e}", path.display())))?;

            let image = ProductImage {
                id,
                product_id,
                path: path.to_string_lossy().into_owned(),
                created_at: now,
            };
            stored.push(self.images.insert(image).await?);
        }
        Ok(())
    }

    /// Best effort: undo the files and records of a failed batch.
    async fn rollback_batch(&self, written: &[PathBuf], stored: &[ProductImage]) {
        for image in stored {
            if let Err(e) = self.images.delete(image.id).await {
                tracing::warn!(image_id = %image.id, error = %e, "failed to roll back image record");
            }
        }
        for path in written {
            if let Err(e) = tokio::fs::remove_file(path).await {
                tracing::warn!(path = %path.display(), error = %e, "failed to roll back image file");
            }
        }
    }

    pub async fn images_of(&self, product_id: ProductId) -> Result<Vec<ProductImage>, ApiError> {
        let product = self.product(product_id).await?;
        Ok(self.images.list_for_product(product.id).await?)
    }

    pub async fn delete_image(&self, id: ImageId, actor: &Account) -> Result<ImageId, ApiError> {
        let image = self
            .images
            .find_by_id(id)
            .await?
            .ok_or(ApiError::Store(StoreError::NotFound))?;
        self.owned_product(image.product_id, actor).await?;

        match tokio::fs::remove_file(&image.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(image_id = %image.id, path = %image.path, "image file already gone");
            }
            Err(e) => return Err(ApiError::Internal(format!("failed to remove {}: {e}", image.path))),
        }

        Ok(self.images.delete(image.id).await?)
    }
}

/// Pick in-memory or Postgres stores from configuration.
pub async fn build_services(config: &AppConfig) -> Result<AppServices, StoreError> {
    let tokens = Arc::new(TokenService::new(config.token.clone(), Arc::new(SystemClock)));

    match &config.database_url {
        Some(url) => {
            let pool = db::connect(url, config.db_max_connections).await?;
            db::apply_schema(&pool).await?;
            tracing::info!("using postgres stores");
            Ok(AppServices::postgres(pool, tokens, config.upload_dir.clone()))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory stores");
            Ok(AppServices::in_memory(tokens, config.upload_dir.clone()))
        }
    }
}

fn ensure_account_modifiable(target: &Account, actor: &Account) -> Result<(), AuthError> {
    let explanation = explain_account_modification(target, actor);
    if explanation.decision == Decision::Deny {
        tracing::info!(
            target_id = %target.id,
            actor_id = %actor.id,
            rule = explanation.rule,
            "account modification denied"
        );
        return Err(AuthError::Forbidden);
    }
    Ok(())
}

fn ensure_resource_owner(product: &Product, actor: &Account) -> Result<(), AuthError> {
    if !can_modify_resource(product.owner_id, actor) {
        tracing::info!(product_id = %product.id, actor_id = %actor.id, "resource modification denied");
        return Err(AuthError::Forbidden);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate};
    use showcase_auth::{Profile, TokenConfig};
    use showcase_products::{ProductDetails, ProductStatus};

    use super::*;

    /// Delegates to the in-memory store but fails the N-th insert.
    struct FlakyImageStore {
        inner: InMemoryImageStore,
        inserts: AtomicUsize,
        fail_on: usize,
    }

    #[async_trait]
    impl ImageStore for FlakyImageStore {
        async fn insert(&self, image: ProductImage) -> Result<ProductImage, StoreError> {
            if self.inserts.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_on {
                return Err(StoreError::Backend("disk full".into()));
            }
            self.inner.insert(image).await
        }

        async fn find_by_id(&self, id: ImageId) -> Result<Option<ProductImage>, StoreError> {
            self.inner.find_by_id(id).await
        }

        async fn list_for_product(&self, product_id: ProductId) -> Result<Vec<ProductImage>, StoreError> {
            self.inner.list_for_product(product_id).await
        }

        async fn delete(&self, id: ImageId) -> Result<ImageId, StoreError> {
            self.inner.delete(id).await
        }
    }

    struct Fixture {
        services: AppServices,
        owner: Account,
        product: Product,
        upload_dir: PathBuf,
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.upload_dir);
        }
    }

    async fn fixture(images: Arc<dyn ImageStore>) -> Fixture {
        let config = TokenConfig::new("test-secret", "HS256", Duration::minutes(5)).unwrap();
        let tokens = Arc::new(TokenService::new(config, Arc::new(SystemClock)));
        let upload_dir = std::env::temp_dir().join(format!("showcase-services-{}", ImageId::new()));
        let services = AppServices::new(
            Arc::new(InMemoryAccountStore::new()),
            Arc::new(InMemoryProductStore::new()),
            images,
            tokens,
            upload_dir.clone(),
        );

        let profile = Profile {
            name: "Ann".into(),
            surname: "Lee".into(),
            ..Default::default()
        };
        let new = NewAccount::new("ann@example.com", "pw".into(), profile).unwrap();
        let owner = services.register(new).await.unwrap();

        let details = ProductDetails {
            name: "Skyward".into(),
            ..Default::default()
        };
        let born = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let new = NewProduct::new(details, ProductStatus::default(), born, vec![]).unwrap();
        let product = services.create_product(new, &owner).await.unwrap();

        Fixture {
            services,
            owner,
            product,
            upload_dir,
        }
    }

    fn file(bytes: &[u8]) -> UploadedFile {
        UploadedFile {
            file_name: Some("logo.png".into()),
            bytes: bytes.to_vec(),
        }
    }

    #[tokio::test]
    async fn back_to_back_batches_keep_their_own_files() {
        let fx = fixture(Arc::new(InMemoryImageStore::new())).await;
        let svc = &fx.services;

        let first = svc.upload_images(fx.product.id, vec![file(b"AAA")], &fx.owner).await.unwrap();
        let second = svc.upload_images(fx.product.id, vec![file(b"BBB")], &fx.owner).await.unwrap();

        assert_ne!(first[0].path, second[0].path);
        assert_eq!(std::fs::read(&first[0].path).unwrap(), b"AAA");
        assert_eq!(std::fs::read(&second[0].path).unwrap(), b"BBB");

        svc.delete_image(second[0].id, &fx.owner).await.unwrap();
        assert_eq!(std::fs::read(&first[0].path).unwrap(), b"AAA");
        assert_eq!(svc.images_of(fx.product.id).await.unwrap(), vec![first[0].clone()]);
    }

    #[tokio::test]
    async fn failed_batch_leaves_nothing_behind() {
        let images = Arc::new(FlakyImageStore {
            inner: InMemoryImageStore::new(),
            inserts: AtomicUsize::new(0),
            fail_on: 2,
        });
        let fx = fixture(images).await;
        let svc = &fx.services;

        let result = svc
            .upload_images(fx.product.id, vec![file(b"one"), file(b"two"), file(b"three")], &fx.owner)
            .await;
        assert!(matches!(result, Err(ApiError::Store(StoreError::Backend(_)))));

        assert!(svc.images_of(fx.product.id).await.unwrap().is_empty());
        let leftovers = std::fs::read_dir(&fx.upload_dir).unwrap().count();
        assert_eq!(leftovers, 0);
    }
}
