//! Postgres-backed stores.
//!
//! Queries are runtime-checked (`sqlx::query` + `Row::try_get`) so the crate
//! builds without a live database. Partial updates run inside a transaction:
//! the row is locked with `FOR UPDATE`, the patch is applied in Rust and the
//! full set of mutable columns is written back.
//!
//! ## Error mapping
//!
//! | SQLx error | Postgres code | `StoreError` |
//! |------------|---------------|--------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (foreign key violation) | `23503` | `NotFound` |
//! | anything else | | `Backend` |

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use showcase_auth::{Account, AccountLookup, LookupError, Profile, ProfilePatch, RoleSet};
use showcase_core::{AccountId, Email, ImageId, ProductId};
use showcase_products::{Product, ProductDetails, ProductImage, ProductPatch, ProductStatus};

use super::{AccountStore, ImageStore, ProductStore, StoreError};

const ACCOUNT_COLUMNS: &str = "user_id, email, hashed_password, is_active, roles, \
     name, surname, username, current_company, your_role, headline, about, links";

const PRODUCT_COLUMNS: &str = "product_id, user_id, name, description, link_to_product, price, logo, \
     about, problem, decision, advantages, additional, link, status_of_project, born_date, post_date, \
     pictures, is_active";

#[derive(Debug, Clone)]
pub struct PgAccountStore {
    pool: Arc<PgPool>,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    async fn fetch_one_where(&self, clause: &str, bind: BindValue<'_>) -> Result<Option<Account>, StoreError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE {clause}");
        let query = sqlx::query(&sql);
        let query = match bind {
            BindValue::Id(id) => query.bind(id),
            BindValue::Text(text) => query.bind(text),
        };
        let row = query
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_account", e))?;
        row.as_ref().map(account_from_row).transpose()
    }
}

enum BindValue<'a> {
    Id(uuid::Uuid),
    Text(&'a str),
}

#[async_trait]
impl AccountLookup for PgAccountStore {
    #[instrument(skip(self, email), err)]
    async fn find_account_by_email(&self, email: &Email) -> Result<Option<Account>, LookupError> {
        Ok(self.fetch_one_where("email = $1", BindValue::Text(email.as_str())).await?)
    }

    #[instrument(skip(self), fields(account_id = %id), err)]
    async fn find_account_by_id(&self, id: AccountId) -> Result<Option<Account>, LookupError> {
        Ok(self.fetch_one_where("user_id = $1", BindValue::Id(*id.as_uuid())).await?)
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    #[instrument(skip(self, account), fields(account_id = %account.id), err)]
    async fn insert(&self, account: Account) -> Result<Account, StoreError> {
        let p = &account.profile;
        sqlx::query(
            r#"
            INSERT INTO users (
                user_id, email, hashed_password, is_active, roles,
                name, surname, username, current_company, your_role, headline, about, links
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(*account.id.as_uuid())
        .bind(account.email.as_str())
        .bind(&account.password_hash)
        .bind(account.is_active)
        .bind(account.roles.labels())
        .bind(&p.name)
        .bind(&p.surname)
        .bind(&p.username)
        .bind(&p.current_company)
        .bind(&p.your_role)
        .bind(&p.headline)
        .bind(&p.about)
        .bind(&p.links)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_account", e))?;

        Ok(account)
    }

    #[instrument(skip(self, patch), fields(account_id = %id), err)]
    async fn update_profile(&self, id: AccountId, patch: &ProfilePatch) -> Result<Account, StoreError> {
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error("begin", e))?;

        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE user_id = $1 AND is_active FOR UPDATE");
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_profile", e))?
            .ok_or(StoreError::NotFound)?;
        let mut account = account_from_row(&row)?;
        patch.apply(&mut account.profile);

        let p = &account.profile;
        sqlx::query(
            r#"
            UPDATE users
            SET name = $2, surname = $3, username = $4, current_company = $5,
                your_role = $6, headline = $7, about = $8, links = $9
            WHERE user_id = $1
            "#,
        )
        .bind(*id.as_uuid())
        .bind(&p.name)
        .bind(&p.surname)
        .bind(&p.username)
        .bind(&p.current_company)
        .bind(&p.your_role)
        .bind(&p.headline)
        .bind(&p.about)
        .bind(&p.links)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_profile", e))?;

        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        Ok(account)
    }

    #[instrument(skip(self), fields(account_id = %id), err)]
    async fn deactivate(&self, id: AccountId) -> Result<AccountId, StoreError> {
        let result = sqlx::query("UPDATE users SET is_active = FALSE WHERE user_id = $1 AND is_active")
            .bind(*id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("deactivate_account", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(id)
    }
}

#[derive(Debug, Clone)]
pub struct PgProductStore {
    pool: Arc<PgPool>,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    #[instrument(skip(self, product), fields(product_id = %product.id), err)]
    async fn insert(&self, product: Product) -> Result<Product, StoreError> {
        let d = &product.details;
        sqlx::query(
            r#"
            INSERT INTO products (
                product_id, user_id, name, description, link_to_product, price, logo,
                about, problem, decision, advantages, additional, link,
                status_of_project, born_date, post_date, pictures, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(*product.id.as_uuid())
        .bind(*product.owner_id.as_uuid())
        .bind(&d.name)
        .bind(&d.description)
        .bind(&d.link_to_product)
        .bind(&d.price)
        .bind(&d.logo)
        .bind(&d.about)
        .bind(&d.problem)
        .bind(&d.decision)
        .bind(&d.advantages)
        .bind(&d.additional)
        .bind(&d.link)
        .bind(product.status.as_str())
        .bind(product.born_date)
        .bind(product.post_date)
        .bind(&product.pictures)
        .bind(product.is_active)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;

        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE product_id = $1 AND is_active");
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_product", e))?;
        row.as_ref().map(product_from_row).transpose()
    }

    #[instrument(skip(self, patch), fields(product_id = %id), err)]
    async fn update(&self, id: ProductId, patch: &ProductPatch) -> Result<Product, StoreError> {
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error("begin", e))?;

        let mut product = lock_active_product(&mut tx, id).await?;
        patch.apply(&mut product);

        let d = &product.details;
        sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, link_to_product = $4, price = $5, logo = $6,
                about = $7, problem = $8, decision = $9, advantages = $10, additional = $11,
                link = $12, status_of_project = $13, born_date = $14, pictures = $15
            WHERE product_id = $1
            "#,
        )
        .bind(*id.as_uuid())
        .bind(&d.name)
        .bind(&d.description)
        .bind(&d.link_to_product)
        .bind(&d.price)
        .bind(&d.logo)
        .bind(&d.about)
        .bind(&d.problem)
        .bind(&d.decision)
        .bind(&d.advantages)
        .bind(&d.additional)
        .bind(&d.link)
        .bind(product.status.as_str())
        .bind(product.born_date)
        .bind(&product.pictures)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;

        tx.commit().await.map_err(|e| map_sqlx_error("commit", e))?;
        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn deactivate(&self, id: ProductId) -> Result<ProductId, StoreError> {
        let result = sqlx::query("UPDATE products SET is_active = FALSE WHERE product_id = $1 AND is_active")
            .bind(*id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("deactivate_product", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(id)
    }

    #[instrument(skip(self), fields(owner_id = %owner_id), err)]
    async fn list_by_owner(&self, owner_id: AccountId) -> Result<Vec<Product>, StoreError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE user_id = $1 AND is_active ORDER BY product_id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(*owner_id.as_uuid())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;
        rows.iter().map(product_from_row).collect()
    }
}

async fn lock_active_product(tx: &mut Transaction<'_, Postgres>, id: ProductId) -> Result<Product, StoreError> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE product_id = $1 AND is_active FOR UPDATE");
    let row = sqlx::query(&sql)
        .bind(*id.as_uuid())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("lock_product", e))?
        .ok_or(StoreError::NotFound)?;
    product_from_row(&row)
}

#[derive(Debug, Clone)]
pub struct PgImageStore {
    pool: Arc<PgPool>,
}

impl PgImageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

#[async_trait]
impl ImageStore for PgImageStore {
    #[instrument(skip(self, image), fields(image_id = %image.id, product_id = %image.product_id), err)]
    async fn insert(&self, image: ProductImage) -> Result<ProductImage, StoreError> {
        sqlx::query("INSERT INTO product_images (image_id, product_id, path, created_at) VALUES ($1, $2, $3, $4)")
            .bind(*image.id.as_uuid())
            .bind(*image.product_id.as_uuid())
            .bind(&image.path)
            .bind(image.created_at)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_image", e))?;
        Ok(image)
    }

    #[instrument(skip(self), fields(image_id = %id), err)]
    async fn find_by_id(&self, id: ImageId) -> Result<Option<ProductImage>, StoreError> {
        let row = sqlx::query("SELECT image_id, product_id, path, created_at FROM product_images WHERE image_id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_image", e))?;
        row.as_ref().map(image_from_row).transpose()
    }

    #[instrument(skip(self), fields(product_id = %product_id), err)]
    async fn list_for_product(&self, product_id: ProductId) -> Result<Vec<ProductImage>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT image_id, product_id, path, created_at
            FROM product_images
            WHERE product_id = $1
            ORDER BY created_at ASC, image_id ASC
            "#,
        )
        .bind(*product_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_images", e))?;
        rows.iter().map(image_from_row).collect()
    }

    #[instrument(skip(self), fields(image_id = %id), err)]
    async fn delete(&self, id: ImageId) -> Result<ImageId, StoreError> {
        let result = sqlx::query("DELETE FROM product_images WHERE image_id = $1")
            .bind(*id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_image", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(id)
    }
}

fn account_from_row(row: &PgRow) -> Result<Account, StoreError> {
    let decode = |e: sqlx::Error| StoreError::Backend(format!("failed to decode account row: {e}"));

    let email: String = row.try_get("email").map_err(decode)?;
    let labels: Vec<String> = row.try_get("roles").map_err(decode)?;

    Ok(Account {
        id: AccountId::from_uuid(row.try_get("user_id").map_err(decode)?),
        email: Email::parse(&email).map_err(|e| StoreError::Backend(format!("stored email is invalid: {e}")))?,
        password_hash: row.try_get("hashed_password").map_err(decode)?,
        is_active: row.try_get("is_active").map_err(decode)?,
        roles: RoleSet::from_labels(&labels).map_err(|e| StoreError::Backend(e.to_string()))?,
        profile: Profile {
            name: row.try_get("name").map_err(decode)?,
            surname: row.try_get("surname").map_err(decode)?,
            username: row.try_get("username").map_err(decode)?,
            current_company: row.try_get("current_company").map_err(decode)?,
            your_role: row.try_get("your_role").map_err(decode)?,
            headline: row.try_get("headline").map_err(decode)?,
            about: row.try_get("about").map_err(decode)?,
            links: row.try_get("links").map_err(decode)?,
        },
    })
}

fn product_from_row(row: &PgRow) -> Result<Product, StoreError> {
    let decode = |e: sqlx::Error| StoreError::Backend(format!("failed to decode product row: {e}"));

    let status: String = row.try_get("status_of_project").map_err(decode)?;

    Ok(Product {
        id: ProductId::from_uuid(row.try_get("product_id").map_err(decode)?),
        owner_id: AccountId::from_uuid(row.try_get("user_id").map_err(decode)?),
        details: ProductDetails {
            name: row.try_get("name").map_err(decode)?,
            description: row.try_get("description").map_err(decode)?,
            link_to_product: row.try_get("link_to_product").map_err(decode)?,
            price: row.try_get("price").map_err(decode)?,
            logo: row.try_get("logo").map_err(decode)?,
            about: row.try_get("about").map_err(decode)?,
            problem: row.try_get("problem").map_err(decode)?,
            decision: row.try_get("decision").map_err(decode)?,
            advantages: row.try_get("advantages").map_err(decode)?,
            additional: row.try_get("additional").map_err(decode)?,
            link: row.try_get("link").map_err(decode)?,
        },
        status: ProductStatus::parse(&status).map_err(|e| StoreError::Backend(e.to_string()))?,
        born_date: row.try_get("born_date").map_err(decode)?,
        post_date: row.try_get("post_date").map_err(decode)?,
        pictures: row.try_get("pictures").map_err(decode)?,
        is_active: row.try_get("is_active").map_err(decode)?,
    })
}

fn image_from_row(row: &PgRow) -> Result<ProductImage, StoreError> {
    let decode = |e: sqlx::Error| StoreError::Backend(format!("failed to decode image row: {e}"));

    Ok(ProductImage {
        id: ImageId::from_uuid(row.try_get("image_id").map_err(decode)?),
        product_id: ProductId::from_uuid(row.try_get("product_id").map_err(decode)?),
        path: row.try_get("path").map_err(decode)?,
        created_at: row.try_get("created_at").map_err(decode)?,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                // Referenced row is gone.
                Some("23503") => StoreError::NotFound,
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {}", operation)),
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}
