use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use showcase_auth::{Account, Profile};
use showcase_products::{Product, ProductDetails, ProductImage, ProductStatus};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(flatten)]
    pub profile: Profile,
}

/// OAuth2 password-flow form; `username` carries the email.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    #[serde(flatten)]
    pub details: ProductDetails,
    #[serde(default, rename = "status_of_project")]
    pub status: ProductStatus,
    pub born_date: NaiveDate,
    #[serde(default)]
    pub pictures: Vec<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer",
        }
    }
}

/// Public view of an account. Never carries the password hash.
#[derive(Debug, Serialize)]
pub struct ShowUser {
    pub user_id: String,
    pub email: String,
    #[serde(flatten)]
    pub profile: Profile,
    pub roles: Vec<String>,
    pub is_active: bool,
}

impl From<&Account> for ShowUser {
    fn from(account: &Account) -> Self {
        Self {
            user_id: account.id.to_string(),
            email: account.email.to_string(),
            profile: account.profile.clone(),
            roles: account.roles.labels(),
            is_active: account.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ShowProduct {
    pub product_id: String,
    pub user_id: String,
    #[serde(flatten)]
    pub details: ProductDetails,
    pub status_of_project: ProductStatus,
    pub born_date: NaiveDate,
    pub post_date: NaiveDate,
    pub pictures: Vec<String>,
}

impl From<&Product> for ShowProduct {
    fn from(p: &Product) -> Self {
        Self {
            product_id: p.id.to_string(),
            user_id: p.owner_id.to_string(),
            details: p.details.clone(),
            status_of_project: p.status,
            born_date: p.born_date,
            post_date: p.post_date,
            pictures: p.pictures.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ShowImage {
    pub image_id: String,
    pub product_id: String,
    pub path: String,
    pub created_at: DateTime<Utc>,
}

impl From<&ProductImage> for ShowImage {
    fn from(image: &ProductImage) -> Self {
        Self {
            image_id: image.id.to_string(),
            product_id: image.product_id.to_string(),
            path: image.path.clone(),
            created_at: image.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn register_request_accepts_partial_profile() {
        let req: RegisterRequest = serde_json::from_value(json!({
            "email": "ann@example.com",
            "password": "pw",
            "name": "Ann",
            "surname": "Lee",
        }))
        .unwrap();
        assert_eq!(req.profile.name, "Ann");
        assert_eq!(req.profile.headline, "");
    }

    #[test]
    fn create_product_defaults_status() {
        let req: CreateProductRequest = serde_json::from_value(json!({
            "name": "Skyward",
            "born_date": "2024-01-01",
        }))
        .unwrap();
        assert_eq!(req.status, ProductStatus::default());
        assert_eq!(req.details.name, "Skyward");
        assert!(req.pictures.is_empty());
    }
}
