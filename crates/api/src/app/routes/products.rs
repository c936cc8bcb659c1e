use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use showcase_core::{AccountId, ProductId};
use showcase_products::{NewProduct, ProductPatch};

use crate::app::dto::{CreateProductRequest, ShowProduct};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::CurrentAccount;

/// The owner is always the caller; any owner in the body is ignored.
pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentAccount>,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ShowProduct>), ApiError> {
    let new = NewProduct::new(body.details, body.status, body.born_date, body.pictures)?;
    let product = services.create_product(new, current.account()).await?;
    Ok((StatusCode::CREATED, Json(ShowProduct::from(&product))))
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<ShowProduct>, ApiError> {
    let id: ProductId = id.parse()?;
    let product = services.product(id).await?;
    Ok(Json(ShowProduct::from(&product)))
}

pub async fn list_for_owner(
    Extension(services): Extension<Arc<AppServices>>,
    Path(owner_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let owner_id: AccountId = owner_id.parse()?;
    let items = services
        .products_of(owner_id)
        .await?
        .iter()
        .map(ShowProduct::from)
        .collect::<Vec<_>>();
    Ok(Json(json!({ "items": items })))
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentAccount>,
    Path(id): Path<String>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<ShowProduct>, ApiError> {
    let id: ProductId = id.parse()?;
    let product = services.update_product(id, &patch, current.account()).await?;
    Ok(Json(ShowProduct::from(&product)))
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentAccount>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id: ProductId = id.parse()?;
    let deleted = services.deactivate_product(id, current.account()).await?;
    Ok(Json(json!({ "deleted_product_id": deleted.to_string() })))
}
