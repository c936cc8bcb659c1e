use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use showcase_auth::{NewAccount, ProfilePatch};
use showcase_core::AccountId;

use crate::app::dto::{RegisterRequest, ShowUser};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::CurrentAccount;

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ShowUser>), ApiError> {
    let new = NewAccount::new(&body.email, body.password, body.profile)?;
    let account = services.register(new).await?;
    Ok((StatusCode::CREATED, Json(ShowUser::from(&account))))
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<ShowUser>, ApiError> {
    let id: AccountId = id.parse()?;
    let account = services.active_account(id).await?;
    Ok(Json(ShowUser::from(&account)))
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentAccount>,
    Path(id): Path<String>,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<Value>, ApiError> {
    let id: AccountId = id.parse()?;
    let updated = services.update_account(id, &patch, current.account()).await?;
    Ok(Json(json!({ "updated_user_id": updated.id.to_string() })))
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentAccount>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id: AccountId = id.parse()?;
    let deleted = services.deactivate_account(id, current.account()).await?;
    Ok(Json(json!({ "deleted_user_id": deleted.to_string() })))
}
