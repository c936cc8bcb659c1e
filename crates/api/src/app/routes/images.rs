use std::sync::Arc;

use axum::{
    extract::{Extension, Multipart, Path},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use showcase_core::{ImageId, ProductId};

use crate::app::dto::ShowImage;
use crate::app::errors::ApiError;
use crate::app::services::{AppServices, UploadedFile};
use crate::context::CurrentAccount;

const IMAGES_FIELD: &str = "images";

pub async fn upload_images(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentAccount>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<ShowImage>>), ApiError> {
    let id: ProductId = id.parse()?;

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(IMAGES_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        files.push(UploadedFile {
            file_name,
            bytes: bytes.to_vec(),
        });
    }

    let stored = services.upload_images(id, files, current.account()).await?;
    Ok((StatusCode::CREATED, Json(stored.iter().map(ShowImage::from).collect())))
}

pub async fn list_images(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ShowImage>>, ApiError> {
    let id: ProductId = id.parse()?;
    let images = services.images_of(id).await?;
    Ok(Json(images.iter().map(ShowImage::from).collect()))
}

pub async fn delete_image(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentAccount>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id: ImageId = id.parse()?;
    let deleted = services.delete_image(id, current.account()).await?;
    Ok(Json(json!({ "deleted_image_id": deleted.to_string() })))
}
