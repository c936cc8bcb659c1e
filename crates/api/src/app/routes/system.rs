use axum::{extract::Extension, http::StatusCode, Json};

use crate::app::dto::ShowUser;
use crate::context::CurrentAccount;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(current): Extension<CurrentAccount>) -> Json<ShowUser> {
    Json(ShowUser::from(current.account()))
}
