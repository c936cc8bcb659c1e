use std::sync::Arc;

use axum::{extract::Extension, Form, Json};

use crate::app::dto::{LoginForm, TokenResponse};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

/// Exchange email + password for a bearer token whose subject is the email.
pub async fn login_for_access_token(
    Extension(services): Extension<Arc<AppServices>>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    let account = services.identity.login(&form.username, &form.password).await?;
    let token = services.tokens().issue_default(account.email.as_str())?;
    tracing::info!(account_id = %account.id, "access token issued");
    Ok(Json(TokenResponse::bearer(token)))
}
