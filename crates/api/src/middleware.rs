use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use showcase_auth::AuthError;

use crate::app::errors::auth_error_to_response;
use crate::app::services::AppServices;
use crate::context::CurrentAccount;

/// Resolve the bearer token into the acting account.
///
/// Every failure (missing header, bad signature, expired token, unknown or
/// deactivated subject) produces the same 401.
pub async fn auth_middleware(
    State(services): State<Arc<AppServices>>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let account = match extract_bearer(req.headers()) {
        Ok(token) => services.identity.resolve_bearer(token).await,
        Err(e) => Err(e),
    };

    match account {
        Ok(account) => {
            req.extensions_mut().insert(CurrentAccount::new(account));
            next.run(req).await
        }
        Err(e) => {
            if !matches!(e, AuthError::Lookup(_)) {
                tracing::debug!(error = %e, "bearer rejected");
            }
            auth_error_to_response(&e).into_response()
        }
    }
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(AuthError::InvalidToken)?;

    let header = header.to_str().map_err(|_| AuthError::InvalidToken)?;

    let (scheme, token) = header.split_once(' ').ok_or(AuthError::InvalidToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidToken);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidToken);
    }

    Ok(token)
}
