//! One place where every layer's error becomes an HTTP response.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use showcase_auth::{AuthError, BoundaryError, PasswordHashError, TokenError};
use showcase_core::DomainError;
use showcase_infra::StoreError;

#[derive(Debug)]
pub enum ApiError {
    Auth(AuthError),
    Domain(DomainError),
    Store(StoreError),
    /// Malformed request that never reached the domain (e.g. multipart framing).
    BadRequest(String),
    Internal(String),
}

impl From<AuthError> for ApiError {
    fn from(value: AuthError) -> Self {
        ApiError::Auth(value)
    }
}

impl From<DomainError> for ApiError {
    fn from(value: DomainError) -> Self {
        ApiError::Domain(value)
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        ApiError::Store(value)
    }
}

impl From<PasswordHashError> for ApiError {
    fn from(value: PasswordHashError) -> Self {
        ApiError::Internal(value.to_string())
    }
}

impl From<TokenError> for ApiError {
    fn from(value: TokenError) -> Self {
        ApiError::Internal(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Auth(err) => auth_error_to_response(&err),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Store(err) => store_error_to_response(err),
            ApiError::BadRequest(msg) => json_error(StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                internal_error()
            }
        }
    }
}

pub fn auth_error_to_response(err: &AuthError) -> Response {
    let boundary = err.at_boundary();
    match boundary {
        BoundaryError::InvalidCredentials | BoundaryError::Unauthorized => {
            let mut res = json_error(StatusCode::UNAUTHORIZED, "unauthorized", boundary.message());
            res.headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            res
        }
        BoundaryError::Forbidden => json_error(StatusCode::FORBIDDEN, "forbidden", boundary.message()),
        BoundaryError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", boundary.message()),
        BoundaryError::Unavailable => {
            tracing::error!(error = %err, "identity lookup failed");
            internal_error()
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::UNPROCESSABLE_ENTITY, "invalid_id", msg),
    }
}

pub fn store_error_to_response(err: StoreError) -> Response {
    match err {
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "Not found."),
        StoreError::Backend(msg) => {
            tracing::error!(error = %msg, "store backend error");
            internal_error()
        }
    }
}

fn internal_error() -> Response {
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        BoundaryError::Unavailable.message(),
    )
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use showcase_auth::LookupError;

    #[test]
    fn token_failures_share_one_response() {
        for err in [AuthError::InvalidToken, AuthError::ExpiredToken] {
            let res = auth_error_to_response(&err);
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Bearer");
        }
    }

    #[test]
    fn status_codes_per_outcome() {
        let cases = [
            (ApiError::Auth(AuthError::Forbidden), StatusCode::FORBIDDEN),
            (ApiError::Auth(AuthError::NotFound), StatusCode::NOT_FOUND),
            (
                ApiError::Auth(AuthError::Lookup(LookupError("down".into()))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ApiError::Domain(DomainError::validation("x")), StatusCode::UNPROCESSABLE_ENTITY),
            (ApiError::Store(StoreError::Conflict("dup".into())), StatusCode::CONFLICT),
            (ApiError::Store(StoreError::Backend("io".into())), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
