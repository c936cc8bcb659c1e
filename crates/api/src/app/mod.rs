//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: stores, identity resolver and the operations routes call
//! - `routes/`: HTTP handlers, one file per resource
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};

use showcase_infra::StoreError;

use crate::config::AppConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router from configuration (entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> Result<Router, StoreError> {
    let services = services::build_services(config).await?;
    Ok(build_app_with(services))
}

/// Build the router over already-wired services.
pub fn build_app_with(services: services::AppServices) -> Router {
    let services = Arc::new(services);

    let protected = routes::protected_router().layer(axum::middleware::from_fn_with_state(
        services.clone(),
        middleware::auth_middleware,
    ));

    routes::public_router()
        .merge(protected)
        .layer(Extension(services))
}
