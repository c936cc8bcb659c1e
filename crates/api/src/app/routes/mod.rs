use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

pub mod images;
pub mod login;
pub mod products;
pub mod system;
pub mod users;

const UPLOAD_BODY_LIMIT: usize = 20 * 1024 * 1024;

/// Endpoints reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/users", post(users::register))
        .route("/users/:id", get(users::get_user))
        .route("/users/:id/products", get(products::list_for_owner))
        .route("/login/token", post(login::login_for_access_token))
        .route("/products/:id", get(products::get_product))
        .route("/products/:id/images", get(images::list_images))
}

/// Endpoints that require a resolved bearer token.
pub fn protected_router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/users/:id", axum::routing::patch(users::update_user).delete(users::delete_user))
        .route("/products", post(products::create_product))
        .route(
            "/products/:id",
            axum::routing::patch(products::update_product).delete(products::delete_product),
        )
        .route(
            "/products/:id/images",
            post(images::upload_images).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/images/:id", delete(images::delete_image))
}
