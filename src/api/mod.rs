//! API handlers for Campus Market endpoints

pub mod health;
pub mod home;
pub mod items;
pub mod openapi;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = DefaultBodyLimit::max(state.config.media.max_upload_bytes);

    let routes = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Catalog
        .route("/", get(home::home))
        .route("/items/", get(items::list_items))
        .route("/search-ajax/", get(items::search_suggestions))
        // Listings
        .route("/post/", get(items::post_form).post(items::create_item))
        .route("/item/:id/", get(items::get_item).post(items::post_item))
        .with_state(state);

    // OpenAPI documentation
    let openapi = openapi::create_openapi_router();

    Router::new()
        .merge(routes)
        .merge(openapi)
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::OpenApi;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = openapi::ApiDoc::openapi();
        for path in ["/", "/items/", "/search-ajax/", "/post/", "/item/{id}/", "/health", "/ready"] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
