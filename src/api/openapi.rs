//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{health, home, items};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Campus Market API",
        version = "1.0.0",
        description = "Student marketplace for used textbooks and study notes"
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Catalog
        home::home,
        items::list_items,
        items::search_suggestions,
        // Listings
        items::post_form,
        items::create_item,
        items::get_item,
        items::post_item,
    ),
    components(
        schemas(
            // Listings
            crate::models::item::Item,
            crate::models::item::ItemShort,
            crate::models::item::ItemDetail,
            crate::models::item::ItemForm,
            crate::models::item::SearchSuggestion,
            crate::models::enums::ItemType,
            crate::models::enums::Condition,
            crate::models::enums::ContactType,
            crate::models::enums::Choice,
            // Catalog
            crate::models::catalog::CatalogPage,
            crate::models::catalog::AppliedFilters,
            crate::models::catalog::SortKey,
            crate::models::catalog::MarketStats,
            crate::models::catalog::CourseCount,
            crate::models::catalog::HomeOverview,
            crate::models::catalog::PostFormOptions,
            // Requests / responses
            items::SuggestResponse,
            items::PostedResponse,
            items::DetailAction,
            items::MarkSoldResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "catalog", description = "Browsing and searching listings"),
        (name = "listings", description = "Posting, viewing and selling listings")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
