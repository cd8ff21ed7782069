//! Home page endpoint

use axum::{extract::State, Json};

use crate::{error::AppResult, models::catalog::HomeOverview, AppState};

/// Latest listings, market statistics and popular courses
#[utoipa::path(
    get,
    path = "/",
    tag = "catalog",
    responses(
        (status = 200, description = "Home page data", body = HomeOverview)
    )
)]
pub async fn home(State(state): State<AppState>) -> AppResult<Json<HomeOverview>> {
    let overview = state.services.catalog.home().await?;
    Ok(Json(overview))
}
