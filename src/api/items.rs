//! Listing endpoints: catalog, autocomplete, post form, detail and mark-sold

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Form, Json,
};
use axum_extra::extract::Multipart;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::ValidationErrors;

use crate::{
    error::{AppError, AppResult},
    models::{
        catalog::{CatalogPage, CatalogQuery, PostFormOptions},
        item::{Item, ItemDetail, ItemForm, SearchSuggestion},
    },
    services::images::ImageUpload,
    AppState,
};

/// Multipart field carrying the photo
const IMAGE_FIELD: &str = "image";

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SuggestQuery {
    /// Search term, at least 2 characters
    pub q: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct SuggestResponse {
    pub results: Vec<SearchSuggestion>,
}

/// Response to a successful post
#[derive(Serialize, ToSchema)]
pub struct PostedResponse {
    pub message: String,
    pub item: Item,
    /// Detail page of the new listing
    pub url: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DetailAction {
    /// Present (any value) to mark the listing as sold
    pub mark_sold: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct MarkSoldResponse {
    pub message: String,
    pub item: Item,
    /// Where the client should go next
    pub redirect: String,
}

/// Browse unsold listings
#[utoipa::path(
    get,
    path = "/items/",
    tag = "catalog",
    params(CatalogQuery),
    responses(
        (status = 200, description = "One page of the catalog", body = CatalogPage)
    )
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> AppResult<Json<CatalogPage>> {
    let page = state.services.catalog.browse(&query).await?;
    Ok(Json(page))
}

/// Autocomplete on name, course and author
#[utoipa::path(
    get,
    path = "/search-ajax/",
    tag = "catalog",
    params(SuggestQuery),
    responses(
        (status = 200, description = "Up to 10 suggestions, newest first", body = SuggestResponse)
    )
)]
pub async fn search_suggestions(
    State(state): State<AppState>,
    Query(query): Query<SuggestQuery>,
) -> AppResult<Json<SuggestResponse>> {
    let results = state.services.catalog.suggest(query.q.as_deref()).await?;
    Ok(Json(SuggestResponse { results }))
}

/// Choices for the post form
#[utoipa::path(
    get,
    path = "/post/",
    tag = "listings",
    responses(
        (status = 200, description = "Item type and condition choices", body = PostFormOptions)
    )
)]
pub async fn post_form(State(state): State<AppState>) -> Json<PostFormOptions> {
    Json(state.services.listings.form_options())
}

/// Post a new listing
#[utoipa::path(
    post,
    path = "/post/",
    tag = "listings",
    request_body(content = ItemForm, content_type = "multipart/form-data", description = "Listing fields plus an optional `image` file"),
    responses(
        (status = 201, description = "Listing posted", body = PostedResponse),
        (status = 400, description = "Invalid form", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_item(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<PostedResponse>)> {
    let (form, upload) = read_post_form(multipart).await?;
    let item = state.services.listings.create(form, upload).await?;

    let message = format!(
        "Your \"{}\" has been posted successfully! Students can now contact you at {}",
        item.item_name, item.contact_info
    );
    Ok((
        StatusCode::CREATED,
        Json(PostedResponse {
            message,
            url: item.url(),
            item,
        }),
    ))
}

/// Collect text fields into an [`ItemForm`] and check the optional photo.
/// An unreadable photo is reported together with the other field errors.
async fn read_post_form(mut multipart: Multipart) -> AppResult<(ItemForm, Option<ImageUpload>)> {
    let mut pairs = Vec::new();
    let mut image = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == IMAGE_FIELD {
            let file_name = field.file_name().map(str::to_string);
            let bytes = field.bytes().await?;
            if !bytes.is_empty() {
                image = Some(ImageUpload::verify(file_name, bytes.to_vec()).await?);
            }
        } else {
            pairs.push((name, field.text().await?));
        }
    }

    let form = ItemForm::from_pairs(pairs);
    match image {
        Some(Err(image_error)) => {
            let mut errors = form
                .clone()
                .into_new_item(None)
                .err()
                .unwrap_or_else(ValidationErrors::new);
            errors.add(IMAGE_FIELD, image_error);
            Err(AppError::Form(errors))
        }
        Some(Ok(upload)) => Ok((form, Some(upload))),
        None => Ok((form, None)),
    }
}

/// Listing detail; every request counts one view
#[utoipa::path(
    get,
    path = "/item/{id}/",
    tag = "listings",
    params(
        ("id" = i64, Path, description = "Listing ID")
    ),
    responses(
        (status = 200, description = "Listing with related and same-seller listings", body = ItemDetail),
        (status = 404, description = "Listing not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ItemDetail>> {
    let detail = state.services.listings.detail(id).await?;
    Ok(Json(detail))
}

/// Detail form submission; with `mark_sold` the listing is marked as sold
#[utoipa::path(
    post,
    path = "/item/{id}/",
    tag = "listings",
    params(
        ("id" = i64, Path, description = "Listing ID")
    ),
    request_body(content = DetailAction, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Marked as sold, or the plain detail without `mark_sold`", body = MarkSoldResponse),
        (status = 404, description = "Listing not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn post_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    action: Option<Form<DetailAction>>,
) -> AppResult<Response> {
    let detail = state.services.listings.detail(id).await?;

    let action = action.map(|Form(action)| action).unwrap_or_default();
    if action.mark_sold.is_none() {
        return Ok(Json(detail).into_response());
    }

    let item = state.services.listings.mark_sold(id).await?;
    Ok(Json(MarkSoldResponse {
        message: format!("\"{}\" has been marked as sold!", item.item_name),
        item,
        redirect: "/".to_string(),
    })
    .into_response())
}
