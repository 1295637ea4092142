// handlers/categories.rs - /api/v1/categories
//
// Categories are one shared taxonomy; there is no owner column.

use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::{Category, CreateCategory, TypeFilter, UpdateCategory};
use crate::error::ApiError;
use crate::middleware::{ApiPath, ApiQuery, ApiResponse, ApiResult, ValidatedJson};
use crate::AppState;

const CATEGORY_NOT_FOUND: &str = "Category not found";

#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    #[serde(rename = "type", default)]
    pub kind: TypeFilter,
}

/// GET /api/v1/categories?type=income|expense
pub async fn list_categories(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CategoryQuery>,
) -> ApiResult<Vec<Category>> {
    let categories = state.store.list_categories(query.kind.entry_type()).await?;
    Ok(ApiResponse::success(categories))
}

/// GET /api/v1/categories/:id
pub async fn get_category(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<Category> {
    state
        .store
        .find_category(id)
        .await?
        .map(ApiResponse::success)
        .ok_or_else(|| ApiError::not_found(CATEGORY_NOT_FOUND))
}

/// POST /api/v1/categories
pub async fn create_category(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateCategory>,
) -> ApiResult<Category> {
    let category = state.store.insert_category(request).await?;
    tracing::info!(category_id = %category.id, kind = %category.kind, "Created category");
    Ok(ApiResponse::created(category))
}

/// PUT /api/v1/categories/:id
pub async fn update_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateCategory>,
) -> ApiResult<Category> {
    let category = state
        .store
        .update_category(id, request)
        .await?
        .ok_or_else(|| ApiError::not_found(CATEGORY_NOT_FOUND))?;
    tracing::info!(category_id = %id, "Updated category");
    Ok(ApiResponse::success(category))
}

/// DELETE /api/v1/categories/:id
///
/// Transactions keep their `category_id`; it simply stops resolving.
pub async fn delete_category(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<()> {
    if !state.store.delete_category(id).await? {
        return Err(ApiError::not_found(CATEGORY_NOT_FOUND));
    }
    tracing::info!(category_id = %id, "Deleted category");
    Ok(ApiResponse::no_content())
}
