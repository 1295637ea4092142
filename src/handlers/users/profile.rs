use axum::extract::State;
use uuid::Uuid;

use crate::auth::{hash_password, plaintext_mirror};
use crate::database::models::{AdminUserView, CreateUser, NewUser, PublicUser, UpdateUser};
use crate::database::{DatabaseError, DeletedUser};
use crate::error::ApiError;
use crate::events::LedgerEvent;
use crate::middleware::{require_admin, AdminUser, ApiPath, ApiResponse, ApiResult, AuthUser, ValidatedJson};
use crate::AppState;

use super::USER_NOT_FOUND;

const NAME_TAKEN: &str = "用户名已存在";

/// GET /api/v1/users - admin listing, newest first
pub async fn list_users(State(state): State<AppState>, AdminUser(admin): AdminUser) -> ApiResult<Vec<AdminUserView>> {
    let include_plaintext = state.config.security.retain_plaintext_passwords;
    let users = state.store.list_users().await?;

    tracing::debug!(admin = %admin.user_id, count = users.len(), "Listed users");
    Ok(ApiResponse::success(
        users.iter().map(|u| AdminUserView::new(u, include_plaintext)).collect(),
    ))
}

/// GET /api/v1/users/by-name/:name - `data: null` when the name is free
pub async fn user_by_name(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
) -> ApiResult<Option<PublicUser>> {
    let user = state.store.find_user_by_name(&name).await?;
    Ok(ApiResponse::success(user.map(PublicUser::from)))
}

/// GET /api/v1/users/:id
pub async fn get_user(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<PublicUser> {
    state
        .store
        .find_user(id)
        .await?
        .map(|u| ApiResponse::success(PublicUser::from(u)))
        .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))
}

/// POST /api/v1/users - register
///
/// Creating an admin account needs an admin token.
pub async fn create_user(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    ValidatedJson(request): ValidatedJson<CreateUser>,
) -> ApiResult<PublicUser> {
    if request.is_admin {
        require_admin(auth.as_ref())?;
    }

    if state.store.find_user_by_name(&request.name).await?.is_some() {
        return Err(ApiError::bad_request(NAME_TAKEN));
    }

    let security = &state.config.security;
    let password_hash = hash_password(&request.password, security.bcrypt_cost).await?;
    let password_plain = plaintext_mirror(&request.password, security);

    // The unique index still catches a concurrent registration of the same name.
    let user = match state
        .store
        .insert_user(NewUser::from_request(request, password_hash, password_plain))
        .await
    {
        Ok(user) => user,
        Err(DatabaseError::Conflict(_)) => return Err(ApiError::bad_request(NAME_TAKEN)),
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = %user.id, name = %user.name, "Registered user");
    Ok(ApiResponse::created(PublicUser::from(user)))
}

/// PUT /api/v1/users/:id - partial profile update
pub async fn update_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    auth: Option<AuthUser>,
    ValidatedJson(request): ValidatedJson<UpdateUser>,
) -> ApiResult<PublicUser> {
    let current = state
        .store
        .find_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))?;

    if request.name.as_deref().is_some_and(|name| name != current.name) {
        return Err(ApiError::bad_request("用户名不可修改"));
    }
    if request.is_admin.is_some_and(|flag| flag != current.is_admin) {
        require_admin(auth.as_ref())?;
    }

    let user = state
        .store
        .update_user(id, request.into_changes())
        .await?
        .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))?;

    tracing::info!(user_id = %user.id, "Updated user profile");
    Ok(ApiResponse::success(PublicUser::from(user)))
}

/// DELETE /api/v1/users/:id - removes the user with all their transactions and feedbacks
pub async fn delete_user(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<DeletedUser> {
    let deleted = state
        .store
        .delete_user_cascade(id)
        .await?
        .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))?;

    tracing::info!(
        user_id = %id,
        transactions = deleted.deleted_transactions,
        feedbacks = deleted.deleted_feedbacks,
        "Deleted user"
    );
    state.events.publish(LedgerEvent::UserDeleted { user_id: id });
    Ok(ApiResponse::success(deleted))
}
