use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::auth::{check_credentials, hash_password, plaintext_mirror};
use crate::error::ApiError;
use crate::middleware::{AdminUser, ApiPath, ApiResponse, ApiResult, FieldOrder, ValidatedJson};
use crate::AppState;

use super::USER_NOT_FOUND;

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewPasswordRequest {
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "新密码不能为空"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPasswordRequest {
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "当前密码不能为空"))]
    pub current_password: String,
}

impl FieldOrder for NewPasswordRequest {}
impl FieldOrder for VerifyPasswordRequest {}

#[derive(Debug, Serialize)]
pub struct PasswordCheck {
    pub valid: bool,
}

async fn store_password(state: &AppState, id: Uuid, password: &str) -> Result<(), ApiError> {
    let security = &state.config.security;
    let hash = hash_password(password, security.bcrypt_cost).await?;
    let mirror = plaintext_mirror(password, security);

    if !state.store.set_password(id, hash, mirror).await? {
        return Err(ApiError::not_found(USER_NOT_FOUND));
    }
    Ok(())
}

/// PUT /api/v1/users/:id/password
///
/// Callers are expected to POST verify-password first; this route does not
/// re-check the old password.
pub async fn change_password(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(request): ValidatedJson<NewPasswordRequest>,
) -> ApiResult<Value> {
    store_password(&state, id, &request.new_password).await?;
    tracing::info!(user_id = %id, "Password changed");
    Ok(ApiResponse::success(json!({ "message": "密码更新成功" })))
}

/// POST /api/v1/users/:id/verify-password
pub async fn verify_password(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(request): ValidatedJson<VerifyPasswordRequest>,
) -> ApiResult<PasswordCheck> {
    let user = state
        .store
        .find_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))?;

    let valid = check_credentials(&user, &request.current_password).await?;
    if !valid {
        tracing::warn!(user_id = %id, "Current password did not match");
    }
    Ok(ApiResponse::success(PasswordCheck { valid }))
}

/// PUT /api/v1/users/:id/reset-password - admin only, no old password needed
pub async fn reset_password(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(request): ValidatedJson<NewPasswordRequest>,
) -> ApiResult<Value> {
    store_password(&state, id, &request.new_password).await?;
    tracing::info!(user_id = %id, admin = %admin.user_id, "Password reset by admin");
    Ok(ApiResponse::success(json!({ "message": "密码重置成功" })))
}
