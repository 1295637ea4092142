use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::auth::{check_credentials, generate_jwt, Claims};
use crate::database::models::PublicUser;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, FieldOrder, ValidatedJson};
use crate::AppState;

const BAD_CREDENTIALS: &str = "用户名或密码错误";

#[derive(Debug, Deserialize, validator::Validate)]
pub struct LoginRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
}

impl FieldOrder for LoginRequest {}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: PublicUser,
    pub token: String,
}

/// POST /api/v1/users/login
///
/// Unknown names and wrong passwords get the same 401.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    if request.name.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("用户名和密码不能为空"));
    }

    let Some(user) = state.store.find_user_by_name(&request.name).await? else {
        tracing::warn!(name = %request.name, "Login failed");
        return Err(ApiError::unauthorized(BAD_CREDENTIALS));
    };

    if !check_credentials(&user, &request.password).await? {
        tracing::warn!(name = %request.name, "Login failed");
        return Err(ApiError::unauthorized(BAD_CREDENTIALS));
    }

    let security = &state.config.security;
    let token = generate_jwt(&Claims::for_user(&user, security.jwt_expiry_hours)?, security)?;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(ApiResponse::success(LoginResponse {
        user: PublicUser::from(user),
        token,
    }))
}
