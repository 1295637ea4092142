use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::auth::{decode_jwt, Claims};
use crate::error::ApiError;
use crate::AppState;

/// Identity carried by a valid bearer token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub name: String,
    pub is_admin: bool,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            name: claims.name,
            is_admin: claims.is_admin,
        }
    }
}

/// Decodes a bearer token when one is sent.
///
/// Requests without an Authorization header pass through untouched; most
/// routes are scoped by `user_id` rather than by session. A header that is
/// present but malformed or expired is rejected with 401.
pub async fn jwt_auth_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    match extract_jwt_from_headers(request.headers()) {
        Ok(None) => {}
        Ok(Some(token)) => match decode_jwt(&token, &state.config.security) {
            Ok(claims) => {
                request.extensions_mut().insert(AuthUser::from(claims));
            }
            Err(e) => {
                tracing::warn!("Rejected bearer token: {}", e);
                return ApiError::unauthorized("登录已过期，请重新登录").into_response();
            }
        },
        Err(msg) => return ApiError::unauthorized(msg).into_response(),
    }

    next.run(request).await
}

fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<Option<String>, &'static str> {
    let Some(auth_header) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.trim().to_string())),
        Some(_) => Err("Empty JWT token"),
        None => Err("Authorization header must use Bearer token format"),
    }
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("请先登录"))
    }
}

/// An `AuthUser` whose token carries the admin flag
#[derive(Clone, Debug)]
pub struct AdminUser(pub AuthUser);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            return Err(ApiError::forbidden("需要管理员权限"));
        }
        Ok(AdminUser(user))
    }
}

/// Fails with the right status when the caller is not an admin.
pub fn require_admin(auth: Option<&AuthUser>) -> Result<&AuthUser, ApiError> {
    match auth {
        None => Err(ApiError::unauthorized("请先登录")),
        Some(user) if !user.is_admin => Err(ApiError::forbidden("需要管理员权限")),
        Some(user) => Ok(user),
    }
}
