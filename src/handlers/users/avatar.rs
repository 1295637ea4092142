use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
};
use serde::Serialize;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::ingest_avatar;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct UploadedAvatar {
    pub url: String,
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("图片太大，请选择较小的图片")
    } else {
        ApiError::bad_request(e.body_text())
    }
}

/// POST /api/v1/users/upload-avatar - multipart `file` + `userId`
///
/// Returns the compressed data URI only. The caller stores it with a
/// profile update once the user confirms.
pub async fn upload_avatar(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<UploadedAvatar> {
    let mut multipart = multipart.map_err(|_| ApiError::bad_request("请选择要上传的图片"))?;
    let mut file: Option<Vec<u8>> = None;
    let mut user_id: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => file = Some(field.bytes().await.map_err(multipart_error)?.to_vec()),
            Some("userId") => user_id = Some(field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }

    let file = file
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| ApiError::bad_request("请选择要上传的图片"))?;
    let user_id = user_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("用户ID不能为空"))?;

    let original_size = file.len();
    let url = ingest_avatar(file, state.config.avatar.clone()).await?;

    tracing::info!(user_id = %user_id, original_size, data_uri_size = url.len(), "Compressed avatar");
    Ok(ApiResponse::success(UploadedAvatar { url }))
}
