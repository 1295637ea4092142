// handlers/feedbacks.rs - /api/v1/feedbacks
//
// Owners reach their own tickets by `user_id`. Status changes, replies and
// the full listing are for admins.

use std::collections::HashMap;

use axum::extract::State;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::database::models::{CreateFeedback, Feedback, FeedbackWithUser, UpdateFeedback};
use crate::error::ApiError;
use crate::events::LedgerEvent;
use crate::handlers::users::USER_NOT_FOUND;
use crate::middleware::{
    require_admin, AdminUser, ApiPath, ApiQuery, ApiResponse, ApiResult, AuthUser, FieldOrder, ValidatedJson,
};
use crate::services::{clear_feedbacks, ClearReport};
use crate::AppState;

const FEEDBACK_NOT_FOUND: &str = "反馈不存在";
const RECORD_NOT_FOUND: &str = "记录不存在";

#[derive(Debug, Default, Deserialize)]
pub struct FeedbackQuery {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub admin: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ClearReadRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub ids: Vec<Uuid>,
}

impl FieldOrder for ClearReadRequest {}

/// Own tickets for `?user_id=`, everyone's (with sender) for admins.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum FeedbackList {
    Owned(Vec<Feedback>),
    All(Vec<FeedbackWithUser>),
}

/// POST /api/v1/feedbacks - always starts as `pending`
pub async fn create_feedback(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateFeedback>,
) -> ApiResult<Feedback> {
    if state.store.find_user(request.user_id).await?.is_none() {
        return Err(ApiError::not_found(USER_NOT_FOUND));
    }

    let feedback = state
        .store
        .insert_feedback(request.user_id, request.content, request.contact)
        .await?;

    tracing::info!(feedback_id = %feedback.id, user_id = %feedback.user_id, "Created feedback");
    state.events.publish(LedgerEvent::FeedbackCreated {
        user_id: feedback.user_id,
        feedback_id: feedback.id,
    });
    Ok(ApiResponse::created(feedback))
}

/// GET /api/v1/feedbacks[?user_id=]
pub async fn list_feedbacks(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    ApiQuery(query): ApiQuery<FeedbackQuery>,
) -> ApiResult<FeedbackList> {
    if let Some(user_id) = query.user_id {
        let feedbacks = state.store.list_feedbacks(Some(user_id)).await?;
        return Ok(ApiResponse::success(FeedbackList::Owned(feedbacks)));
    }

    require_admin(auth.as_ref())?;
    let feedbacks = state.store.list_feedbacks(None).await?;

    let mut user_ids: Vec<Uuid> = feedbacks.iter().map(|f| f.user_id).collect();
    user_ids.sort_unstable();
    user_ids.dedup();
    let senders: HashMap<Uuid, _> = state
        .store
        .user_summaries(&user_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let listing = feedbacks
        .into_iter()
        .map(|feedback| {
            let user = senders.get(&feedback.user_id).cloned();
            FeedbackWithUser { feedback, user }
        })
        .collect();
    Ok(ApiResponse::success(FeedbackList::All(listing)))
}

/// GET /api/v1/feedbacks/user/:user_id
pub async fn user_feedbacks(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> ApiResult<Vec<Feedback>> {
    let feedbacks = state.store.list_feedbacks(Some(user_id)).await?;
    Ok(ApiResponse::success(feedbacks))
}

/// GET /api/v1/feedbacks/:id?user_id=
///
/// Without `user_id` only an admin may read the ticket.
pub async fn get_feedback(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    auth: Option<AuthUser>,
    ApiQuery(query): ApiQuery<FeedbackQuery>,
) -> ApiResult<Feedback> {
    if query.user_id.is_none() {
        require_admin(auth.as_ref())?;
    }

    state
        .store
        .find_feedback(id)
        .await?
        .filter(|f| query.user_id.map_or(true, |owner| f.user_id == owner))
        .map(ApiResponse::success)
        .ok_or_else(|| ApiError::not_found(FEEDBACK_NOT_FOUND))
}

/// PUT /api/v1/feedbacks/:id - admin sets status and/or reply
pub async fn update_feedback(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateFeedback>,
) -> ApiResult<Feedback> {
    let feedback = state
        .store
        .update_feedback(id, request)
        .await?
        .ok_or_else(|| ApiError::not_found(FEEDBACK_NOT_FOUND))?;

    tracing::info!(feedback_id = %id, admin = %admin.user_id, status = ?feedback.status, "Updated feedback");
    Ok(ApiResponse::success(feedback))
}

/// DELETE /api/v1/feedbacks/:id?user_id= or ?admin=true
pub async fn delete_feedback(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    auth: Option<AuthUser>,
    ApiQuery(query): ApiQuery<DeleteQuery>,
) -> ApiResult<()> {
    if query.admin {
        require_admin(auth.as_ref())?;
    } else {
        let user_id = query.user_id.ok_or_else(|| ApiError::bad_request("缺少用户ID"))?;
        let existing = state
            .store
            .find_feedback(id)
            .await?
            .ok_or_else(|| ApiError::not_found(RECORD_NOT_FOUND))?;
        if existing.user_id != user_id {
            tracing::warn!(feedback_id = %id, user_id = %user_id, "Refused to delete another user's feedback");
            return Err(ApiError::forbidden("无权删除此记录"));
        }
    }

    if !state.store.delete_feedback(id).await? {
        return Err(ApiError::not_found(RECORD_NOT_FOUND));
    }

    tracing::info!(feedback_id = %id, admin = query.admin, "Deleted feedback");
    state.events.publish(LedgerEvent::FeedbackDeleted { feedback_id: id });
    Ok(ApiResponse::no_content())
}

/// POST /api/v1/feedbacks/clear-read - delete the user's read tickets, one by one
pub async fn clear_read_feedbacks(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ClearReadRequest>,
) -> ApiResult<ClearReport> {
    let concurrency = state.config.api.bulk_delete_concurrency;
    let report = clear_feedbacks(state.store.as_ref(), request.user_id, &request.ids, concurrency).await;

    tracing::info!(
        user_id = %request.user_id,
        requested = report.requested,
        cleared = report.cleared,
        "Cleared read feedback"
    );
    for id in &report.cleared_ids {
        state.events.publish(LedgerEvent::FeedbackDeleted { feedback_id: *id });
    }
    Ok(ApiResponse::success(report))
}
