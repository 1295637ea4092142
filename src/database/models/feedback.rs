use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::middleware::FieldOrder;

use super::UserSummary;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum FeedbackStatus {
    #[default]
    Pending,
    Processing,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Feedback {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub contact: String,
    pub status: FeedbackStatus,
    pub reply: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin listing item: the ticket plus who sent it.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackWithUser {
    #[serde(flatten)]
    pub feedback: Feedback,
    pub user: Option<UserSummary>,
}

/// New tickets always start as `pending`; any status sent here is ignored.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFeedback {
    pub user_id: Uuid,
    #[validate(length(min = 1, message = "反馈内容不能为空"))]
    pub content: String,
    #[validate(length(min = 1, max = 200, message = "联系方式长度必须在1到200个字符之间"))]
    pub contact: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateFeedback {
    pub status: Option<FeedbackStatus>,
    pub reply: Option<String>,
}

impl FieldOrder for CreateFeedback {
    const FIELD_ORDER: &'static [&'static str] = &["user_id", "content", "contact"];
}

impl FieldOrder for UpdateFeedback {}

