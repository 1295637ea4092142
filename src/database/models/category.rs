use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::middleware::FieldOrder;

use super::EntryType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: EntryType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCategory {
    #[validate(length(min = 1, max = 50, message = "分类名称长度必须在1到50个字符之间"))]
    pub name: String,
    #[validate(length(max = 50, message = "图标名称不能超过50个字符"))]
    pub icon: Option<String>,
    #[validate(length(max = 20, message = "颜色值不能超过20个字符"))]
    pub color: Option<String>,
    #[serde(rename = "type")]
    pub kind: EntryType,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCategory {
    #[validate(length(min = 1, max = 50, message = "分类名称长度必须在1到50个字符之间"))]
    pub name: Option<String>,
    #[validate(length(max = 50, message = "图标名称不能超过50个字符"))]
    pub icon: Option<String>,
    #[validate(length(max = 20, message = "颜色值不能超过20个字符"))]
    pub color: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<EntryType>,
}

impl FieldOrder for CreateCategory {
    const FIELD_ORDER: &'static [&'static str] = &["name", "icon", "color", "type"];
}

impl FieldOrder for UpdateCategory {
    const FIELD_ORDER: &'static [&'static str] = CreateCategory::FIELD_ORDER;
}

