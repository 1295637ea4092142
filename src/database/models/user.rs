use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::middleware::FieldOrder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum AvatarType {
    Preset,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// Full `users` row. Not `Serialize`: the password hash and the
/// plaintext mirror can only leave the process through `PublicUser` or
/// `AdminUserView`.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub nickname: Option<String>,
    pub password: String,
    pub password_plain: Option<String>,
    pub avatar: Option<String>,
    pub avatar_type: Option<AvatarType>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub nickname: Option<String>,
    pub avatar: Option<String>,
    pub avatar_type: Option<AvatarType>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            nickname: user.nickname.clone(),
            avatar: user.avatar.clone(),
            avatar_type: user.avatar_type,
            avatar_url: user.avatar_url.clone(),
            bio: user.bio.clone(),
            age: user.age,
            gender: user.gender,
            is_admin: user.is_admin,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        PublicUser::from(&user)
    }
}

/// Row of the admin user listing. The mirror is only filled in while plaintext
/// retention is switched on.
#[derive(Debug, Clone, Serialize)]
pub struct AdminUserView {
    #[serde(flatten)]
    pub user: PublicUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_plain: Option<String>,
}

impl AdminUserView {
    pub fn new(user: &User, include_plaintext: bool) -> Self {
        Self {
            user: PublicUser::from(user),
            password_plain: if include_plaintext { user.password_plain.clone() } else { None },
        }
    }
}

/// The `user` object embedded in feedback listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub nickname: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            nickname: user.nickname.clone(),
        }
    }
}

/// POST /users payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(length(min = 1, max = 50, message = "用户名长度必须在1到50个字符之间"))]
    pub name: String,
    #[validate(length(min = 1, message = "密码不能为空"))]
    pub password: String,
    #[validate(length(max = 50, message = "昵称不能超过50个字符"))]
    pub nickname: Option<String>,
    #[validate(length(max = 50, message = "头像名称不能超过50个字符"))]
    pub avatar: Option<String>,
    pub avatar_type: Option<AvatarType>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    #[validate(range(min = 0, max = 150, message = "年龄必须在0到150之间"))]
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    #[serde(default)]
    pub is_admin: bool,
}

/// PUT /users/:id payload. Only supplied fields change.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUser {
    /// Accepted only when equal to the stored name; login names are immutable.
    pub name: Option<String>,
    #[validate(length(max = 50, message = "昵称不能超过50个字符"))]
    pub nickname: Option<String>,
    #[validate(length(max = 50, message = "头像名称不能超过50个字符"))]
    pub avatar: Option<String>,
    pub avatar_type: Option<AvatarType>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    #[validate(range(min = 0, max = 150, message = "年龄必须在0到150之间"))]
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub is_admin: Option<bool>,
}

impl UpdateUser {
    pub fn into_changes(self) -> UserChanges {
        UserChanges {
            nickname: self.nickname,
            avatar: self.avatar,
            avatar_type: self.avatar_type,
            avatar_url: self.avatar_url,
            bio: self.bio,
            age: self.age,
            gender: self.gender,
            is_admin: self.is_admin,
        }
    }
}

/// Insert shape handed to the store, password already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub password_hash: String,
    pub password_plain: Option<String>,
    pub nickname: Option<String>,
    pub avatar: Option<String>,
    pub avatar_type: Option<AvatarType>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub is_admin: bool,
}

impl NewUser {
    pub fn from_request(request: CreateUser, password_hash: String, password_plain: Option<String>) -> Self {
        Self {
            name: request.name,
            password_hash,
            password_plain,
            nickname: request.nickname,
            avatar: request.avatar,
            avatar_type: request.avatar_type,
            avatar_url: request.avatar_url,
            bio: request.bio,
            age: request.age,
            gender: request.gender,
            is_admin: request.is_admin,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub nickname: Option<String>,
    pub avatar: Option<String>,
    pub avatar_type: Option<AvatarType>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub is_admin: Option<bool>,
}

impl FieldOrder for CreateUser {
    const FIELD_ORDER: &'static [&'static str] = &[
        "name", "password", "nickname", "avatar", "avatar_type", "avatar_url", "bio", "age", "gender", "is_admin",
    ];
}

impl FieldOrder for UpdateUser {
    const FIELD_ORDER: &'static [&'static str] = CreateUser::FIELD_ORDER;
}


#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: "安安".to_string(),
            nickname: Some("anan".to_string()),
            password: "$2b$10$abcdefghijklmnopqrstuv".to_string(),
            password_plain: Some("1234".to_string()),
            avatar: None,
            avatar_type: Some(AvatarType::Preset),
            avatar_url: None,
            bio: None,
            age: Some(8),
            gender: Some(Gender::Female),
            is_admin: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn public_user_never_serializes_password_fields() {
        let value = serde_json::to_value(PublicUser::from(&sample_user())).unwrap();
        assert!(value.get("password").is_none());
        assert!(value.get("password_plain").is_none());
        assert_eq!(value["avatar_type"], "preset");
        assert_eq!(value["gender"], "female");
    }

    #[test]
    fn admin_view_includes_mirror_only_when_asked() {
        let user = sample_user();
        let hidden = serde_json::to_value(AdminUserView::new(&user, false)).unwrap();
        assert!(hidden.get("password_plain").is_none());
        assert!(hidden.get("password").is_none());
        assert_eq!(hidden["name"], "安安");

        let shown = serde_json::to_value(AdminUserView::new(&user, true)).unwrap();
        assert_eq!(shown["password_plain"], "1234");
        assert!(shown.get("password").is_none());
    }

    #[test]
    fn create_user_length_limits_count_characters() {
        let request: CreateUser = serde_json::from_value(serde_json::json!({
            "name": "安".repeat(50),
            "password": "1234"
        }))
        .unwrap();
        assert!(request.validate().is_ok());

        let too_long: CreateUser = serde_json::from_value(serde_json::json!({
            "name": "安".repeat(51),
            "password": "1234"
        }))
        .unwrap();
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn unknown_gender_is_rejected_at_parse_time() {
        let result = serde_json::from_value::<UpdateUser>(serde_json::json!({ "gender": "other" }));
        assert!(result.is_err());
    }
}
