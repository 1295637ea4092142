// handlers/users/mod.rs - /api/v1/users
//
// Registration, profile, password and avatar endpoints. User rows never
// leave through a handler without going through `PublicUser` or
// `AdminUserView`.

pub mod avatar;
pub mod login;
pub mod password;
pub mod profile;

pub use avatar::upload_avatar;
pub use login::login;
pub use password::{change_password, reset_password, verify_password};
pub use profile::{create_user, delete_user, get_user, list_users, update_user, user_by_name};

pub(crate) const USER_NOT_FOUND: &str = "用户不存在";
