pub mod auth;
pub mod extract;
pub mod response;

pub use auth::{jwt_auth_middleware, require_admin, AdminUser, AuthUser};
pub use extract::{ApiPath, ApiQuery, FieldOrder, ValidatedJson};
pub use response::{ApiResponse, ApiResult};
