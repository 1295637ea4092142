// handlers/mod.rs - HTTP handlers grouped by resource
//
// Every route lives under /api/v1. Users and categories are global;
// transactions and feedbacks are scoped by the `user_id` the caller sends.
// Admin-only operations additionally need a bearer token from
// POST /users/login whose claims carry the admin flag.

pub mod categories;
pub mod feedbacks;
pub mod health;
pub mod transactions;
pub mod users;

use uuid::Uuid;

use crate::error::ApiError;

/// Owner id from the query string, rejected when absent.
pub(crate) fn require_user_id(user_id: Option<Uuid>) -> Result<Uuid, ApiError> {
    user_id.ok_or_else(|| ApiError::bad_request("user_id is required"))
}
