use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers::{categories, feedbacks, health, transactions, users};
use crate::middleware::jwt_auth_middleware;
use crate::AppState;

/// Full HTTP surface, ready for `axum::serve` or `oneshot` in tests.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health::health))
        .merge(user_routes(&state))
        .merge(category_routes())
        .merge(transaction_routes())
        .merge(feedback_routes());

    let mut router = Router::new()
        .route("/", get(health::root))
        .nest("/api/v1", api)
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes));

    if state.config.security.enable_cors {
        router = router.layer(cors_layer(&state.config.security));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

fn user_routes(state: &AppState) -> Router<AppState> {
    let upload_limit = DefaultBodyLimit::max(state.config.api.max_upload_size_bytes);

    Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/login", post(users::login))
        .route("/users/upload-avatar", post(users::upload_avatar).layer(upload_limit))
        .route("/users/by-name/:name", get(users::user_by_name))
        .route(
            "/users/:id",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        .route("/users/:id/password", put(users::change_password))
        .route("/users/:id/verify-password", post(users::verify_password))
        .route("/users/:id/reset-password", put(users::reset_password))
}

fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/categories/:id",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
}

fn transaction_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/transactions",
            get(transactions::list_transactions).post(transactions::create_transaction),
        )
        .route("/transactions/stats", get(transactions::transaction_stats))
        .route("/transactions/stats/monthly", get(transactions::monthly_rollup))
        .route("/transactions/stats/summary", get(transactions::period_summary))
        .route("/transactions/clear-all", delete(transactions::clear_transactions))
        .route(
            "/transactions/:id",
            get(transactions::get_transaction)
                .put(transactions::update_transaction)
                .delete(transactions::delete_transaction),
        )
}

fn feedback_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/feedbacks",
            get(feedbacks::list_feedbacks).post(feedbacks::create_feedback),
        )
        .route("/feedbacks/clear-read", post(feedbacks::clear_read_feedbacks))
        .route("/feedbacks/user/:user_id", get(feedbacks::user_feedbacks))
        .route(
            "/feedbacks/:id",
            get(feedbacks::get_feedback)
                .put(feedbacks::update_feedback)
                .delete(feedbacks::delete_feedback),
        )
}
