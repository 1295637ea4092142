use axum::extract::State;
use chrono::Utc;

use crate::database::models::TransactionFilter;
use crate::handlers::require_user_id;
use crate::middleware::{ApiQuery, ApiResponse, ApiResult};
use crate::services::{rollup_by_month, summarize_period, Balance, MonthlyRollup, PeriodSummary};
use crate::AppState;

use super::{ListQuery, OwnerQuery};

/// GET /api/v1/transactions/stats?user_id=
pub async fn transaction_stats(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OwnerQuery>,
) -> ApiResult<Balance> {
    let user_id = require_user_id(query.user_id)?;
    let totals = state.store.transaction_totals(user_id).await?;
    Ok(ApiResponse::success(Balance::from(totals)))
}

/// GET /api/v1/transactions/stats/monthly?user_id=&category_id=&type=
pub async fn monthly_rollup(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<MonthlyRollup> {
    let user_id = require_user_id(query.user_id)?;
    let transactions = state.store.list_transactions(user_id, query.filter()).await?;
    Ok(ApiResponse::success(rollup_by_month(&transactions)))
}

/// GET /api/v1/transactions/stats/summary?user_id= - this month and this year
pub async fn period_summary(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OwnerQuery>,
) -> ApiResult<PeriodSummary> {
    let user_id = require_user_id(query.user_id)?;
    let transactions = state
        .store
        .list_transactions(user_id, TransactionFilter::default())
        .await?;
    Ok(ApiResponse::success(summarize_period(&transactions, Utc::now())))
}
