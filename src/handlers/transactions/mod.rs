// handlers/transactions/mod.rs - /api/v1/transactions
//
// Every route needs the owner's `user_id`. A transaction belonging to
// someone else answers exactly like a missing one.

pub mod stats;

use axum::extract::State;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::{CreateTransaction, Transaction, TransactionFilter, TypeFilter, UpdateTransaction};
use crate::error::ApiError;
use crate::events::LedgerEvent;
use crate::handlers::require_user_id;
use crate::middleware::{ApiPath, ApiQuery, ApiResponse, ApiResult, ValidatedJson};
use crate::AppState;

pub use stats::{monthly_rollup, period_summary, transaction_stats};

const TRANSACTION_NOT_FOUND: &str = "Transaction not found";

#[derive(Debug, Default, Deserialize)]
pub struct OwnerQuery {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub user_id: Option<Uuid>,
    #[serde(rename = "type", default)]
    pub kind: TypeFilter,
    pub category_id: Option<Uuid>,
}

impl ListQuery {
    pub fn filter(&self) -> TransactionFilter {
        TransactionFilter::new(self.kind, self.category_id)
    }
}

#[derive(Debug, Serialize)]
pub struct ClearedTransactions {
    pub deleted: u64,
}

/// GET /api/v1/transactions?user_id=&type=&category_id=
pub async fn list_transactions(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Vec<Transaction>> {
    let user_id = require_user_id(query.user_id)?;
    let transactions = state.store.list_transactions(user_id, query.filter()).await?;
    Ok(ApiResponse::success(transactions))
}

/// GET /api/v1/transactions/:id?user_id=
pub async fn get_transaction(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<OwnerQuery>,
) -> ApiResult<Transaction> {
    let user_id = require_user_id(query.user_id)?;
    state
        .store
        .find_transaction(id, user_id)
        .await?
        .map(ApiResponse::success)
        .ok_or_else(|| ApiError::not_found(TRANSACTION_NOT_FOUND))
}

/// POST /api/v1/transactions
pub async fn create_transaction(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateTransaction>,
) -> ApiResult<Transaction> {
    let transaction = state.store.insert_transaction(request).await?;

    tracing::info!(
        transaction_id = %transaction.id,
        user_id = %transaction.user_id,
        kind = %transaction.kind,
        amount = %transaction.amount,
        "Created transaction"
    );
    state.events.publish(LedgerEvent::TransactionAdded {
        user_id: transaction.user_id,
        transaction_id: transaction.id,
    });
    Ok(ApiResponse::created(transaction))
}

/// PUT /api/v1/transactions/:id?user_id=
///
/// The owner may also be sent as `user_id` in the body.
pub async fn update_transaction(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<OwnerQuery>,
    ValidatedJson(request): ValidatedJson<UpdateTransaction>,
) -> ApiResult<Transaction> {
    let user_id = require_user_id(query.user_id.or(request.user_id))?;
    let transaction = state
        .store
        .update_transaction(id, user_id, request.into_changes())
        .await?
        .ok_or_else(|| ApiError::not_found(TRANSACTION_NOT_FOUND))?;

    tracing::info!(transaction_id = %id, user_id = %user_id, "Updated transaction");
    state.events.publish(LedgerEvent::TransactionUpdated {
        user_id,
        transaction_id: id,
    });
    Ok(ApiResponse::success(transaction))
}

/// DELETE /api/v1/transactions/:id?user_id=
pub async fn delete_transaction(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<OwnerQuery>,
) -> ApiResult<()> {
    let user_id = require_user_id(query.user_id)?;
    if !state.store.delete_transaction(id, user_id).await? {
        return Err(ApiError::not_found(TRANSACTION_NOT_FOUND));
    }

    tracing::info!(transaction_id = %id, user_id = %user_id, "Deleted transaction");
    state.events.publish(LedgerEvent::TransactionDeleted {
        user_id,
        transaction_id: id,
    });
    Ok(ApiResponse::no_content())
}

/// DELETE /api/v1/transactions/clear-all?user_id=
pub async fn clear_transactions(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OwnerQuery>,
) -> ApiResult<ClearedTransactions> {
    let user_id = require_user_id(query.user_id)?;
    let deleted = state.store.clear_transactions(user_id).await?;

    tracing::info!(user_id = %user_id, deleted, "Cleared transactions");
    state.events.publish(LedgerEvent::TransactionsCleared {
        user_id,
        count: deleted,
    });
    Ok(ApiResponse::success(ClearedTransactions { deleted }))
}
