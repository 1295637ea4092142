use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Category, CreateCategory, CreateTransaction, EntryTotals, EntryType, Feedback, NewUser, Transaction,
    TransactionChanges, TransactionFilter, UpdateCategory, UpdateFeedback, User, UserChanges, UserSummary,
};

/// What a cascading user delete removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeletedUser {
    pub deleted_transactions: u64,
    pub deleted_feedbacks: u64,
}

/// Query contract the handlers issue against the relational store.
///
/// User-scoped entities take the owner id on every read and write so that a
/// row belonging to someone else is indistinguishable from a missing one.
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> Result<(), DatabaseError>;

    // users
    async fn list_users(&self) -> Result<Vec<User>, DatabaseError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;
    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>, DatabaseError>;
    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError>;
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, DatabaseError>;
    /// Returns false when no such user exists.
    async fn set_password(
        &self,
        id: Uuid,
        password_hash: String,
        password_plain: Option<String>,
    ) -> Result<bool, DatabaseError>;
    /// Removes the user with their transactions and feedbacks atomically.
    async fn delete_user_cascade(&self, id: Uuid) -> Result<Option<DeletedUser>, DatabaseError>;
    async fn user_summaries(&self, ids: &[Uuid]) -> Result<Vec<UserSummary>, DatabaseError>;

    // categories
    async fn list_categories(&self, kind: Option<EntryType>) -> Result<Vec<Category>, DatabaseError>;
    async fn find_category(&self, id: Uuid) -> Result<Option<Category>, DatabaseError>;
    async fn insert_category(&self, category: CreateCategory) -> Result<Category, DatabaseError>;
    async fn update_category(&self, id: Uuid, changes: UpdateCategory) -> Result<Option<Category>, DatabaseError>;
    async fn delete_category(&self, id: Uuid) -> Result<bool, DatabaseError>;

    // transactions
    async fn list_transactions(
        &self,
        user_id: Uuid,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>, DatabaseError>;
    async fn find_transaction(&self, id: Uuid, user_id: Uuid) -> Result<Option<Transaction>, DatabaseError>;
    async fn insert_transaction(&self, transaction: CreateTransaction) -> Result<Transaction, DatabaseError>;
    async fn update_transaction(
        &self,
        id: Uuid,
        user_id: Uuid,
        changes: TransactionChanges,
    ) -> Result<Option<Transaction>, DatabaseError>;
    async fn delete_transaction(&self, id: Uuid, user_id: Uuid) -> Result<bool, DatabaseError>;
    async fn clear_transactions(&self, user_id: Uuid) -> Result<u64, DatabaseError>;
    async fn transaction_totals(&self, user_id: Uuid) -> Result<EntryTotals, DatabaseError>;

    // feedbacks
    async fn list_feedbacks(&self, user_id: Option<Uuid>) -> Result<Vec<Feedback>, DatabaseError>;
    async fn find_feedback(&self, id: Uuid) -> Result<Option<Feedback>, DatabaseError>;
    async fn insert_feedback(&self, user_id: Uuid, content: String, contact: String) -> Result<Feedback, DatabaseError>;
    async fn update_feedback(&self, id: Uuid, changes: UpdateFeedback) -> Result<Option<Feedback>, DatabaseError>;
    async fn delete_feedback(&self, id: Uuid) -> Result<bool, DatabaseError>;
}

pub type SharedStore = Arc<dyn Store>;
