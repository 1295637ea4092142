use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Category, CreateCategory, CreateTransaction, EntryTotals, EntryType, Feedback, FeedbackStatus, NewUser,
    Transaction, TransactionChanges, TransactionFilter, UpdateCategory, UpdateFeedback, User, UserChanges,
    UserSummary,
};
use crate::database::store::{DeletedUser, Store};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    categories: Vec<Category>,
    transactions: Vec<Transaction>,
    feedbacks: Vec<Feedback>,
}

/// Process-local store with the same ordering and ownership rules as `PgStore`.
///
/// Used by the test suite and by `STORE_BACKEND=memory` for local demos.
/// Rows are kept in insertion order; listing sorts newest first and falls
/// back to reverse insertion order on equal timestamps.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T: Clone, K: Ord>(rows: impl DoubleEndedIterator<Item = T>, key: impl Fn(&T) -> K) -> Vec<T> {
    let mut rows: Vec<T> = rows.rev().collect();
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
    rows
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(newest_first(tables.users.iter().cloned(), |u| u.created_at))
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.name == name).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.name == user.name) {
            return Err(DatabaseError::Conflict("user name already exists".to_string()));
        }

        let now = Utc::now();
        let row = User {
            id: Uuid::new_v4(),
            name: user.name,
            nickname: user.nickname,
            password: user.password_hash,
            password_plain: user.password_plain,
            avatar: user.avatar,
            avatar_type: user.avatar_type,
            avatar_url: user.avatar_url,
            bio: user.bio,
            age: user.age,
            gender: user.gender,
            is_admin: user.is_admin,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(row.clone());
        Ok(row)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };

        if changes.nickname.is_some() {
            user.nickname = changes.nickname;
        }
        if changes.avatar.is_some() {
            user.avatar = changes.avatar;
        }
        if changes.avatar_type.is_some() {
            user.avatar_type = changes.avatar_type;
        }
        if changes.avatar_url.is_some() {
            user.avatar_url = changes.avatar_url;
        }
        if changes.bio.is_some() {
            user.bio = changes.bio;
        }
        if changes.age.is_some() {
            user.age = changes.age;
        }
        if changes.gender.is_some() {
            user.gender = changes.gender;
        }
        if let Some(is_admin) = changes.is_admin {
            user.is_admin = is_admin;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn set_password(
        &self,
        id: Uuid,
        password_hash: String,
        password_plain: Option<String>,
    ) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        match tables.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password = password_hash;
                user.password_plain = password_plain;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user_cascade(&self, id: Uuid) -> Result<Option<DeletedUser>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let Some(position) = tables.users.iter().position(|u| u.id == id) else {
            return Ok(None);
        };
        tables.users.remove(position);

        let before = tables.transactions.len();
        tables.transactions.retain(|t| t.user_id != id);
        let deleted_transactions = (before - tables.transactions.len()) as u64;

        let before = tables.feedbacks.len();
        tables.feedbacks.retain(|f| f.user_id != id);
        let deleted_feedbacks = (before - tables.feedbacks.len()) as u64;

        Ok(Some(DeletedUser {
            deleted_transactions,
            deleted_feedbacks,
        }))
    }

    async fn user_summaries(&self, ids: &[Uuid]) -> Result<Vec<UserSummary>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .map(UserSummary::from)
            .collect())
    }

    async fn list_categories(&self, kind: Option<EntryType>) -> Result<Vec<Category>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Category> = tables
            .categories
            .iter()
            .filter(|c| kind.map_or(true, |k| c.kind == k))
            .cloned()
            .collect();
        rows.sort_by_key(|c| c.created_at);
        Ok(rows)
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn insert_category(&self, category: CreateCategory) -> Result<Category, DatabaseError> {
        let mut tables = self.tables.write().await;
        let row = Category {
            id: Uuid::new_v4(),
            name: category.name,
            icon: category.icon,
            color: category.color,
            kind: category.kind,
            created_at: Utc::now(),
        };
        tables.categories.push(row.clone());
        Ok(row)
    }

    async fn update_category(&self, id: Uuid, changes: UpdateCategory) -> Result<Option<Category>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let Some(category) = tables.categories.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            category.name = name;
        }
        if changes.icon.is_some() {
            category.icon = changes.icon;
        }
        if changes.color.is_some() {
            category.color = changes.color;
        }
        if let Some(kind) = changes.kind {
            category.kind = kind;
        }
        Ok(Some(category.clone()))
    }

    async fn delete_category(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        let before = tables.categories.len();
        tables.categories.retain(|c| c.id != id);
        Ok(tables.categories.len() < before)
    }

    async fn list_transactions(
        &self,
        user_id: Uuid,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>, DatabaseError> {
        let tables = self.tables.read().await;
        let owned = tables.transactions.iter().filter(|t| t.user_id == user_id);
        let matching = filter.apply(owned);
        Ok(newest_first(matching.into_iter(), |t| (t.transaction_date, t.created_at)))
    }

    async fn find_transaction(&self, id: Uuid, user_id: Uuid) -> Result<Option<Transaction>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .transactions
            .iter()
            .find(|t| t.id == id && t.user_id == user_id)
            .cloned())
    }

    async fn insert_transaction(&self, transaction: CreateTransaction) -> Result<Transaction, DatabaseError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let row = Transaction {
            id: Uuid::new_v4(),
            user_id: transaction.user_id,
            amount: transaction.amount,
            kind: transaction.kind,
            category_id: transaction.category_id,
            description: transaction.description,
            transaction_date: transaction.transaction_date.unwrap_or(now),
            created_at: now,
        };
        tables.transactions.push(row.clone());
        Ok(row)
    }

    async fn update_transaction(
        &self,
        id: Uuid,
        user_id: Uuid,
        changes: TransactionChanges,
    ) -> Result<Option<Transaction>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let Some(transaction) = tables
            .transactions
            .iter_mut()
            .find(|t| t.id == id && t.user_id == user_id)
        else {
            return Ok(None);
        };
        if let Some(amount) = changes.amount {
            transaction.amount = amount;
        }
        if let Some(kind) = changes.kind {
            transaction.kind = kind;
        }
        if changes.category_id.is_some() {
            transaction.category_id = changes.category_id;
        }
        if changes.description.is_some() {
            transaction.description = changes.description;
        }
        if let Some(date) = changes.transaction_date {
            transaction.transaction_date = date;
        }
        Ok(Some(transaction.clone()))
    }

    async fn delete_transaction(&self, id: Uuid, user_id: Uuid) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        let before = tables.transactions.len();
        tables.transactions.retain(|t| !(t.id == id && t.user_id == user_id));
        Ok(tables.transactions.len() < before)
    }

    async fn clear_transactions(&self, user_id: Uuid) -> Result<u64, DatabaseError> {
        let mut tables = self.tables.write().await;
        let before = tables.transactions.len();
        tables.transactions.retain(|t| t.user_id != user_id);
        Ok((before - tables.transactions.len()) as u64)
    }

    async fn transaction_totals(&self, user_id: Uuid) -> Result<EntryTotals, DatabaseError> {
        let tables = self.tables.read().await;
        let mut totals = EntryTotals {
            income: Decimal::ZERO,
            expense: Decimal::ZERO,
        };
        for transaction in tables.transactions.iter().filter(|t| t.user_id == user_id) {
            match transaction.kind {
                EntryType::Income => totals.income += transaction.amount.value(),
                EntryType::Expense => totals.expense += transaction.amount.value(),
            }
        }
        Ok(totals)
    }

    async fn list_feedbacks(&self, user_id: Option<Uuid>) -> Result<Vec<Feedback>, DatabaseError> {
        let tables = self.tables.read().await;
        let rows = tables
            .feedbacks
            .iter()
            .filter(|f| user_id.map_or(true, |id| f.user_id == id))
            .cloned()
            .collect::<Vec<_>>();
        Ok(newest_first(rows.into_iter(), |f| f.created_at))
    }

    async fn find_feedback(&self, id: Uuid) -> Result<Option<Feedback>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.feedbacks.iter().find(|f| f.id == id).cloned())
    }

    async fn insert_feedback(&self, user_id: Uuid, content: String, contact: String) -> Result<Feedback, DatabaseError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let row = Feedback {
            id: Uuid::new_v4(),
            user_id,
            content,
            contact,
            status: FeedbackStatus::Pending,
            reply: None,
            created_at: now,
            updated_at: now,
        };
        tables.feedbacks.push(row.clone());
        Ok(row)
    }

    async fn update_feedback(&self, id: Uuid, changes: UpdateFeedback) -> Result<Option<Feedback>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let Some(feedback) = tables.feedbacks.iter_mut().find(|f| f.id == id) else {
            return Ok(None);
        };
        if let Some(status) = changes.status {
            feedback.status = status;
        }
        if changes.reply.is_some() {
            feedback.reply = changes.reply;
        }
        feedback.updated_at = Utc::now();
        Ok(Some(feedback.clone()))
    }

    async fn delete_feedback(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        let before = tables.feedbacks.len();
        tables.feedbacks.retain(|f| f.id != id);
        Ok(tables.feedbacks.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Amount;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            password_hash: "hash".to_string(),
            password_plain: None,
            nickname: None,
            avatar: None,
            avatar_type: None,
            avatar_url: None,
            bio: None,
            age: None,
            gender: None,
            is_admin: false,
        }
    }

    fn expense(user_id: Uuid, amount: &str) -> CreateTransaction {
        CreateTransaction {
            amount: amount.parse::<Amount>().unwrap(),
            kind: EntryType::Expense,
            category_id: None,
            description: None,
            transaction_date: None,
            user_id,
        }
    }

    #[tokio::test]
    async fn duplicate_names_conflict() {
        let store = MemoryStore::new();
        store.insert_user(new_user("a")).await.unwrap();
        let err = store.insert_user(new_user("a")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));
    }

    #[tokio::test]
    async fn transactions_are_invisible_to_other_users() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let row = store.insert_transaction(expense(owner, "3.00")).await.unwrap();

        assert!(store.find_transaction(row.id, stranger).await.unwrap().is_none());
        assert!(!store.delete_transaction(row.id, stranger).await.unwrap());
        assert!(store.delete_transaction(row.id, owner).await.unwrap());
        assert!(!store.delete_transaction(row.id, owner).await.unwrap());
    }

    #[tokio::test]
    async fn cascade_counts_removed_rows() {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("b")).await.unwrap();
        store.insert_transaction(expense(user.id, "1.00")).await.unwrap();
        store.insert_transaction(expense(user.id, "2.00")).await.unwrap();
        store
            .insert_feedback(user.id, "hi".to_string(), "mail".to_string())
            .await
            .unwrap();

        let deleted = store.delete_user_cascade(user.id).await.unwrap().unwrap();
        assert_eq!(deleted.deleted_transactions, 2);
        assert_eq!(deleted.deleted_feedbacks, 1);
        assert!(store.delete_user_cascade(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn totals_split_by_direction() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store.insert_transaction(expense(user, "10.00")).await.unwrap();
        store.insert_transaction(expense(user, "0.50")).await.unwrap();
        let mut income = expense(user, "100.00");
        income.kind = EntryType::Income;
        store.insert_transaction(income).await.unwrap();

        let totals = store.transaction_totals(user).await.unwrap();
        assert_eq!(totals.income.to_string(), "100.00");
        assert_eq!(totals.expense.to_string(), "10.50");
    }
}
