use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{
    Category, CreateCategory, CreateTransaction, EntryTotals, EntryType, Feedback, FeedbackStatus, NewUser,
    Transaction, TransactionChanges, TransactionFilter, UpdateCategory, UpdateFeedback, User, UserChanges,
    UserSummary,
};
use crate::database::store::{DeletedUser, Store};

const USER_COLUMNS: &str = "id, name, nickname, password, password_plain, avatar, avatar_type, avatar_url, \
     bio, age, gender, is_admin, created_at, updated_at";
const CATEGORY_COLUMNS: &str = "id, name, icon, color, type, created_at";
const TRANSACTION_COLUMNS: &str =
    "id, user_id, amount, type, category_id, description, transaction_date, created_at";
const FEEDBACK_COLUMNS: &str = "id, user_id, content, contact, status, reply, created_at, updated_at";

/// Postgres-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users ORDER BY created_at DESC", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE name = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql).bind(name).fetch_optional(&self.pool).await?)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let sql = format!(
            "INSERT INTO users (name, password, password_plain, nickname, avatar, avatar_type, avatar_url, \
             bio, age, gender, is_admin) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.name)
            .bind(&user.password_hash)
            .bind(&user.password_plain)
            .bind(&user.nickname)
            .bind(&user.avatar)
            .bind(user.avatar_type)
            .bind(&user.avatar_url)
            .bind(&user.bio)
            .bind(user.age)
            .bind(user.gender)
            .bind(user.is_admin)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_write(e, "user name"))
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, DatabaseError> {
        let sql = format!(
            "UPDATE users SET \
                nickname = COALESCE($2, nickname), \
                avatar = COALESCE($3, avatar), \
                avatar_type = COALESCE($4, avatar_type), \
                avatar_url = COALESCE($5, avatar_url), \
                bio = COALESCE($6, bio), \
                age = COALESCE($7, age), \
                gender = COALESCE($8, gender), \
                is_admin = COALESCE($9, is_admin), \
                updated_at = now() \
             WHERE id = $1 \
             RETURNING {}",
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(changes.nickname)
            .bind(changes.avatar)
            .bind(changes.avatar_type)
            .bind(changes.avatar_url)
            .bind(changes.bio)
            .bind(changes.age)
            .bind(changes.gender)
            .bind(changes.is_admin)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn set_password(
        &self,
        id: Uuid,
        password_hash: String,
        password_plain: Option<String>,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE users SET password = $2, password_plain = $3, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .bind(password_plain)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_user_cascade(&self, id: Uuid) -> Result<Option<DeletedUser>, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let transactions = sqlx::query("DELETE FROM transactions WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let feedbacks = sqlx::query("DELETE FROM feedbacks WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let users = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if users == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(DeletedUser {
            deleted_transactions: transactions,
            deleted_feedbacks: feedbacks,
        }))
    }

    async fn user_summaries(&self, ids: &[Uuid]) -> Result<Vec<UserSummary>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        Ok(
            sqlx::query_as::<_, UserSummary>("SELECT id, name, nickname FROM users WHERE id = ANY($1)")
                .bind(ids.to_vec())
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn list_categories(&self, kind: Option<EntryType>) -> Result<Vec<Category>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM categories WHERE ($1::text IS NULL OR type = $1) ORDER BY created_at ASC",
            CATEGORY_COLUMNS
        );
        Ok(sqlx::query_as::<_, Category>(&sql).bind(kind).fetch_all(&self.pool).await?)
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>, DatabaseError> {
        let sql = format!("SELECT {} FROM categories WHERE id = $1", CATEGORY_COLUMNS);
        Ok(sqlx::query_as::<_, Category>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn insert_category(&self, category: CreateCategory) -> Result<Category, DatabaseError> {
        let sql = format!(
            "INSERT INTO categories (name, icon, color, type) VALUES ($1, $2, $3, $4) RETURNING {}",
            CATEGORY_COLUMNS
        );
        sqlx::query_as::<_, Category>(&sql)
            .bind(category.name)
            .bind(category.icon)
            .bind(category.color)
            .bind(category.kind)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_write(e, "category"))
    }

    async fn update_category(&self, id: Uuid, changes: UpdateCategory) -> Result<Option<Category>, DatabaseError> {
        let sql = format!(
            "UPDATE categories SET \
                name = COALESCE($2, name), \
                icon = COALESCE($3, icon), \
                color = COALESCE($4, color), \
                type = COALESCE($5, type) \
             WHERE id = $1 \
             RETURNING {}",
            CATEGORY_COLUMNS
        );
        Ok(sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .bind(changes.name)
            .bind(changes.icon)
            .bind(changes.color)
            .bind(changes.kind)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_category(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_transactions(
        &self,
        user_id: Uuid,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM transactions \
             WHERE user_id = $1 \
               AND ($2::text IS NULL OR type = $2) \
               AND ($3::uuid IS NULL OR category_id = $3) \
             ORDER BY transaction_date DESC, created_at DESC",
            TRANSACTION_COLUMNS
        );
        Ok(sqlx::query_as::<_, Transaction>(&sql)
            .bind(user_id)
            .bind(filter.kind)
            .bind(filter.category_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_transaction(&self, id: Uuid, user_id: Uuid) -> Result<Option<Transaction>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM transactions WHERE id = $1 AND user_id = $2",
            TRANSACTION_COLUMNS
        );
        Ok(sqlx::query_as::<_, Transaction>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_transaction(&self, transaction: CreateTransaction) -> Result<Transaction, DatabaseError> {
        let sql = format!(
            "INSERT INTO transactions (user_id, amount, type, category_id, description, transaction_date) \
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, now())) \
             RETURNING {}",
            TRANSACTION_COLUMNS
        );
        Ok(sqlx::query_as::<_, Transaction>(&sql)
            .bind(transaction.user_id)
            .bind(transaction.amount)
            .bind(transaction.kind)
            .bind(transaction.category_id)
            .bind(transaction.description)
            .bind(transaction.transaction_date)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_transaction(
        &self,
        id: Uuid,
        user_id: Uuid,
        changes: TransactionChanges,
    ) -> Result<Option<Transaction>, DatabaseError> {
        let sql = format!(
            "UPDATE transactions SET \
                amount = COALESCE($3, amount), \
                type = COALESCE($4, type), \
                category_id = COALESCE($5, category_id), \
                description = COALESCE($6, description), \
                transaction_date = COALESCE($7, transaction_date) \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {}",
            TRANSACTION_COLUMNS
        );
        Ok(sqlx::query_as::<_, Transaction>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(changes.amount)
            .bind(changes.kind)
            .bind(changes.category_id)
            .bind(changes.description)
            .bind(changes.transaction_date)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_transaction(&self, id: Uuid, user_id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_transactions(&self, user_id: Uuid) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM transactions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn transaction_totals(&self, user_id: Uuid) -> Result<EntryTotals, DatabaseError> {
        let rows = sqlx::query_as::<_, (EntryType, Decimal)>(
            "SELECT type, COALESCE(SUM(amount), 0) AS total FROM transactions WHERE user_id = $1 GROUP BY type",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut totals = EntryTotals::default();
        for (kind, total) in rows {
            match kind {
                EntryType::Income => totals.income = total,
                EntryType::Expense => totals.expense = total,
            }
        }
        Ok(totals)
    }

    async fn list_feedbacks(&self, user_id: Option<Uuid>) -> Result<Vec<Feedback>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM feedbacks WHERE ($1::uuid IS NULL OR user_id = $1) ORDER BY created_at DESC",
            FEEDBACK_COLUMNS
        );
        Ok(sqlx::query_as::<_, Feedback>(&sql).bind(user_id).fetch_all(&self.pool).await?)
    }

    async fn find_feedback(&self, id: Uuid) -> Result<Option<Feedback>, DatabaseError> {
        let sql = format!("SELECT {} FROM feedbacks WHERE id = $1", FEEDBACK_COLUMNS);
        Ok(sqlx::query_as::<_, Feedback>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn insert_feedback(&self, user_id: Uuid, content: String, contact: String) -> Result<Feedback, DatabaseError> {
        let sql = format!(
            "INSERT INTO feedbacks (user_id, content, contact, status) VALUES ($1, $2, $3, $4) RETURNING {}",
            FEEDBACK_COLUMNS
        );
        Ok(sqlx::query_as::<_, Feedback>(&sql)
            .bind(user_id)
            .bind(content)
            .bind(contact)
            .bind(FeedbackStatus::Pending)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_feedback(&self, id: Uuid, changes: UpdateFeedback) -> Result<Option<Feedback>, DatabaseError> {
        let sql = format!(
            "UPDATE feedbacks SET \
                status = COALESCE($2, status), \
                reply = COALESCE($3, reply), \
                updated_at = now() \
             WHERE id = $1 \
             RETURNING {}",
            FEEDBACK_COLUMNS
        );
        Ok(sqlx::query_as::<_, Feedback>(&sql)
            .bind(id)
            .bind(changes.status)
            .bind(changes.reply)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_feedback(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM feedbacks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
