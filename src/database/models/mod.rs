pub mod category;
pub mod feedback;
pub mod transaction;
pub mod user;

use serde::{Deserialize, Serialize};

pub use category::{Category, CreateCategory, UpdateCategory};
pub use feedback::{CreateFeedback, Feedback, FeedbackStatus, FeedbackWithUser, UpdateFeedback};
pub use transaction::{
    Amount, CreateTransaction, EntryTotals, Transaction, TransactionChanges, TransactionFilter,
    TypeFilter, UpdateTransaction,
};
pub use user::{
    AdminUserView, AvatarType, CreateUser, Gender, NewUser, PublicUser, UpdateUser, User, UserChanges,
    UserSummary,
};

/// Direction of a money movement. Shared by categories and transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum EntryType {
    Income,
    Expense,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Income => "income",
            EntryType::Expense => "expense",
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_type_uses_lowercase_wire_names() {
        assert_eq!(serde_json::to_value(EntryType::Income).unwrap(), "income");
        let parsed: EntryType = serde_json::from_str("\"expense\"").unwrap();
        assert_eq!(parsed, EntryType::Expense);
        assert!(serde_json::from_str::<EntryType>("\"transfer\"").is_err());
    }
}
