use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::middleware::FieldOrder;

use super::EntryType;

/// Upper bound of NUMERIC(12, 2).
const AMOUNT_LIMIT: i64 = 10_000_000_000;

/// Non-negative money magnitude with exactly two fraction digits.
///
/// Accepts JSON strings or numbers, serializes as a string so `"12.50"`
/// comes back as `"12.50"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, String> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err("金额不能为负数".to_string());
        }
        let mut value = value.normalize();
        if value.scale() > 2 {
            return Err("金额最多保留两位小数".to_string());
        }
        if value >= Decimal::new(AMOUNT_LIMIT, 0) {
            return Err("金额超出范围".to_string());
        }
        if value.is_zero() {
            value = Decimal::ZERO;
        }
        value.rescale(2);
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl std::str::FromStr for Amount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().parse::<Decimal>().map_err(|_| format!("无效的金额: {}", s))?;
        Amount::new(value)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Amount::new(value).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: Amount,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: EntryType,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub transaction_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTransaction {
    pub amount: Amount,
    #[serde(rename = "type")]
    pub kind: EntryType,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    /// Defaults to the insert time.
    pub transaction_date: Option<DateTime<Utc>>,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTransaction {
    pub amount: Option<Amount>,
    #[serde(rename = "type")]
    pub kind: Option<EntryType>,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub transaction_date: Option<DateTime<Utc>>,
    /// Owner, accepted from the body when the query string lacks it.
    pub user_id: Option<Uuid>,
}

impl UpdateTransaction {
    pub fn into_changes(self) -> TransactionChanges {
        TransactionChanges {
            amount: self.amount,
            kind: self.kind,
            category_id: self.category_id,
            description: self.description,
            transaction_date: self.transaction_date,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransactionChanges {
    pub amount: Option<Amount>,
    pub kind: Option<EntryType>,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub transaction_date: Option<DateTime<Utc>>,
}

/// Sums of one user's transactions, split by direction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EntryTotals {
    pub income: Decimal,
    pub expense: Decimal,
}

/// `type` query value on list endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    #[default]
    All,
    Income,
    Expense,
}

impl TypeFilter {
    pub fn entry_type(self) -> Option<EntryType> {
        match self {
            TypeFilter::All => None,
            TypeFilter::Income => Some(EntryType::Income),
            TypeFilter::Expense => Some(EntryType::Expense),
        }
    }
}

/// Exact-match narrowing of a transaction list by type and category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub kind: Option<EntryType>,
    pub category_id: Option<Uuid>,
}

impl TransactionFilter {
    pub fn new(kind: TypeFilter, category_id: Option<Uuid>) -> Self {
        Self {
            kind: kind.entry_type(),
            category_id,
        }
    }

    pub fn matches(&self, transaction: &Transaction) -> bool {
        self.kind.map_or(true, |kind| transaction.kind == kind)
            && self
                .category_id
                .map_or(true, |category| transaction.category_id == Some(category))
    }

    pub fn apply<'a, I>(&self, transactions: I) -> Vec<Transaction>
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        transactions
            .into_iter()
            .filter(|t| self.matches(t))
            .cloned()
            .collect()
    }
}

impl FieldOrder for CreateTransaction {}

impl FieldOrder for UpdateTransaction {}
