use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::database::models::{EntryTotals, EntryType, Transaction};

fn money(value: Decimal) -> String {
    format!("{:.2}", value)
}

/// `GET /transactions/stats` payload. Every figure is a two-decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub total_income: String,
    pub total_expense: String,
    pub balance: String,
}

impl From<EntryTotals> for Balance {
    fn from(totals: EntryTotals) -> Self {
        Self {
            total_income: money(totals.income),
            total_expense: money(totals.expense),
            balance: money(totals.income - totals.expense),
        }
    }
}

/// Calendar month in UTC, rendered `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(timestamp: &DateTime<Utc>) -> Self {
        Self {
            year: timestamp.year(),
            month: timestamp.month(),
        }
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthTotal {
    pub month: String,
    pub total: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyRollup {
    /// Most recent month first.
    pub months: Vec<MonthTotal>,
    pub total: String,
    pub count: usize,
}

/// Group transactions by the month of their transaction date.
///
/// Amounts are summed as magnitudes regardless of type; callers narrow the
/// list with a `TransactionFilter` first when they want one direction only.
pub fn rollup_by_month(transactions: &[Transaction]) -> MonthlyRollup {
    let mut buckets: BTreeMap<MonthKey, (Decimal, usize)> = BTreeMap::new();
    let mut grand_total = Decimal::ZERO;

    for transaction in transactions {
        let amount = transaction.amount.value();
        let bucket = buckets
            .entry(MonthKey::of(&transaction.transaction_date))
            .or_insert((Decimal::ZERO, 0));
        bucket.0 += amount;
        bucket.1 += 1;
        grand_total += amount;
    }

    let months = buckets
        .into_iter()
        .rev()
        .map(|(key, (total, count))| MonthTotal {
            month: key.to_string(),
            total: money(total),
            count,
        })
        .collect();

    MonthlyRollup {
        months,
        total: money(grand_total),
        count: transactions.len(),
    }
}

/// `GET /transactions/stats/summary` payload: income and expense for the
/// calendar month and year containing `now` (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    pub month: String,
    pub year: i32,
    pub month_income: String,
    pub month_expense: String,
    pub month_balance: String,
    pub year_income: String,
    pub year_expense: String,
}

pub fn summarize_period(transactions: &[Transaction], now: DateTime<Utc>) -> PeriodSummary {
    let current = MonthKey::of(&now);
    let mut month = EntryTotals::default();
    let mut year = EntryTotals::default();

    for transaction in transactions {
        let key = MonthKey::of(&transaction.transaction_date);
        if key.year != current.year {
            continue;
        }
        let amount = transaction.amount.value();
        let in_month = key == current;
        match transaction.kind {
            EntryType::Income => {
                year.income += amount;
                if in_month {
                    month.income += amount;
                }
            }
            EntryType::Expense => {
                year.expense += amount;
                if in_month {
                    month.expense += amount;
                }
            }
        }
    }

    PeriodSummary {
        month: current.to_string(),
        year: current.year,
        month_income: money(month.income),
        month_expense: money(month.expense),
        month_balance: money(month.income - month.expense),
        year_income: money(year.income),
        year_expense: money(year.expense),
    }
}
