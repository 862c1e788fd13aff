//! Aggregation reads: dashboard stats, monthly series, category breakdowns.
//!
//! Each report runs inside one DB transaction, so every number in a result
//! comes from the same snapshot of the ledger. Callers pass `today`; the
//! engine never reads the wall clock.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use sea_orm::{PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    CategorySlice, DateRange, EngineError, MoneyCents, MonthlyReport, ResultEngine, Stats,
    TransactionKind,
    accounts, categories,
    reports::{month_bounds, months_back, percentage_share},
    transactions,
};

use super::{Engine, TransactionListFilter, TransactionView, with_tx};

fn first_of_month(today: NaiveDate) -> ResultEngine<NaiveDate> {
    NaiveDate::from_ymd_opt(today.year(), today.month(), 1)
        .ok_or_else(|| EngineError::InvalidInput("date out of calendar range".to_string()))
}

fn bounds_or_err(year: i32, month: u32) -> ResultEngine<(NaiveDate, NaiveDate)> {
    month_bounds(year, month)
        .ok_or_else(|| EngineError::InvalidInput("date out of calendar range".to_string()))
}

impl Engine {
    /// Dashboard headline numbers for one owner.
    ///
    /// The monthly figures cover the current calendar month up to and
    /// including `today`; the counts and total balance ignore the date
    /// entirely. Soft-deleted rows count nowhere.
    pub async fn stats(&self, user_id: &str, today: NaiveDate) -> ResultEngine<Stats> {
        let month_start = first_of_month(today)?;
        with_tx!(self, |db_tx| {
            let account_rows = accounts::Entity::find()
                .filter(accounts::Column::UserId.eq(user_id))
                .filter(accounts::Column::Deleted.eq(false))
                .all(&db_tx)
                .await?;
            let total_balance: i64 = account_rows.iter().map(|m| m.balance_minor).sum();
            let account_count = account_rows.len() as u64;

            let category_count = categories::Entity::find()
                .filter(categories::Column::UserId.eq(user_id))
                .filter(categories::Column::Deleted.eq(false))
                .count(&db_tx)
                .await?;
            let transaction_count = transactions::Entity::find()
                .filter(transactions::Column::UserId.eq(user_id))
                .filter(transactions::Column::Deleted.eq(false))
                .count(&db_tx)
                .await?;

            let month_rows = transactions::Entity::find()
                .filter(transactions::Column::UserId.eq(user_id))
                .filter(transactions::Column::Deleted.eq(false))
                .filter(transactions::Column::OccurredOn.gte(month_start))
                .filter(transactions::Column::OccurredOn.lte(today))
                .all(&db_tx)
                .await?;
            let mut monthly_income = 0i64;
            let mut monthly_expense = 0i64;
            for row in &month_rows {
                match TransactionKind::try_from(row.kind.as_str())? {
                    TransactionKind::Income => monthly_income += row.amount_minor,
                    TransactionKind::Expense => monthly_expense += row.amount_minor,
                }
            }

            Ok(Stats {
                total_balance: MoneyCents::new(total_balance),
                account_count,
                category_count,
                transaction_count,
                monthly_income: MoneyCents::new(monthly_income),
                monthly_expense: MoneyCents::new(monthly_expense),
                monthly_net: MoneyCents::new(monthly_income - monthly_expense),
            })
        })
    }

    /// Income/expense totals for the last `month_count` calendar months,
    /// oldest first, the month containing `today` last.
    ///
    /// Months without transactions still appear, zero-filled. The whole span
    /// is read in one query and bucketed in memory.
    pub async fn monthly_reports(
        &self,
        user_id: &str,
        month_count: u32,
        today: NaiveDate,
    ) -> ResultEngine<Vec<MonthlyReport>> {
        if month_count == 0 {
            return Ok(Vec::new());
        }
        let (oldest_year, oldest_month) = months_back(today, month_count - 1);
        let (span_start, _) = bounds_or_err(oldest_year, oldest_month)?;
        let (_, span_end) = bounds_or_err(today.year(), today.month())?;

        with_tx!(self, |db_tx| {
            let rows = transactions::Entity::find()
                .filter(transactions::Column::UserId.eq(user_id))
                .filter(transactions::Column::Deleted.eq(false))
                .filter(transactions::Column::OccurredOn.gte(span_start))
                .filter(transactions::Column::OccurredOn.lte(span_end))
                .all(&db_tx)
                .await?;

            let mut buckets: HashMap<(i32, u32), (i64, i64, u64)> = HashMap::new();
            for row in &rows {
                let key = (row.occurred_on.year(), row.occurred_on.month());
                let bucket = buckets.entry(key).or_insert((0, 0, 0));
                match TransactionKind::try_from(row.kind.as_str())? {
                    TransactionKind::Income => bucket.0 += row.amount_minor,
                    TransactionKind::Expense => bucket.1 += row.amount_minor,
                }
                bucket.2 += 1;
            }

            let mut series = Vec::with_capacity(month_count as usize);
            for back in (0..month_count).rev() {
                let (year, month) = months_back(today, back);
                let (income, expense, count) =
                    buckets.get(&(year, month)).copied().unwrap_or((0, 0, 0));
                series.push(MonthlyReport {
                    year,
                    month,
                    total_income: MoneyCents::new(income),
                    total_expense: MoneyCents::new(expense),
                    net: MoneyCents::new(income - expense),
                    transaction_count: count,
                });
            }
            Ok(series)
        })
    }

    /// Breaks the transactions of one kind down by category.
    ///
    /// Slices are ordered by total descending; ties keep the categories'
    /// creation order. Percentages are computed over the full result set
    /// before `top_count` truncates it, so a truncated listing still shows
    /// each slice's true share.
    pub async fn category_analysis(
        &self,
        user_id: &str,
        kind: TransactionKind,
        range: &DateRange,
        top_count: Option<usize>,
    ) -> ResultEngine<Vec<CategorySlice>> {
        with_tx!(self, |db_tx| {
            let category_rows = categories::Entity::find()
                .filter(categories::Column::UserId.eq(user_id))
                .filter(categories::Column::Kind.eq(kind.as_str()))
                .filter(categories::Column::Deleted.eq(false))
                .order_by_asc(categories::Column::CreatedAt)
                .all(&db_tx)
                .await?;

            let mut query = transactions::Entity::find()
                .filter(transactions::Column::UserId.eq(user_id))
                .filter(transactions::Column::Deleted.eq(false))
                .filter(transactions::Column::Kind.eq(kind.as_str()));
            if let Some(start) = range.start {
                query = query.filter(transactions::Column::OccurredOn.gte(start));
            }
            if let Some(end) = range.end {
                query = query.filter(transactions::Column::OccurredOn.lte(end));
            }
            let rows = query.all(&db_tx).await?;

            let mut totals: HashMap<String, (i64, u64)> = HashMap::new();
            for row in &rows {
                let entry = totals.entry(row.category_id.clone()).or_insert((0, 0));
                entry.0 += row.amount_minor;
                entry.1 += 1;
            }
            let grand: i64 = totals.values().map(|(total, _)| total).sum();

            let mut slices = Vec::new();
            for category in category_rows {
                let Some(&(total, count)) = totals.get(&category.id) else {
                    continue;
                };
                slices.push(CategorySlice {
                    category_id: Uuid::parse_str(&category.id)
                        .map_err(|_| EngineError::NotFound("category not exists".to_string()))?,
                    name: category.name,
                    icon: category.icon.unwrap_or_default(),
                    color: category.color,
                    total: MoneyCents::new(total),
                    transaction_count: count,
                    percentage: percentage_share(total, grand),
                });
            }
            // stable sort keeps creation order for equal totals
            slices.sort_by(|a, b| b.total.cents().cmp(&a.total.cents()));
            if let Some(top_count) = top_count {
                slices.truncate(top_count);
            }
            Ok(slices)
        })
    }

    /// The `count` most recent live transactions, newest first.
    pub async fn recent_transactions(
        &self,
        user_id: &str,
        count: u64,
    ) -> ResultEngine<Vec<TransactionView>> {
        let filter = TransactionListFilter {
            limit: Some(count),
            ..Default::default()
        };
        self.list_transactions(user_id, &filter).await
    }
}
