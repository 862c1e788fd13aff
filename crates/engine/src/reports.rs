//! Report value types and the date/percentage arithmetic behind them.
//!
//! Everything here is pure: the queries feeding these types live in
//! `ops::reports`.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::MoneyCents;

/// Dashboard headline numbers for one owner.
///
/// `total_balance` reads the cached account balances; the monthly figures are
/// re-derived from the transaction set. Keeping both sources is intentional
/// and covered by the balance-invariant tests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_balance: MoneyCents,
    pub account_count: u64,
    pub category_count: u64,
    pub transaction_count: u64,
    pub monthly_income: MoneyCents,
    pub monthly_expense: MoneyCents,
    pub monthly_net: MoneyCents,
}

/// Income/expense totals for one calendar month.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    pub total_income: MoneyCents,
    pub total_expense: MoneyCents,
    pub net: MoneyCents,
    pub transaction_count: u64,
}

/// One category's share of the filtered transaction set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategorySlice {
    pub category_id: Uuid,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub total: MoneyCents,
    pub transaction_count: u64,
    /// Share of the grand total in percent, rounded to 2 decimals. `0.0`
    /// when the grand total is zero.
    pub percentage: f64,
}

/// Inclusive `[start, end]` date window; either bound may be open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// The default dashboard window: the 30 days up to and including `today`.
    #[must_use]
    pub fn last_30_days(today: NaiveDate) -> Self {
        Self {
            start: Some(today - Duration::days(30)),
            end: Some(today),
        }
    }

    /// A fully open range (no date filtering).
    #[must_use]
    pub fn open() -> Self {
        Self::default()
    }
}

/// Returns the calendar month `back` months before the one containing
/// `today`, as `(year, month)`.
pub(crate) fn months_back(today: NaiveDate, back: u32) -> (i32, u32) {
    let total = today.year() * 12 + today.month0() as i32 - back as i32;
    (total.div_euclid(12), total.rem_euclid(12) as u32 + 1)
}

/// First and last day of a calendar month.
///
/// `None` only for out-of-range years, which cannot come out of
/// [`months_back`] on real dates.
pub(crate) fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?;
    Some((start, end))
}

/// Percentage share of `part` in `grand`, rounded to 2 decimals.
///
/// Defined as `0.0` for an empty grand total. Rounding drift across a whole
/// result set (99.99 / 100.01) is accepted, not renormalized.
pub(crate) fn percentage_share(part_minor: i64, grand_minor: i64) -> f64 {
    if grand_minor <= 0 {
        return 0.0;
    }
    (part_minor as f64 / grand_minor as f64 * 100.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn months_back_crosses_year_boundaries() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 14).unwrap();
        assert_eq!(months_back(today, 0), (2026, 2));
        assert_eq!(months_back(today, 1), (2026, 1));
        assert_eq!(months_back(today, 2), (2025, 12));
        assert_eq!(months_back(today, 14), (2024, 12));
    }

    #[test]
    fn month_bounds_handles_february_and_december() {
        assert_eq!(
            month_bounds(2024, 2),
            Some((
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
            ))
        );
        assert_eq!(
            month_bounds(2025, 12),
            Some((
                NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()
            ))
        );
    }

    #[test]
    fn percentage_share_rounds_to_two_decimals() {
        assert_eq!(percentage_share(3000, 10000), 30.0);
        assert_eq!(percentage_share(1, 3), 33.33);
        assert_eq!(percentage_share(2, 3), 66.67);
        assert_eq!(percentage_share(0, 0), 0.0);
        assert_eq!(percentage_share(100, 0), 0.0);
    }

    #[test]
    fn last_30_days_is_inclusive_of_today() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        let range = DateRange::last_30_days(today);
        assert_eq!(range.end, Some(today));
        assert_eq!(range.start, Some(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()));
    }
}
