//! Summary statistics over the full set of records.
//!
//! All statistics are sent to the client as display-ready strings with two
//! decimal places.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::record::{Record, RecordType};

/// The value of [Stats::top] when there are no expenses.
pub const NO_TOP_CATEGORY: &str = "\u{2014}";

/// The window of time, counting back from now, used for [Stats::avg].
pub const AVERAGE_WINDOW: Duration = Duration::days(30);

/// Summary statistics for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// The sum of all expense amounts.
    pub total: String,
    /// The sum of all portfolio amounts.
    pub portfolio: String,
    /// The average expense amount over the last 30 days.
    pub avg: String,
    /// The category with the largest expense total, or [NO_TOP_CATEGORY].
    pub top: String,
    /// The sum of expense amounts in the current calendar month.
    pub month_total: String,
}

/// The error returned when the stored amounts add up to more than a [Decimal] can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("the stored amounts are too large to summarize")]
pub struct StatsOverflow;

impl Stats {
    /// Calculate the statistics for `records`.
    ///
    /// `now` determines the window for the average and, through its UTC
    /// offset, which calendar month counts as the current month.
    ///
    /// # Errors
    /// Returns [StatsOverflow] if any of the sums overflows.
    pub fn from_records(records: &[Record], now: OffsetDateTime) -> Result<Self, StatsOverflow> {
        let expenses = || {
            records
                .iter()
                .filter(|record| record.record_type == RecordType::Expense)
        };

        let total = checked_sum(expenses().map(|record| record.amount))?;
        let portfolio = checked_sum(
            records
                .iter()
                .filter(|record| record.record_type == RecordType::Portfolio)
                .map(|record| record.amount),
        )?;

        let window_start = now - AVERAGE_WINDOW;
        let recent: Vec<Decimal> = expenses()
            .filter(|record| record.created_at >= window_start)
            .map(|record| record.amount)
            .collect();
        let avg = average(&recent)?;

        let offset = now.offset();
        let month_total = checked_sum(
            expenses()
                .filter(|record| {
                    let local = record.created_at.to_offset(offset);
                    local.year() == now.year() && local.month() == now.month()
                })
                .map(|record| record.amount),
        )?;

        Ok(Self {
            total: format_amount(total),
            portfolio: format_amount(portfolio),
            avg: format_amount(avg),
            top: top_category(expenses())?.unwrap_or_else(|| NO_TOP_CATEGORY.to_owned()),
            month_total: format_amount(month_total),
        })
    }
}

fn checked_sum(amounts: impl IntoIterator<Item = Decimal>) -> Result<Decimal, StatsOverflow> {
    amounts.into_iter().try_fold(Decimal::ZERO, |sum, amount| {
        sum.checked_add(amount).ok_or(StatsOverflow)
    })
}

fn average(amounts: &[Decimal]) -> Result<Decimal, StatsOverflow> {
    if amounts.is_empty() {
        return Ok(Decimal::ZERO);
    }

    checked_sum(amounts.iter().copied())?
        .checked_div(Decimal::from(amounts.len()))
        .ok_or(StatsOverflow)
}

/// The category with the largest summed amount.
///
/// Ties go to the category that sorts first.
fn top_category<'a>(
    records: impl Iterator<Item = &'a Record>,
) -> Result<Option<String>, StatsOverflow> {
    let mut totals: BTreeMap<&str, Decimal> = BTreeMap::new();

    for record in records {
        let total = totals.entry(record.category.as_str()).or_default();
        *total = total.checked_add(record.amount).ok_or(StatsOverflow)?;
    }

    let mut top: Option<(&str, Decimal)> = None;

    for (category, total) in totals {
        match top {
            Some((_, top_total)) if total <= top_total => {}
            _ => top = Some((category, total)),
        }
    }

    Ok(top.map(|(category, _)| category.to_owned()))
}

/// Format `amount` with exactly two decimal places, rounding half away from zero.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    format!("{rounded:.2}")
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use time::{Duration, OffsetDateTime, macros::datetime};

    use crate::record::{Record, RecordType};

    use super::{NO_TOP_CATEGORY, Stats, StatsOverflow, format_amount};

    fn record(
        amount: Decimal,
        category: &str,
        record_type: RecordType,
        created_at: OffsetDateTime,
    ) -> Record {
        Record {
            id: 0,
            title: "test".to_owned(),
            amount,
            category: category.to_owned(),
            record_type,
            created_at,
        }
    }

    const NOW: OffsetDateTime = datetime!(2025-06-15 12:00 UTC);

    #[test]
    fn empty_table_has_zero_stats_and_sentinel() {
        let stats = Stats::from_records(&[], NOW).unwrap();

        assert_eq!(
            stats,
            Stats {
                total: "0.00".to_owned(),
                portfolio: "0.00".to_owned(),
                avg: "0.00".to_owned(),
                top: NO_TOP_CATEGORY.to_owned(),
                month_total: "0.00".to_owned(),
            }
        );
    }

    #[test]
    fn totals_are_split_by_record_type() {
        let records = [
            record(dec!(10.00), "Bills", RecordType::Expense, NOW),
            record(dec!(20.00), "Bills", RecordType::Expense, NOW),
            record(dec!(100.00), "Investment", RecordType::Portfolio, NOW),
        ];

        let stats = Stats::from_records(&records, NOW).unwrap();

        assert_eq!(stats.total, "30.00");
        assert_eq!(stats.portfolio, "100.00");
        assert_eq!(stats.top, "Bills");
    }

    #[test]
    fn totals_are_exact() {
        let records: Vec<_> = (0..10)
            .map(|_| record(dec!(0.10), "Food & Dining", RecordType::Expense, NOW))
            .collect();

        let stats = Stats::from_records(&records, NOW).unwrap();

        assert_eq!(stats.total, "1.00");
    }

    #[test]
    fn only_portfolio_records_have_sentinel_top() {
        let records = [record(
            dec!(100.00),
            "Investment",
            RecordType::Portfolio,
            NOW,
        )];

        let stats = Stats::from_records(&records, NOW).unwrap();

        assert_eq!(stats.top, NO_TOP_CATEGORY);
        assert_eq!(stats.total, "0.00");
        assert_eq!(stats.avg, "0.00");
    }

    #[test]
    fn average_includes_record_exactly_thirty_days_old() {
        let records = [
            record(dec!(10), "Bills", RecordType::Expense, NOW),
            record(
                dec!(20),
                "Bills",
                RecordType::Expense,
                NOW - Duration::days(30),
            ),
        ];

        let stats = Stats::from_records(&records, NOW).unwrap();

        assert_eq!(stats.avg, "15.00");
    }

    #[test]
    fn average_excludes_records_older_than_thirty_days() {
        let records = [
            record(dec!(10), "Bills", RecordType::Expense, NOW),
            record(
                dec!(1000),
                "Bills",
                RecordType::Expense,
                NOW - Duration::days(30) - Duration::seconds(1),
            ),
        ];

        let stats = Stats::from_records(&records, NOW).unwrap();

        assert_eq!(stats.avg, "10.00");
        assert_eq!(stats.total, "1010.00");
    }

    #[test]
    fn average_ignores_portfolio_records() {
        let records = [
            record(dec!(3), "Bills", RecordType::Expense, NOW),
            record(dec!(500), "Investment", RecordType::Portfolio, NOW),
        ];

        let stats = Stats::from_records(&records, NOW).unwrap();

        assert_eq!(stats.avg, "3.00");
    }

    #[test]
    fn average_is_rounded_to_two_places() {
        let records = [
            record(dec!(1), "Bills", RecordType::Expense, NOW),
            record(dec!(1), "Bills", RecordType::Expense, NOW),
            record(dec!(2), "Bills", RecordType::Expense, NOW),
        ];

        let stats = Stats::from_records(&records, NOW).unwrap();

        assert_eq!(stats.avg, "1.33");
    }

    #[test]
    fn top_category_has_largest_sum_not_largest_single_amount() {
        let records = [
            record(dec!(50), "Shopping", RecordType::Expense, NOW),
            record(dec!(30), "Food & Dining", RecordType::Expense, NOW),
            record(dec!(30), "Food & Dining", RecordType::Expense, NOW),
        ];

        let stats = Stats::from_records(&records, NOW).unwrap();

        assert_eq!(stats.top, "Food & Dining");
    }

    #[test]
    fn top_category_tie_goes_to_first_name() {
        let records = [
            record(dec!(25), "Shopping", RecordType::Expense, NOW),
            record(dec!(25), "Bills", RecordType::Expense, NOW),
            record(dec!(25), "Education", RecordType::Expense, NOW),
        ];

        let stats = Stats::from_records(&records, NOW).unwrap();

        assert_eq!(stats.top, "Bills");
    }

    #[test]
    fn top_category_ignores_portfolio_records() {
        let records = [
            record(dec!(5), "Bills", RecordType::Expense, NOW),
            record(dec!(5000), "Investment", RecordType::Portfolio, NOW),
        ];

        let stats = Stats::from_records(&records, NOW).unwrap();

        assert_eq!(stats.top, "Bills");
    }

    #[test]
    fn month_total_only_counts_current_month() {
        let records = [
            record(dec!(10), "Bills", RecordType::Expense, NOW),
            record(
                dec!(20),
                "Bills",
                RecordType::Expense,
                datetime!(2025-06-01 00:00 UTC),
            ),
            record(
                dec!(40),
                "Bills",
                RecordType::Expense,
                datetime!(2025-05-31 23:59:59 UTC),
            ),
            record(
                dec!(80),
                "Investment",
                RecordType::Portfolio,
                datetime!(2025-06-02 00:00 UTC),
            ),
        ];

        let stats = Stats::from_records(&records, NOW).unwrap();

        assert_eq!(stats.month_total, "30.00");
    }

    #[test]
    fn month_total_uses_local_month() {
        // 2025-05-31 20:00 UTC is already June in Auckland (UTC+12).
        let now = datetime!(2025-06-15 12:00 +12);
        let records = [record(
            dec!(10),
            "Bills",
            RecordType::Expense,
            datetime!(2025-05-31 20:00 UTC),
        )];

        let stats = Stats::from_records(&records, now).unwrap();

        assert_eq!(stats.month_total, "10.00");
    }

    #[test]
    fn total_overflow_is_an_error() {
        let records = [
            record(Decimal::MAX, "Bills", RecordType::Expense, NOW),
            record(Decimal::MAX, "Bills", RecordType::Expense, NOW),
        ];

        assert_eq!(Stats::from_records(&records, NOW), Err(StatsOverflow));
    }

    #[test]
    fn category_overflow_is_an_error() {
        // The expense total fits but the "Bills" sum on its own does not.
        let records = [
            record(Decimal::MAX, "Bills", RecordType::Expense, NOW),
            record(Decimal::MIN, "Refunds", RecordType::Expense, NOW),
            record(
                Decimal::MAX,
                "Bills",
                RecordType::Expense,
                NOW - Duration::days(90),
            ),
        ];

        assert_eq!(Stats::from_records(&records, NOW), Err(StatsOverflow));
    }

    #[test]
    fn large_amounts_that_fit_are_summarized() {
        let records = [
            record(Decimal::MAX, "Bills", RecordType::Expense, NOW),
            record(Decimal::MAX, "Investment", RecordType::Portfolio, NOW),
        ];

        let stats = Stats::from_records(&records, NOW).unwrap();

        assert_eq!(stats.total, format_amount(Decimal::MAX));
        assert_eq!(stats.portfolio, format_amount(Decimal::MAX));
        assert_eq!(stats.avg, format_amount(Decimal::MAX));
    }

    #[test]
    fn formats_with_two_decimal_places() {
        assert_eq!(format_amount(dec!(3.5)), "3.50");
        assert_eq!(format_amount(dec!(1234567.891)), "1234567.89");
        assert_eq!(format_amount(dec!(0.005)), "0.01");
        assert_eq!(format_amount(dec!(-2.345)), "-2.35");
        assert_eq!(format_amount(dec!(7)), "7.00");
    }
}
