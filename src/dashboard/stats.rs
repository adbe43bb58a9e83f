//! Pure aggregation of expense rows into dashboard statistics.
//!
//! [compute] is a deterministic function of the expense list and the
//! reference date: no clock reads, no I/O, no shared state. Callers are
//! responsible for bounding the expense list to the desired date range
//! (see [DateRangeFilter]) before aggregating; running an additional
//! unfiltered call for all-time comparison figures is also the caller's
//! concern.
//!
//! Sums are accumulated in integer cents so that repeated float addition
//! cannot drift away from the cent-exact total.

use std::collections::BTreeMap;

use time::{Date, Duration, Month};

use crate::dashboard::query::ExpenseRow;

/// The grouping label used for expenses without a category.
pub(super) const UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// A named time window bounding which expenses are aggregated.
///
/// Each filter maps to an inclusive start-date boundary relative to the
/// reference date; the end boundary is always the reference date itself.
/// The filter is passed explicitly by the caller rather than read from any
/// ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(super) enum DateRangeFilter {
    /// No start boundary; every recorded expense is included.
    #[default]
    All,
    /// The last seven days.
    Week,
    /// The last calendar month.
    Month,
    /// The last three calendar months.
    ThreeMonths,
}

impl DateRangeFilter {
    /// Parse a filter from its query-string value.
    ///
    /// Unknown values fall back to [DateRangeFilter::All] so that a stale or
    /// hand-edited URL still renders a page.
    pub(super) fn from_query(raw: &str) -> Self {
        match raw {
            "week" => Self::Week,
            "month" => Self::Month,
            "3months" => Self::ThreeMonths,
            _ => Self::All,
        }
    }

    /// The value used for this filter in the dashboard's query string.
    pub(super) fn query_value(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Week => "week",
            Self::Month => "month",
            Self::ThreeMonths => "3months",
        }
    }

    /// The human-readable label shown on the filter button.
    pub(super) fn label(self) -> &'static str {
        match self {
            Self::All => "All Time",
            Self::Week => "This Week",
            Self::Month => "This Month",
            Self::ThreeMonths => "Last 3 Months",
        }
    }

    /// The inclusive start-date boundary for this filter, or `None` for
    /// [DateRangeFilter::All].
    pub(super) fn start_date(self, today: Date) -> Option<Date> {
        match self {
            Self::All => None,
            Self::Week => Some(today - Duration::days(7)),
            Self::Month => Some(months_before(today, 1)),
            Self::ThreeMonths => Some(months_before(today, 3)),
        }
    }

    /// All filters in display order for the filter button bar.
    pub(super) fn all_variants() -> [Self; 4] {
        [Self::All, Self::Week, Self::Month, Self::ThreeMonths]
    }
}

/// The date `months` calendar months before `date`, with the day clamped to
/// the target month's length (e.g. March 31 minus one month is the last day
/// of February).
fn months_before(date: Date, months: u32) -> Date {
    let total_months = date.year() * 12 + (u8::from(date.month()) as i32 - 1) - months as i32;
    let year = total_months.div_euclid(12);
    let month = Month::try_from((total_months.rem_euclid(12) + 1) as u8).unwrap();
    let day = date.day().min(time::util::days_in_year_month(year, month));

    // The day is clamped to the month length, so this cannot fail.
    Date::from_calendar_date(year, month, day).unwrap()
}

/// The summed spending for one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct MonthlyTotal {
    /// The month, as a date with the day set to 1.
    pub month: Date,
    /// The summed spending for the month, in dollars.
    pub amount: f64,
}

/// The summed spending for one category.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct CategoryTotal {
    /// The category name, or [UNCATEGORIZED_LABEL].
    pub category: String,
    /// The summed spending for the category, in dollars.
    pub amount: f64,
    /// The category's share of total spending, as a percentage rounded to
    /// one decimal place. Zero when the total is zero.
    pub percentage: f64,
}

/// Spending statistics derived from a list of expenses.
///
/// Recomputed on every request and never persisted; it has no identity or
/// lifecycle of its own.
#[derive(Debug, Clone, PartialEq, Default)]
pub(super) struct AggregateStats {
    /// The sum of all expense amounts, in dollars.
    pub total_spent: f64,
    /// Average spending per day between the oldest expense and the
    /// reference date.
    pub avg_daily: f64,
    /// Average spending per month over the last three months with data.
    pub avg_monthly: f64,
    /// Per-month totals in ascending chronological order.
    pub monthly_series: Vec<MonthlyTotal>,
    /// Per-category totals in descending order by amount.
    pub category_breakdown: Vec<CategoryTotal>,
    /// The largest single expense amount.
    pub highest_expense: f64,
    /// The number of expenses included in the aggregation.
    pub expense_count: usize,
}

fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

fn to_dollars(cents: i64) -> f64 {
    cents as f64 / 100.0
}

fn round_to_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Aggregate `expenses` into dashboard statistics.
///
/// `today` is the reference date for the daily average; the caller supplies
/// it so that the computation stays deterministic and directly testable.
///
/// Every input produces a defined output: an empty list yields the all-zero
/// [AggregateStats], and non-finite amounts are skipped rather than
/// poisoning the sums. Degenerate cases (zero total while computing
/// percentages, a single day of data) map to zero values, never to a fault.
pub(super) fn compute(expenses: &[ExpenseRow], today: Date) -> AggregateStats {
    let included: Vec<&ExpenseRow> = expenses
        .iter()
        .filter(|expense| expense.amount.is_finite())
        .collect();

    if included.is_empty() {
        return AggregateStats::default();
    }

    let total_cents: i64 = included
        .iter()
        .map(|expense| to_cents(expense.amount))
        .sum();
    let total_spent = to_dollars(total_cents);

    // The spending period runs from the oldest expense to the reference
    // date, floored at one day so a single day of data still has an average.
    let oldest = included
        .iter()
        .map(|expense| expense.date)
        .min()
        .expect("included is non-empty");
    let days_since_start = (today - oldest).whole_days().max(1);
    let avg_daily = total_spent / days_since_start as f64;

    let mut cents_by_month: BTreeMap<Date, i64> = BTreeMap::new();
    let mut cents_by_category: BTreeMap<String, i64> = BTreeMap::new();

    for expense in &included {
        let month = expense.date.replace_day(1).unwrap();
        *cents_by_month.entry(month).or_insert(0) += to_cents(expense.amount);

        let label = expense
            .category
            .clone()
            .unwrap_or_else(|| UNCATEGORIZED_LABEL.to_string());
        *cents_by_category.entry(label).or_insert(0) += to_cents(expense.amount);
    }

    // BTreeMap iterates months in ascending key order.
    let monthly_series: Vec<MonthlyTotal> = cents_by_month
        .into_iter()
        .map(|(month, cents)| MonthlyTotal {
            month,
            amount: to_dollars(cents),
        })
        .collect();

    let mut category_breakdown: Vec<CategoryTotal> = cents_by_category
        .into_iter()
        .map(|(category, cents)| {
            let percentage = if total_cents == 0 {
                0.0
            } else {
                round_to_one_decimal(cents as f64 / total_cents as f64 * 100.0)
            };

            CategoryTotal {
                category,
                amount: to_dollars(cents),
                percentage,
            }
        })
        .collect();
    // Descending by amount; ties broken by name so the output order is total.
    category_breakdown.sort_by(|a, b| {
        to_cents(b.amount)
            .cmp(&to_cents(a.amount))
            .then_with(|| a.category.cmp(&b.category))
    });

    let avg_monthly = if monthly_series.is_empty() {
        total_spent
    } else {
        let window = &monthly_series[monthly_series.len().saturating_sub(3)..];
        window.iter().map(|entry| entry.amount).sum::<f64>() / window.len() as f64
    };

    let highest_expense = included
        .iter()
        .map(|expense| expense.amount)
        .fold(0.0, f64::max);

    AggregateStats {
        total_spent,
        avg_daily,
        avg_monthly,
        monthly_series,
        category_breakdown,
        highest_expense,
        expense_count: included.len(),
    }
}

#[cfg(test)]
mod filter_tests {
    use time::macros::date;

    use super::DateRangeFilter;

    #[test]
    fn parses_query_values() {
        assert_eq!(DateRangeFilter::from_query("week"), DateRangeFilter::Week);
        assert_eq!(DateRangeFilter::from_query("month"), DateRangeFilter::Month);
        assert_eq!(
            DateRangeFilter::from_query("3months"),
            DateRangeFilter::ThreeMonths
        );
        assert_eq!(DateRangeFilter::from_query("all"), DateRangeFilter::All);
    }

    #[test]
    fn unknown_query_values_fall_back_to_all() {
        assert_eq!(DateRangeFilter::from_query(""), DateRangeFilter::All);
        assert_eq!(DateRangeFilter::from_query("3 months"), DateRangeFilter::All);
        assert_eq!(DateRangeFilter::from_query("WEEK"), DateRangeFilter::All);
    }

    #[test]
    fn query_values_round_trip() {
        for filter in DateRangeFilter::all_variants() {
            assert_eq!(DateRangeFilter::from_query(filter.query_value()), filter);
        }
    }

    #[test]
    fn all_has_no_start_date() {
        assert_eq!(DateRangeFilter::All.start_date(date!(2024 - 06 - 15)), None);
    }

    #[test]
    fn week_starts_seven_days_back() {
        assert_eq!(
            DateRangeFilter::Week.start_date(date!(2024 - 06 - 15)),
            Some(date!(2024 - 06 - 08))
        );
    }

    #[test]
    fn month_starts_one_calendar_month_back() {
        assert_eq!(
            DateRangeFilter::Month.start_date(date!(2024 - 06 - 15)),
            Some(date!(2024 - 05 - 15))
        );
    }

    #[test]
    fn three_months_crosses_year_boundary() {
        assert_eq!(
            DateRangeFilter::ThreeMonths.start_date(date!(2024 - 02 - 10)),
            Some(date!(2023 - 11 - 10))
        );
    }

    #[test]
    fn month_clamps_to_short_months() {
        // March 31 minus one month lands on February 29 in a leap year.
        assert_eq!(
            DateRangeFilter::Month.start_date(date!(2024 - 03 - 31)),
            Some(date!(2024 - 02 - 29))
        );
        assert_eq!(
            DateRangeFilter::Month.start_date(date!(2023 - 03 - 31)),
            Some(date!(2023 - 02 - 28))
        );
    }
}
