//! Spending analytics for a group over a date range.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::schemas::{Expense, ExpenseCategory, Member};
use crate::validation::ValidationError;

pub const TOP_EXPENSES: usize = 5;

/// Inclusive range of calendar days (UTC). A missing bound leaves that side open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReportRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl ReportRange {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start > end => Err(ValidationError::InvalidDateRange),
            _ => Ok(()),
        }
    }

    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        let day = date.date_naive();
        self.start.map_or(true, |start| day >= start) && self.end.map_or(true, |end| day <= end)
    }

    /// The period of the same length that ends the day before this one starts.
    /// Only closed ranges have one.
    pub fn previous(&self) -> Option<ReportRange> {
        let (start, end) = (self.start?, self.end?);
        let days = (end - start).num_days();
        let previous_end = start.pred_opt()?;
        let previous_start = previous_end.checked_sub_signed(Duration::days(days))?;
        Some(ReportRange {
            start: Some(previous_start),
            end: Some(previous_end),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: ExpenseCategory,
    pub amount: f64,
    /// Share of the period's total, 0 when nothing was spent.
    pub percentage: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MemberPaid {
    pub member: Member,
    pub amount: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupReport {
    pub range: ReportRange,
    pub total_spent: f64,
    pub expense_count: usize,
    pub average_expense: f64,
    pub previous_total: f64,
    /// Percent change of `total_spent` against `previous_total`; 0 without a
    /// previous period or when nothing was spent in it.
    pub trend_percentage: f64,
    pub by_category: Vec<CategoryTotal>,
    pub paid_by_member: Vec<MemberPaid>,
    pub top_expenses: Vec<Expense>,
}

fn total(expenses: &[&Expense]) -> f64 {
    expenses.iter().map(|expense| expense.amount).sum()
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Totals use the nominal expense `amount`. Transfers are included, the same
/// way the group summary counts them. Payments by ids outside `members` add to
/// the totals but get no row in `paid_by_member`.
pub fn group_report(expenses: &[Expense], members: &[Member], range: ReportRange) -> GroupReport {
    let in_range: Vec<&Expense> = expenses
        .iter()
        .filter(|expense| range.contains(expense.date))
        .collect();

    let total_spent = total(&in_range);
    let expense_count = in_range.len();
    let average_expense = if expense_count > 0 {
        total_spent / expense_count as f64
    } else {
        0.0
    };

    let previous_total = range.previous().map_or(0.0, |previous| {
        let earlier: Vec<&Expense> = expenses
            .iter()
            .filter(|expense| previous.contains(expense.date))
            .collect();
        total(&earlier)
    });
    let trend_percentage = if previous_total > 0.0 {
        (total_spent - previous_total) / previous_total * 100.0
    } else {
        0.0
    };

    // Vecs keep first-seen order, so the stable sorts below break ties by it.
    let mut categories: Vec<(ExpenseCategory, f64)> = Vec::new();
    let mut payers: Vec<(&str, f64)> = Vec::new();
    for expense in &in_range {
        match categories
            .iter_mut()
            .find(|(category, _)| *category == expense.category)
        {
            Some((_, amount)) => *amount += expense.amount,
            None => categories.push((expense.category, expense.amount)),
        }
        for payer in &expense.payers {
            match payers
                .iter_mut()
                .find(|(id, _)| *id == payer.member_id.as_str())
            {
                Some((_, amount)) => *amount += payer.amount,
                None => payers.push((payer.member_id.as_str(), payer.amount)),
            }
        }
    }

    let mut by_category: Vec<CategoryTotal> = categories
        .into_iter()
        .map(|(category, amount)| CategoryTotal {
            category,
            amount,
            percentage: if total_spent > 0.0 {
                amount / total_spent * 100.0
            } else {
                0.0
            },
        })
        .collect();
    by_category.sort_by(|a, b| descending(a.amount, b.amount));

    let mut paid_by_member: Vec<MemberPaid> = payers
        .into_iter()
        .filter_map(|(id, amount)| {
            let member = members.iter().find(|member| member.id == id)?;
            Some(MemberPaid {
                member: member.clone(),
                amount,
            })
        })
        .collect();
    paid_by_member.sort_by(|a, b| descending(a.amount, b.amount));

    let mut top_expenses: Vec<Expense> = in_range.iter().map(|&expense| expense.clone()).collect();
    top_expenses.sort_by(|a, b| descending(a.amount, b.amount));
    top_expenses.truncate(TOP_EXPENSES);

    debug!(
        expenses = expense_count,
        categories = by_category.len(),
        "built group report"
    );

    GroupReport {
        range,
        total_spent,
        expense_count,
        average_expense,
        previous_total,
        trend_percentage,
        by_category,
        paid_by_member,
        top_expenses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::tests::{expense, member};
    use chrono::TimeZone;
    use rstest::rstest;

    fn day(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).unwrap()
    }

    fn dated(
        amount: f64,
        payer: &str,
        (month, day_of_month): (u32, u32),
        category: ExpenseCategory,
    ) -> Expense {
        let mut expense = expense(amount, &[(payer, amount)], &[]);
        expense.date = Utc
            .with_ymd_and_hms(2025, month, day_of_month, 18, 30, 0)
            .unwrap();
        expense.category = category;
        expense
    }

    fn november() -> ReportRange {
        ReportRange {
            start: Some(day(11, 1)),
            end: Some(day(11, 30)),
        }
    }

    #[test]
    fn summarises_a_month_against_the_one_before() {
        let members = vec![member("a"), member("b")];
        let expenses = vec![
            dated(100.0, "a", (11, 5), ExpenseCategory::Dining),
            dated(50.0, "b", (11, 20), ExpenseCategory::Groceries),
            dated(30.0, "a", (11, 30), ExpenseCategory::Dining),
            dated(80.0, "b", (10, 20), ExpenseCategory::Travel),
            dated(999.0, "a", (12, 1), ExpenseCategory::Travel),
        ];

        let report = group_report(&expenses, &members, november());

        assert_eq!(report.total_spent, 180.0);
        assert_eq!(report.expense_count, 3);
        assert_eq!(report.average_expense, 60.0);
        assert_eq!(report.previous_total, 80.0);
        assert_eq!(report.trend_percentage, 125.0);

        let categories: Vec<_> = report
            .by_category
            .iter()
            .map(|entry| (entry.category, entry.amount))
            .collect();
        assert_eq!(
            categories,
            vec![(ExpenseCategory::Dining, 130.0), (ExpenseCategory::Groceries, 50.0)]
        );
        assert!((report.by_category[0].percentage - 72.222).abs() < 1e-3);

        let paid: Vec<_> = report
            .paid_by_member
            .iter()
            .map(|entry| (entry.member.id.as_str(), entry.amount))
            .collect();
        assert_eq!(paid, vec![("a", 130.0), ("b", 50.0)]);

        let top: Vec<_> = report.top_expenses.iter().map(|e| e.amount).collect();
        assert_eq!(top, vec![100.0, 50.0, 30.0]);
    }

    #[test]
    fn open_range_covers_everything_without_trend() {
        let expenses = vec![
            dated(10.0, "a", (1, 2), ExpenseCategory::Bills),
            dated(20.0, "a", (12, 31), ExpenseCategory::Bills),
        ];
        let report = group_report(&expenses, &[member("a")], ReportRange::default());
        assert_eq!(report.total_spent, 30.0);
        assert_eq!(report.previous_total, 0.0);
        assert_eq!(report.trend_percentage, 0.0);
    }

    #[test]
    fn empty_period_reports_zeros() {
        let report = group_report(&[], &[member("a")], november());
        assert_eq!(report.total_spent, 0.0);
        assert_eq!(report.average_expense, 0.0);
        assert!(report.by_category.is_empty());
        assert!(report.paid_by_member.is_empty());
        assert!(report.top_expenses.is_empty());
    }

    #[test]
    fn former_members_count_in_totals_only() {
        let expenses = vec![
            dated(40.0, "a", (11, 3), ExpenseCategory::Pets),
            dated(60.0, "gone", (11, 4), ExpenseCategory::Pets),
        ];
        let report = group_report(&expenses, &[member("a")], november());
        assert_eq!(report.total_spent, 100.0);
        assert_eq!(report.paid_by_member.len(), 1);
        assert_eq!(report.paid_by_member[0].amount, 40.0);
    }

    #[test]
    fn keeps_five_largest_expenses_in_order_of_appearance_on_ties() {
        let mut expenses: Vec<Expense> = [5.0, 70.0, 20.0, 70.0, 1.0, 30.0, 40.0]
            .iter()
            .map(|amount| dated(*amount, "a", (11, 10), ExpenseCategory::Other))
            .collect();
        expenses[3].id = "second-seventy".to_string();

        let report = group_report(&expenses, &[member("a")], november());

        let top: Vec<_> = report.top_expenses.iter().map(|e| e.amount).collect();
        assert_eq!(top, vec![70.0, 70.0, 40.0, 30.0, 20.0]);
        assert_eq!(report.top_expenses[1].id, "second-seventy");
    }

    #[rstest]
    #[case::first_day(Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap(), true)]
    #[case::last_second(Utc.with_ymd_and_hms(2025, 11, 30, 23, 59, 59).unwrap(), true)]
    #[case::day_before(Utc.with_ymd_and_hms(2025, 10, 31, 23, 59, 59).unwrap(), false)]
    #[case::day_after(Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap(), false)]
    fn range_bounds_are_whole_days(#[case] date: DateTime<Utc>, #[case] inside: bool) {
        assert_eq!(november().contains(date), inside);
    }

    #[rstest]
    #[case::month(november(), Some((day(10, 2), day(10, 31))))]
    #[case::single_day(
        ReportRange { start: Some(day(3, 1)), end: Some(day(3, 1)) },
        Some((day(2, 28), day(2, 28)))
    )]
    #[case::open_end(ReportRange { start: Some(day(3, 1)), end: None }, None)]
    fn previous_period_has_the_same_length(
        #[case] range: ReportRange,
        #[case] expected: Option<(NaiveDate, NaiveDate)>,
    ) {
        let previous = range
            .previous()
            .map(|previous| (previous.start.unwrap(), previous.end.unwrap()));
        assert_eq!(previous, expected);
    }

    #[test]
    fn start_after_end_is_rejected() {
        let range = ReportRange {
            start: Some(day(11, 30)),
            end: Some(day(11, 1)),
        };
        assert_eq!(range.validate(), Err(ValidationError::InvalidDateRange));
        assert_eq!(november().validate(), Ok(()));
    }
}
