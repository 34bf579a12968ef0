//! Read models behind the bills list, dashboard and calendar endpoints.
//! Everything here is pure; handlers load rows and pass "today" in.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use time::{Date, Duration, Month};
use uuid::Uuid;

use super::{dto::StatusFilter, repo_types::Bill};
use crate::config::MAX_UPCOMING_WINDOW_DAYS;
use crate::creditors::repo_types::Creditor;
use crate::recurrence::MaterializeReport;

/// A bill with its creditor embedded.
#[derive(Debug, Clone, Serialize)]
pub struct BillView {
    #[serde(flatten)]
    pub bill: Bill,
    pub creditor: Option<Creditor>,
}

pub fn with_creditors(bills: Vec<Bill>, creditors: Vec<Creditor>) -> Vec<BillView> {
    let by_id: HashMap<Uuid, Creditor> = creditors.into_iter().map(|c| (c.id, c)).collect();
    bills
        .into_iter()
        .map(|bill| BillView {
            creditor: by_id.get(&bill.creditor_id).cloned(),
            bill,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    Upcoming,
    Overdue,
    Paid,
}

impl BillStatus {
    pub fn of(bill: &Bill, today: Date) -> Self {
        if bill.is_paid {
            BillStatus::Paid
        } else if bill.due_date < today {
            BillStatus::Overdue
        } else {
            BillStatus::Upcoming
        }
    }

    fn matches(self, filter: StatusFilter) -> bool {
        match filter {
            StatusFilter::All => true,
            StatusFilter::Upcoming => self == BillStatus::Upcoming,
            StatusFilter::Overdue => self == BillStatus::Overdue,
            StatusFilter::Paid => self == BillStatus::Paid,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub upcoming: usize,
    pub overdue: usize,
    pub paid: usize,
}

#[derive(Debug, Serialize)]
pub struct BillList {
    pub counts: StatusCounts,
    pub bills: Vec<BillView>,
    pub generated: MaterializeReport,
}

/// Counts every bucket and keeps the bills that pass `filter`.
pub fn bill_list(
    views: Vec<BillView>,
    filter: StatusFilter,
    today: Date,
    generated: MaterializeReport,
) -> BillList {
    let mut counts = StatusCounts::default();
    let mut bills = Vec::new();
    for view in views {
        let status = BillStatus::of(&view.bill, today);
        match status {
            BillStatus::Upcoming => counts.upcoming += 1,
            BillStatus::Overdue => counts.overdue += 1,
            BillStatus::Paid => counts.paid += 1,
        }
        if status.matches(filter) {
            bills.push(view);
        }
    }
    BillList {
        counts,
        bills,
        generated,
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub total_bills: usize,
    pub paid_bills: usize,
    pub unpaid_bills: usize,
    pub overdue_count: usize,
    pub window_days: i64,
    /// Upcoming bills inside the window plus everything overdue.
    pub amount_due: Decimal,
    pub overdue: Vec<BillView>,
    pub upcoming: Vec<BillView>,
}

pub fn dashboard(views: Vec<BillView>, today: Date, window_days: i64) -> DashboardSummary {
    let window = Duration::days(window_days.clamp(0, MAX_UPCOMING_WINDOW_DAYS));
    let window_end = today.checked_add(window).unwrap_or(Date::MAX);

    let total_bills = views.len();
    let paid_bills = views.iter().filter(|v| v.bill.is_paid).count();
    let mut overdue = Vec::new();
    let mut upcoming = Vec::new();
    for view in views {
        match BillStatus::of(&view.bill, today) {
            BillStatus::Overdue => overdue.push(view),
            BillStatus::Upcoming if view.bill.due_date <= window_end => upcoming.push(view),
            _ => {}
        }
    }
    let amount_due = overdue
        .iter()
        .chain(upcoming.iter())
        .map(|v| v.bill.amount)
        .sum();

    DashboardSummary {
        total_bills,
        paid_bills,
        unpaid_bills: total_bills - paid_bills,
        overdue_count: overdue.len(),
        window_days,
        amount_due,
        overdue,
        upcoming,
    }
}

#[derive(Debug, Serialize)]
pub struct CalendarDay {
    pub day: u8,
    pub date: Date,
    pub is_today: bool,
    pub bills: Vec<BillView>,
}

#[derive(Debug, Serialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u8,
    pub month_name: String,
    /// Empty cells before the 1st in a Sunday-first grid.
    pub leading_blank_days: u8,
    pub days_in_month: u8,
    pub days: Vec<CalendarDay>,
}

/// First and last day of a month, `None` if the year is out of range.
pub fn month_bounds(year: i32, month: Month) -> Option<(Date, Date)> {
    let first = Date::from_calendar_date(year, month, 1).ok()?;
    let last = Date::from_calendar_date(year, month, month.length(year)).ok()?;
    Some((first, last))
}

/// Lays `views` out on the days of one month; bills outside it are ignored.
pub fn calendar_month(first: Date, today: Date, views: Vec<BillView>) -> CalendarMonth {
    let (year, month) = (first.year(), first.month());
    let mut by_day: HashMap<u8, Vec<BillView>> = HashMap::new();
    for view in views {
        let due = view.bill.due_date;
        if due.year() == year && due.month() == month {
            by_day.entry(due.day()).or_default().push(view);
        }
    }

    let mut days = Vec::new();
    let mut date = first;
    while date.month() == month && date.year() == year {
        days.push(CalendarDay {
            day: date.day(),
            date,
            is_today: date == today,
            bills: by_day.remove(&date.day()).unwrap_or_default(),
        });
        match date.next_day() {
            Some(next) => date = next,
            None => break,
        }
    }

    CalendarMonth {
        year,
        month: u8::from(month),
        month_name: month.to_string(),
        leading_blank_days: first.weekday().number_days_from_sunday(),
        days_in_month: days.len() as u8,
        days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bills::repo_types::NewBill;
    use time::{macros::date, OffsetDateTime};

    fn bill(name: &str, cents: i64, due: Date, paid: bool, creditor_id: Uuid) -> Bill {
        NewBill {
            user_id: Uuid::nil(),
            creditor_id,
            template_id: None,
            is_generated: false,
            name: name.into(),
            amount: Decimal::new(cents, 2),
            due_date: due,
            is_paid: paid,
            paid_date: paid.then_some(due),
            login_username: None,
            login_password: None,
            notes: None,
            is_recurring: false,
            recurrence_frequency: None,
            recurrence_day: None,
        }
        .into_bill()
    }

    fn views(bills: Vec<Bill>) -> Vec<BillView> {
        with_creditors(bills, Vec::new())
    }

    const TODAY: Date = date!(2024 - 03 - 15);

    #[test]
    fn status_follows_paid_flag_then_due_date() {
        let c = Uuid::new_v4();
        assert_eq!(BillStatus::of(&bill("a", 1, date!(2024 - 03 - 01), true, c), TODAY), BillStatus::Paid);
        assert_eq!(BillStatus::of(&bill("b", 1, date!(2024 - 03 - 14), false, c), TODAY), BillStatus::Overdue);
        assert_eq!(BillStatus::of(&bill("c", 1, TODAY, false, c), TODAY), BillStatus::Upcoming);
    }

    #[test]
    fn list_counts_all_buckets_but_filters_bills() {
        let c = Uuid::new_v4();
        let rows = vec![
            bill("late", 100, date!(2024 - 03 - 01), false, c),
            bill("soon", 200, date!(2024 - 03 - 20), false, c),
            bill("done", 300, date!(2024 - 03 - 02), true, c),
            bill("later", 400, date!(2024 - 06 - 01), false, c),
        ];

        let list = bill_list(views(rows), StatusFilter::Upcoming, TODAY, MaterializeReport::default());

        assert_eq!(list.counts, StatusCounts { upcoming: 2, overdue: 1, paid: 1 });
        let names: Vec<&str> = list.bills.iter().map(|v| v.bill.name.as_str()).collect();
        assert_eq!(names, vec!["soon", "later"]);
    }

    #[test]
    fn dashboard_sums_window_and_overdue() {
        let c = Uuid::new_v4();
        let rows = vec![
            bill("late", 1000, date!(2024 - 03 - 01), false, c),
            bill("soon", 2550, date!(2024 - 04 - 14), false, c),
            bill("edge", 100, date!(2024 - 04 - 15), false, c),
            bill("far", 9900, date!(2024 - 05 - 01), false, c),
            bill("done", 5000, date!(2024 - 03 - 20), true, c),
        ];

        let summary = dashboard(views(rows), TODAY, 31);

        assert_eq!(summary.total_bills, 5);
        assert_eq!(summary.paid_bills, 1);
        assert_eq!(summary.unpaid_bills, 4);
        assert_eq!(summary.overdue_count, 1);
        assert_eq!(summary.upcoming.len(), 2);
        assert_eq!(summary.amount_due, Decimal::new(3650, 2));
    }

    #[test]
    fn huge_window_is_capped_instead_of_overflowing() {
        let c = Uuid::new_v4();
        let rows = vec![
            bill("soon", 100, date!(2024 - 04 - 01), false, c),
            bill("next_century", 200, date!(2200 - 01 - 01), false, c),
        ];

        let summary = dashboard(views(rows), TODAY, 200_000_000_000_000);

        assert_eq!(summary.upcoming.len(), 1);
        assert_eq!(summary.amount_due, Decimal::new(100, 2));
        assert!(dashboard(Vec::new(), Date::MAX, i64::MAX).upcoming.is_empty());
    }

    #[test]
    fn creditors_are_embedded_by_id() {
        let now = OffsetDateTime::now_utc();
        let creditor = Creditor {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            name: "Comcast".into(),
            website: None,
            phone: None,
            account_number: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        let out = with_creditors(
            vec![
                bill("internet", 6000, TODAY, false, creditor.id),
                bill("orphan", 1, TODAY, false, Uuid::new_v4()),
            ],
            vec![creditor],
        );
        assert_eq!(out[0].creditor.as_ref().map(|c| c.name.as_str()), Some("Comcast"));
        assert!(out[1].creditor.is_none());

        let json = serde_json::to_value(&out[0]).unwrap();
        assert_eq!(json["name"], "internet");
        assert_eq!(json["due_date"], "2024-03-15");
        assert_eq!(json["creditor"]["name"], "Comcast");
    }

    #[test]
    fn calendar_places_bills_on_their_days() {
        let c = Uuid::new_v4();
        let (first, last) = month_bounds(2024, Month::February).unwrap();
        assert_eq!(last, date!(2024 - 02 - 29));

        let month = calendar_month(
            first,
            date!(2024 - 02 - 10),
            views(vec![
                bill("rent", 1, date!(2024 - 02 - 01), false, c),
                bill("gym", 1, date!(2024 - 02 - 29), false, c),
                bill("gym", 1, date!(2024 - 02 - 29), false, c),
                bill("march", 1, date!(2024 - 03 - 01), false, c),
            ]),
        );

        assert_eq!(month.year, 2024);
        assert_eq!(month.month, 2);
        assert_eq!(month.month_name, "February");
        assert_eq!(month.days_in_month, 29);
        assert_eq!(month.leading_blank_days, 4); // 2024-02-01 was a Thursday
        assert_eq!(month.days[0].bills.len(), 1);
        assert_eq!(month.days[28].bills.len(), 2);
        assert!(month.days[9].is_today);
        assert_eq!(month.days.iter().map(|d| d.bills.len()).sum::<usize>(), 3);
    }
}
