use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month};

/// How often a recurring bill comes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "recurrence_frequency", rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// Returns the due date one period after `anchor`.
    ///
    /// Monthly and yearly steps land on `preferred_day` (the series' original
    /// day-of-month), clamped to the last day of the target month, so a bill
    /// due on the 31st goes Jan 31 -> Feb 29 -> Mar 31 instead of drifting.
    /// `None` means the calendar ran out of range.
    pub fn advance(self, anchor: Date, preferred_day: u8) -> Option<Date> {
        match self {
            Frequency::Weekly => anchor.checked_add(Duration::weeks(1)),
            Frequency::Monthly => {
                let (year, month) = match anchor.month() {
                    Month::December => (anchor.year().checked_add(1)?, Month::January),
                    other => (anchor.year(), other.next()),
                };
                clamped_date(year, month, preferred_day)
            }
            Frequency::Yearly => {
                clamped_date(anchor.year().checked_add(1)?, anchor.month(), preferred_day)
            }
        }
    }

    /// Valid values of the stored recurrence day for this frequency.
    pub fn day_range(self) -> RangeInclusive<i16> {
        match self {
            Frequency::Weekly => 1..=7,
            Frequency::Monthly => 1..=31,
            Frequency::Yearly => 1..=365,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Adds whole calendar months, clamping the day to the target month.
pub fn add_months(date: Date, months: u32) -> Option<Date> {
    let zero_based = i64::from(u8::from(date.month())) - 1 + i64::from(months);
    let year = i64::from(date.year()).checked_add(zero_based.div_euclid(12))?;
    let year = i32::try_from(year).ok()?;
    let month = Month::try_from((zero_based.rem_euclid(12) + 1) as u8).ok()?;
    clamped_date(year, month, date.day())
}

pub(crate) fn clamped_date(year: i32, month: Month, day: u8) -> Option<Date> {
    let day = day.clamp(1, month.length(year));
    Date::from_calendar_date(year, month, day).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn weekly_adds_seven_days_across_month_end() {
        assert_eq!(
            Frequency::Weekly.advance(date!(2024 - 01 - 29), 29),
            Some(date!(2024 - 02 - 05))
        );
    }

    #[test]
    fn monthly_clamps_to_short_months_and_recovers() {
        let f = Frequency::Monthly;
        let feb = f.advance(date!(2024 - 01 - 31), 31).unwrap();
        assert_eq!(feb, date!(2024 - 02 - 29));
        let mar = f.advance(feb, 31).unwrap();
        assert_eq!(mar, date!(2024 - 03 - 31));
        let apr = f.advance(mar, 31).unwrap();
        assert_eq!(apr, date!(2024 - 04 - 30));
        assert_eq!(
            f.advance(date!(2023 - 01 - 31), 31),
            Some(date!(2023 - 02 - 28))
        );
    }

    #[test]
    fn monthly_rolls_over_the_year() {
        assert_eq!(
            Frequency::Monthly.advance(date!(2024 - 12 - 15), 15),
            Some(date!(2025 - 01 - 15))
        );
    }

    #[test]
    fn yearly_leap_day_clamps_then_returns() {
        let f = Frequency::Yearly;
        assert_eq!(
            f.advance(date!(2024 - 02 - 29), 29),
            Some(date!(2025 - 02 - 28))
        );
        assert_eq!(
            f.advance(date!(2027 - 02 - 28), 29),
            Some(date!(2028 - 02 - 29))
        );
    }

    #[test]
    fn advance_past_calendar_end_is_none() {
        assert_eq!(Frequency::Weekly.advance(Date::MAX, 31), None);
        assert_eq!(Frequency::Yearly.advance(Date::MAX, 31), None);
    }

    #[test]
    fn add_months_clamps_day() {
        assert_eq!(add_months(date!(2024 - 11 - 30), 3), Some(date!(2025 - 02 - 28)));
        assert_eq!(add_months(date!(2024 - 02 - 01), 3), Some(date!(2024 - 05 - 01)));
        assert_eq!(add_months(date!(2024 - 02 - 01), 12), Some(date!(2025 - 02 - 01)));
    }

    #[test]
    fn day_ranges_follow_frequency() {
        assert!(Frequency::Weekly.day_range().contains(&7));
        assert!(!Frequency::Weekly.day_range().contains(&8));
        assert!(Frequency::Monthly.day_range().contains(&31));
        assert!(Frequency::Yearly.day_range().contains(&365));
        assert!(!Frequency::Yearly.day_range().contains(&0));
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&Frequency::Monthly).unwrap();
        assert_eq!(json, "\"monthly\"");
        let back: Frequency = serde_json::from_str("\"yearly\"").unwrap();
        assert_eq!(back, Frequency::Yearly);
    }
}
