//! Month calendar split into Sunday-Saturday weeks

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

use super::report::month_end;
use crate::error::FieldErrors;

/// A month never spans more than six Sunday-start weeks
pub const MAX_WEEKS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CalendarWeek {
    pub week_number: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// "Jan 04"
    pub start_date_formatted: String,
    pub end_date_formatted: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CalendarMonth {
    pub month: u32,
    pub year: i32,
    /// "January"
    pub month_name: String,
    pub weeks: Vec<CalendarWeek>,
}

/// Weeks that intersect the month, starting with the week holding the 1st.
/// Boundary weeks run into the neighbouring months.
pub fn calendar_weeks(month: i64, year: i64) -> Result<CalendarMonth, FieldErrors> {
    let mut errors = FieldErrors::new();
    if !(1..=12).contains(&month) {
        errors.add("month", "The month must be between 1 and 12");
    }
    if !(1..=9999).contains(&year) {
        errors.add("year", "The year must be between 1 and 9999");
    }
    let first = match NaiveDate::from_ymd_opt(year as i32, month as u32, 1) {
        Some(first) if errors.is_empty() => first,
        _ => return Err(errors),
    };
    let last = month_end(first);

    let mut weeks = Vec::with_capacity(MAX_WEEKS);
    let mut start = first - Duration::days(first.weekday().num_days_from_sunday() as i64);
    while start <= last && weeks.len() < MAX_WEEKS {
        let end = start + Duration::days(6);
        weeks.push(CalendarWeek {
            week_number: weeks.len() as u32 + 1,
            start_date: start,
            end_date: end,
            start_date_formatted: start.format("%b %d").to_string(),
            end_date_formatted: end.format("%b %d").to_string(),
        });
        start = end + Duration::days(1);
    }

    Ok(CalendarMonth {
        month: first.month(),
        year: first.year(),
        month_name: first.format("%B").to_string(),
        weeks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn invalid_month_is_rejected() {
        assert!(calendar_weeks(13, 2025).unwrap_err().contains("month"));
        assert!(calendar_weeks(0, 2025).unwrap_err().contains("month"));
        assert!(calendar_weeks(5, 0).unwrap_err().contains("year"));
    }

    #[test]
    fn weeks_start_on_the_sunday_before_the_first() {
        // 2026-01-01 is a Thursday
        let month = calendar_weeks(1, 2026).unwrap();
        assert_eq!(month.month_name, "January");
        assert_eq!(month.weeks.len(), 5);
        assert_eq!(month.weeks[0].start_date, date(2025, 12, 28));
        assert_eq!(month.weeks[0].end_date, date(2026, 1, 3));
        assert_eq!(month.weeks[0].start_date_formatted, "Dec 28");
        assert_eq!(month.weeks[4].end_date, date(2026, 1, 31));
    }

    #[test]
    fn six_week_months_are_covered() {
        // August 2026 starts on a Saturday and ends on a Monday
        let month = calendar_weeks(8, 2026).unwrap();
        assert_eq!(month.weeks.len(), 6);
        assert_eq!(month.weeks[5].start_date, date(2026, 8, 30));
        assert_eq!(month.weeks[5].week_number, 6);
    }

    #[test]
    fn every_month_is_fully_covered() {
        for year in [2024, 2025, 2026] {
            for m in 1..=12 {
                let month = calendar_weeks(m, year).unwrap();
                let first = date(year as i32, m as u32, 1);
                let weeks = &month.weeks;
                assert!(weeks.len() <= MAX_WEEKS);
                assert!(weeks[0].start_date <= first);
                assert!(weeks[weeks.len() - 1].end_date >= month_end(first));
                for pair in weeks.windows(2) {
                    assert_eq!(pair[0].end_date + Duration::days(1), pair[1].start_date);
                }
                assert!(weeks.iter().all(|w| w.start_date.weekday() == chrono::Weekday::Sun));
            }
        }
    }
}
