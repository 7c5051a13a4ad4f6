//! Report and dashboard models with their aggregation rules

use chrono::{Datelike, Duration, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::{
    booking::{money, parse_date, BookingDetails, PaymentStatus},
    category::Category,
};
use crate::error::FieldErrors;

/// Bucket size of the revenue report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Day,
    Week,
    Month,
}

impl std::str::FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(GroupBy::Day),
            "week" => Ok(GroupBy::Week),
            "month" => Ok(GroupBy::Month),
            _ => Err(format!("Invalid grouping: {}", s)),
        }
    }
}

/// Query parameters shared by the date range reports
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct ReportQuery {
    /// YYYY-MM-DD, inclusive
    pub date_from: Option<String>,
    /// YYYY-MM-DD, inclusive, on or after date_from
    pub date_to: Option<String>,
    pub category_id: Option<i32>,
    /// day, week or month (revenue report only)
    pub group_by: Option<String>,
}

/// Inclusive date range of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct DateRange {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

impl ReportQuery {
    pub fn range(&self) -> Result<DateRange, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut parse = |field: &str, value: Option<&str>| match value.map(str::trim) {
            None | Some("") => {
                errors.add(field, format!("The {} field is required", field));
                None
            }
            Some(raw) => {
                let date = parse_date(raw);
                if date.is_none() {
                    errors.add(field, format!("The {} is not a valid date", field));
                }
                date
            }
        };
        let from = parse("date_from", self.date_from.as_deref());
        let to = parse("date_to", self.date_to.as_deref());

        match (from, to) {
            (Some(date_from), Some(date_to)) if date_to >= date_from => {
                Ok(DateRange { date_from, date_to })
            }
            (Some(_), Some(_)) => {
                errors.add("date_to", "The date_to must be a date after or equal to date_from");
                Err(errors)
            }
            _ => Err(errors),
        }
    }

    pub fn group_by(&self) -> Result<GroupBy, FieldErrors> {
        match self.group_by.as_deref() {
            None | Some("") => Ok(GroupBy::Day),
            Some(raw) => raw.parse().map_err(|_| {
                let mut errors = FieldErrors::new();
                errors.add("group_by", "The selected group_by is invalid");
                errors
            }),
        }
    }
}

/// The fields of a booking that reports aggregate over
#[derive(Debug, Clone, FromRow)]
pub struct BookingFact {
    pub booking_date: NaiveDate,
    pub category_id: i32,
    pub payment_status: PaymentStatus,
    pub total_amount: Decimal,
}

/// Booking count and revenue per payment status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct RevenueSummary {
    pub total_bookings: i64,
    pub total_revenue: Decimal,
    pub paid_revenue: Decimal,
    pub pending_revenue: Decimal,
    pub partial_revenue: Decimal,
}

impl RevenueSummary {
    pub fn add(&mut self, status: PaymentStatus, bookings: i64, revenue: Decimal) {
        self.total_bookings += bookings;
        self.total_revenue += revenue;
        match status {
            PaymentStatus::Paid => self.paid_revenue += revenue,
            PaymentStatus::Pending => self.pending_revenue += revenue,
            PaymentStatus::Partial => self.partial_revenue += revenue,
        }
    }

    pub fn from_facts<'a>(facts: impl IntoIterator<Item = &'a BookingFact>) -> Self {
        let mut summary = Self::default();
        for fact in facts {
            summary.add(fact.payment_status, 1, fact.total_amount);
        }
        summary.normalized()
    }

    pub fn from_bookings(bookings: &[BookingDetails]) -> Self {
        let mut summary = Self::default();
        for details in bookings {
            summary.add(details.booking.payment_status, 1, details.booking.total_amount);
        }
        summary.normalized()
    }

    fn normalized(mut self) -> Self {
        self.total_revenue = money(self.total_revenue);
        self.paid_revenue = money(self.paid_revenue);
        self.pending_revenue = money(self.pending_revenue);
        self.partial_revenue = money(self.partial_revenue);
        self
    }
}

/// One bucket of the revenue report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RevenueBucket {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: String,
    pub total_bookings: i64,
    pub total_revenue: Decimal,
    pub paid_revenue: Decimal,
}

/// Monday of the week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Last day of the month containing `date`
pub fn month_end(date: NaiveDate) -> NaiveDate {
    month_start(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// Contiguous periods covering `range`, each with its display label
pub fn bucket_bounds(range: DateRange, group_by: GroupBy) -> Vec<(NaiveDate, NaiveDate, String)> {
    let mut buckets = Vec::new();
    let mut start = match group_by {
        GroupBy::Day => range.date_from,
        GroupBy::Week => week_start(range.date_from),
        GroupBy::Month => month_start(range.date_from),
    };

    while start <= range.date_to {
        let (end, label) = match group_by {
            GroupBy::Day => (start, start.format("%b %d, %Y").to_string()),
            GroupBy::Week => {
                let end = start + Duration::days(6);
                let label = format!("{} - {}", start.format("%b %d"), end.format("%b %d, %Y"));
                (end, label)
            }
            GroupBy::Month => (month_end(start), start.format("%B %Y").to_string()),
        };
        buckets.push((start, end, label));
        match end.succ_opt() {
            Some(next) => start = next,
            None => break,
        }
    }
    buckets
}

/// Revenue per period. Empty periods are kept with zero values.
pub fn revenue_buckets(
    range: DateRange,
    group_by: GroupBy,
    facts: &[BookingFact],
) -> Vec<RevenueBucket> {
    bucket_bounds(range, group_by)
        .into_iter()
        .map(|(start, end, label)| {
            let summary = RevenueSummary::from_facts(
                facts
                    .iter()
                    .filter(|f| f.booking_date >= start && f.booking_date <= end),
            );
            RevenueBucket {
                start,
                end,
                label,
                total_bookings: summary.total_bookings,
                total_revenue: summary.total_revenue,
                paid_revenue: summary.paid_revenue,
            }
        })
        .collect()
}

/// Category line of the category-wise report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CategoryReportRow {
    pub category_id: i32,
    pub category_name_en: String,
    pub category_name_ar: String,
    #[serde(flatten)]
    pub summary: RevenueSummary,
}

/// Every category with its totals, zero-filled for categories without bookings
pub fn category_breakdown(
    categories: &[Category],
    facts: &[BookingFact],
) -> Vec<CategoryReportRow> {
    categories
        .iter()
        .map(|category| {
            let own = facts.iter().filter(|f| f.category_id == category.id);
            CategoryReportRow {
                category_id: category.id,
                category_name_en: category.name_en.clone(),
                category_name_ar: category.name_ar.clone(),
                summary: RevenueSummary::from_facts(own),
            }
        })
        .collect()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingsReport {
    #[serde(flatten)]
    pub range: DateRange,
    pub summary: RevenueSummary,
    pub bookings: Vec<BookingDetails>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RevenueReport {
    #[serde(flatten)]
    pub range: DateRange,
    pub group_by: GroupBy,
    pub data: Vec<RevenueBucket>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryWiseReport {
    #[serde(flatten)]
    pub range: DateRange,
    pub categories: Vec<CategoryReportRow>,
}

/// Booking count and revenue for one payment status
#[derive(Debug, Clone, FromRow)]
pub struct StatusTotal {
    pub payment_status: PaymentStatus,
    pub bookings: i64,
    pub revenue: Decimal,
}

/// Booking count and revenue for one calendar month
#[derive(Debug, Clone, FromRow)]
pub struct MonthTotal {
    pub year: i32,
    pub month: i32,
    pub bookings: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct BookingCounts {
    pub today: i64,
    /// Monday of this week up to today
    pub week: i64,
    /// First of this month up to today
    pub month: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct RevenueTotals {
    pub total: Decimal,
    pub pending: Decimal,
    pub paid: Decimal,
    pub partial: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusCounts {
    pub pending: i64,
    pub partial: i64,
    pub paid: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
pub struct CategoryCount {
    pub id: i32,
    pub name_en: String,
    pub name_ar: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MonthlyTrend {
    /// "Jan 2026"
    pub month: String,
    pub month_number: u32,
    pub year: i32,
    pub bookings: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardStats {
    pub bookings: BookingCounts,
    pub revenue: RevenueTotals,
    pub bookings_by_category: Vec<CategoryCount>,
    pub bookings_by_status: StatusCounts,
    pub monthly_trends: Vec<MonthlyTrend>,
}

/// Date windows behind the dashboard counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardWindows {
    pub today: NaiveDate,
    pub week_start: NaiveDate,
    pub month_start: NaiveDate,
    /// First day of the oldest month in the trend series
    pub trend_start: NaiveDate,
}

/// Number of months in the dashboard trend series
pub const TREND_MONTHS: u32 = 6;

impl DashboardWindows {
    pub fn new(today: NaiveDate) -> Self {
        let month_start = month_start(today);
        Self {
            today,
            week_start: week_start(today),
            month_start,
            trend_start: month_start
                .checked_sub_months(Months::new(TREND_MONTHS - 1))
                .unwrap_or(month_start),
        }
    }
}

/// First day of each of the `count` months ending with the month of `today`, oldest first
pub fn trailing_months(today: NaiveDate, count: u32) -> Vec<NaiveDate> {
    let current = month_start(today);
    (0..count)
        .rev()
        .filter_map(|back| current.checked_sub_months(Months::new(back)))
        .collect()
}

/// Trend series for the dashboard with zeros for months without bookings
pub fn monthly_trends(today: NaiveDate, totals: &[MonthTotal]) -> Vec<MonthlyTrend> {
    trailing_months(today, TREND_MONTHS)
        .into_iter()
        .map(|first| {
            let found = totals
                .iter()
                .find(|t| t.year == first.year() && t.month == first.month() as i32);
            MonthlyTrend {
                month: first.format("%b %Y").to_string(),
                month_number: first.month(),
                year: first.year(),
                bookings: found.map(|t| t.bookings).unwrap_or(0),
                revenue: money(found.map(|t| t.revenue).unwrap_or(Decimal::ZERO)),
            }
        })
        .collect()
}

/// Revenue and count per status from grouped totals
pub fn status_breakdown(totals: &[StatusTotal]) -> (RevenueTotals, StatusCounts) {
    let mut summary = RevenueSummary::default();
    let mut counts = StatusCounts::default();
    for total in totals {
        summary.add(total.payment_status, total.bookings, total.revenue);
        match total.payment_status {
            PaymentStatus::Pending => counts.pending += total.bookings,
            PaymentStatus::Partial => counts.partial += total.bookings,
            PaymentStatus::Paid => counts.paid += total.bookings,
        }
    }
    let summary = summary.normalized();
    (
        RevenueTotals {
            total: summary.total_revenue,
            pending: summary.pending_revenue,
            paid: summary.paid_revenue,
            partial: summary.partial_revenue,
        },
        counts,
    )
}

/// Query for the recent bookings widget
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct RecentQuery {
    /// Defaults to 10, at most 100
    pub limit: Option<i64>,
}

impl RecentQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }
}
