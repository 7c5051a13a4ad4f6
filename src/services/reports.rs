//! Dashboard, reports and calendar

use chrono::NaiveDate;

use crate::{
    error::AppResult,
    models::{
        booking::BookingDetails,
        calendar::{calendar_weeks, CalendarMonth},
        report::{
            category_breakdown, monthly_trends, revenue_buckets, status_breakdown, BookingCounts,
            BookingsReport, CategoryWiseReport, DashboardStats, DashboardWindows, ReportQuery,
            RevenueReport, RevenueSummary,
        },
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct ReportsService {
    repository: Repository,
}

impl ReportsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Headline numbers as of `today`
    pub async fn dashboard(&self, today: NaiveDate) -> AppResult<DashboardStats> {
        let windows = DashboardWindows::new(today);
        let repo = &self.repository;

        let bookings = BookingCounts {
            today: repo.reports_count_bookings(Some((today, today))).await?,
            week: repo.reports_count_bookings(Some((windows.week_start, today))).await?,
            month: repo.reports_count_bookings(Some((windows.month_start, today))).await?,
            total: repo.reports_count_bookings(None).await?,
        };
        let (revenue, bookings_by_status) = status_breakdown(&repo.reports_status_totals().await?);
        let bookings_by_category = repo.reports_category_counts().await?;
        let month_totals = repo.reports_month_totals(windows.trend_start).await?;

        Ok(DashboardStats {
            bookings,
            revenue,
            bookings_by_category,
            bookings_by_status,
            monthly_trends: monthly_trends(today, &month_totals),
        })
    }

    pub async fn recent(&self, limit: i64) -> AppResult<Vec<BookingDetails>> {
        self.repository.bookings_recent(limit).await
    }

    /// Bookings in a date range with a revenue summary
    pub async fn bookings(&self, query: &ReportQuery) -> AppResult<BookingsReport> {
        let range = query.range()?;
        let bookings = self.repository.bookings_in_range(range, query.category_id).await?;

        Ok(BookingsReport {
            range,
            summary: RevenueSummary::from_bookings(&bookings),
            bookings,
        })
    }

    /// Revenue per day, week or month over a date range
    pub async fn revenue(&self, query: &ReportQuery) -> AppResult<RevenueReport> {
        let range = query.range()?;
        let group_by = query.group_by()?;
        let facts = self.repository.reports_booking_facts(range).await?;
        Ok(RevenueReport {
            range,
            group_by,
            data: revenue_buckets(range, group_by, &facts),
        })
    }

    /// Totals for every category over a date range
    pub async fn category_wise(&self, query: &ReportQuery) -> AppResult<CategoryWiseReport> {
        let range = query.range()?;
        let categories = self.repository.categories_list().await?;
        let facts = self.repository.reports_booking_facts(range).await?;
        Ok(CategoryWiseReport {
            range,
            categories: category_breakdown(&categories, &facts),
        })
    }

    pub fn calendar(&self, month: i64, year: i64) -> AppResult<CalendarMonth> {
        Ok(calendar_weeks(month, year)?)
    }
}
