//! Aggregation queries behind the dashboard and reports

use chrono::NaiveDate;

use super::Repository;
use crate::{
    error::AppResult,
    models::report::{BookingFact, CategoryCount, DateRange, MonthTotal, StatusTotal},
};

impl Repository {
    /// Date, category, status and total of every booking in the range
    pub async fn reports_booking_facts(&self, range: DateRange) -> AppResult<Vec<BookingFact>> {
        let rows = sqlx::query_as::<_, BookingFact>(
            r#"
            SELECT booking_date, category_id, payment_status, total_amount
            FROM bookings
            WHERE booking_date BETWEEN $1 AND $2
            "#,
        )
        .bind(range.date_from)
        .bind(range.date_to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Bookings dated within the inclusive range; all bookings when no range is given
    pub async fn reports_count_bookings(
        &self,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> AppResult<i64> {
        let (from, to) = range.unzip();
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM bookings
            WHERE ($1::DATE IS NULL OR booking_date >= $1)
              AND ($2::DATE IS NULL OR booking_date <= $2)
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Booking count and revenue per payment status over all bookings
    pub async fn reports_status_totals(&self) -> AppResult<Vec<StatusTotal>> {
        let rows = sqlx::query_as::<_, StatusTotal>(
            r#"
            SELECT payment_status, COUNT(*) AS bookings, COALESCE(SUM(total_amount), 0) AS revenue
            FROM bookings
            GROUP BY payment_status
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Every category with its number of bookings
    pub async fn reports_category_counts(&self) -> AppResult<Vec<CategoryCount>> {
        let rows = sqlx::query_as::<_, CategoryCount>(
            r#"
            SELECT c.id, c.name_en, c.name_ar, COUNT(b.id) AS count
            FROM categories c
            LEFT JOIN bookings b ON b.category_id = c.id
            GROUP BY c.id, c.name_en, c.name_ar
            ORDER BY c.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Booking count and revenue per calendar month from `from` onwards
    pub async fn reports_month_totals(&self, from: NaiveDate) -> AppResult<Vec<MonthTotal>> {
        let rows = sqlx::query_as::<_, MonthTotal>(
            r#"
            SELECT EXTRACT(YEAR FROM booking_date)::INTEGER AS year,
                   EXTRACT(MONTH FROM booking_date)::INTEGER AS month,
                   COUNT(*) AS bookings,
                   COALESCE(SUM(total_amount), 0) AS revenue
            FROM bookings
            WHERE booking_date >= $1
            GROUP BY 1, 2
            "#,
        )
        .bind(from)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
