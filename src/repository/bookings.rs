//! Bookings domain methods on Repository

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{Postgres, QueryBuilder, Transaction};

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::{
        booking::{
            Booking, BookingDetails, BookingDraft, BookingFilter, BookingItemLine, BookingLine,
            BookingSort,
        },
        category::Category,
        customer::Customer,
        report::DateRange,
        time_slot::TimeSlot,
        user::UserRef,
        PageRequest,
    },
};

const BOOKINGS_FROM: &str =
    "FROM bookings b LEFT JOIN customers c ON c.id = b.customer_id WHERE 1=1";

/// Replace the item lines of a booking inside an open transaction
async fn replace_lines(
    tx: &mut Transaction<'_, Postgres>,
    booking_id: i32,
    lines: &[BookingLine],
) -> AppResult<()> {
    sqlx::query("DELETE FROM booking_items WHERE booking_id = $1")
        .bind(booking_id)
        .execute(&mut **tx)
        .await?;

    if lines.is_empty() {
        return Ok(());
    }

    let mut qb: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO booking_items (booking_id, item_id, price_at_booking) ");
    qb.push_values(lines, |mut row, line| {
        row.push_bind(booking_id)
            .push_bind(line.item_id)
            .push_bind(line.price);
    });
    qb.build().execute(&mut **tx).await?;
    Ok(())
}

impl Repository {
    /// Get the bare booking row
    pub async fn bookings_get_row(&self, id: i32) -> AppResult<Booking> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))
    }

    /// Get a booking with its relations
    pub async fn bookings_get_by_id(&self, id: i32) -> AppResult<BookingDetails> {
        let booking = self.bookings_get_row(id).await?;
        self.bookings_with_relations(vec![booking])
            .await?
            .pop()
            .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))
    }

    /// Whether another booking already uses this invoice number
    pub async fn bookings_invoice_taken(
        &self,
        invoice_number: &str,
        exclude_id: Option<i32>,
    ) -> AppResult<bool> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM bookings
                WHERE invoice_number = $1 AND ($2::INTEGER IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(invoice_number)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    /// Filtered, sorted page of bookings and the total match count
    pub async fn bookings_list(
        &self,
        filter: &BookingFilter,
        sort: BookingSort,
        page: PageRequest,
    ) -> AppResult<(Vec<BookingDetails>, i64)> {
        let mut count_qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT COUNT(*) {}", BOOKINGS_FROM));
        filter.push_conditions(&mut count_qb);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT b.* {}", BOOKINGS_FROM));
        filter.push_conditions(&mut qb);
        qb.push(" ORDER BY ").push(sort.order_by());
        qb.push(" LIMIT ")
            .push_bind(page.per_page)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = qb.build_query_as::<Booking>().fetch_all(&self.pool).await?;

        Ok((self.bookings_with_relations(rows).await?, total))
    }

    /// Every booking matching the filter, newest booking date first
    pub async fn bookings_export(&self, filter: &BookingFilter) -> AppResult<Vec<BookingDetails>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT b.* {}", BOOKINGS_FROM));
        filter.push_conditions(&mut qb);
        qb.push(" ORDER BY ").push(BookingSort::default().order_by());
        let rows = qb.build_query_as::<Booking>().fetch_all(&self.pool).await?;
        self.bookings_with_relations(rows).await
    }

    /// Most recently created bookings
    pub async fn bookings_recent(&self, limit: i64) -> AppResult<Vec<BookingDetails>> {
        let rows = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings ORDER BY created_at DESC, id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        self.bookings_with_relations(rows).await
    }

    /// Bookings dated within the range, oldest first
    pub async fn bookings_in_range(
        &self,
        range: DateRange,
        category_id: Option<i32>,
    ) -> AppResult<Vec<BookingDetails>> {
        let rows = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE booking_date BETWEEN $1 AND $2
              AND ($3::INTEGER IS NULL OR category_id = $3)
            ORDER BY booking_date, time_slot_id, id
            "#,
        )
        .bind(range.date_from)
        .bind(range.date_to)
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        self.bookings_with_relations(rows).await
    }

    /// Insert a booking and its item lines in one transaction
    pub async fn bookings_create(&self, draft: &BookingDraft, user_id: i32) -> AppResult<i32> {
        let f = &draft.fields;
        let mut tx = self.pool.begin().await?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO bookings (
                invoice_number, customer_id, phone_number, notes, accessories,
                payment_status, total_amount, deposit_amount, remaining_balance,
                category_id, booking_date, return_date, time_slot_id, user_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id
            "#,
        )
        .bind(&f.invoice_number)
        .bind(f.customer_id)
        .bind(&f.phone_number)
        .bind(&f.notes)
        .bind(&f.accessories)
        .bind(f.payment_status)
        .bind(f.totals.total_amount)
        .bind(f.totals.deposit_amount)
        .bind(f.totals.remaining_balance)
        .bind(f.category_id)
        .bind(f.booking_date)
        .bind(f.return_date)
        .bind(f.time_slot_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(lines) = &draft.lines {
            replace_lines(&mut tx, id, lines).await?;
        }

        tx.commit().await?;
        Ok(id)
    }

    /// Write the effective booking row and, when given, the new item set
    pub async fn bookings_update(&self, id: i32, draft: &BookingDraft) -> AppResult<()> {
        let f = &draft.fields;
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                invoice_number = $2,
                customer_id = $3,
                phone_number = $4,
                notes = $5,
                accessories = $6,
                payment_status = $7,
                total_amount = $8,
                deposit_amount = $9,
                remaining_balance = $10,
                category_id = $11,
                booking_date = $12,
                return_date = $13,
                time_slot_id = $14,
                updated_at = $15
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&f.invoice_number)
        .bind(f.customer_id)
        .bind(&f.phone_number)
        .bind(&f.notes)
        .bind(&f.accessories)
        .bind(f.payment_status)
        .bind(f.totals.total_amount)
        .bind(f.totals.deposit_amount)
        .bind(f.totals.remaining_balance)
        .bind(f.category_id)
        .bind(f.booking_date)
        .bind(f.return_date)
        .bind(f.time_slot_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Booking {} not found", id)));
        }

        if let Some(lines) = &draft.lines {
            replace_lines(&mut tx, id, lines).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Delete a booking with its item lines
    pub async fn bookings_delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Booking {} not found", id)));
        }
        Ok(())
    }

    /// Load categories, slots, customers, users and item lines for a batch of bookings
    async fn bookings_with_relations(&self, rows: Vec<Booking>) -> AppResult<Vec<BookingDetails>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let booking_ids: Vec<i32> = rows.iter().map(|b| b.id).collect();
        let category_ids: Vec<i32> = rows.iter().map(|b| b.category_id).collect();
        let slot_ids: Vec<i32> = rows.iter().map(|b| b.time_slot_id).collect();
        let customer_ids: Vec<i32> = rows.iter().filter_map(|b| b.customer_id).collect();
        let user_ids: Vec<i32> = rows.iter().filter_map(|b| b.user_id).collect();

        let categories: HashMap<i32, Category> =
            sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ANY($1)")
                .bind(&category_ids)
                .fetch_all(&self.pool)
                .await?
                .into_iter()
                .map(|c| (c.id, c))
                .collect();

        let slots: HashMap<i32, TimeSlot> =
            sqlx::query_as::<_, TimeSlot>("SELECT * FROM time_slots WHERE id = ANY($1)")
                .bind(&slot_ids)
                .fetch_all(&self.pool)
                .await?
                .into_iter()
                .map(|s| (s.id, s))
                .collect();

        let customers: HashMap<i32, Customer> =
            sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ANY($1)")
                .bind(&customer_ids)
                .fetch_all(&self.pool)
                .await?
                .into_iter()
                .map(|c| (c.id, c))
                .collect();

        let users: HashMap<i32, UserRef> =
            sqlx::query_as::<_, UserRef>("SELECT id, name FROM users WHERE id = ANY($1)")
                .bind(&user_ids)
                .fetch_all(&self.pool)
                .await?
                .into_iter()
                .map(|u| (u.id, u))
                .collect();

        let lines = sqlx::query_as::<_, BookingItemLine>(
            r#"
            SELECT bi.booking_id, i.id, i.name, bi.price_at_booking
            FROM booking_items bi
            JOIN items i ON i.id = bi.item_id
            WHERE bi.booking_id = ANY($1)
            ORDER BY bi.booking_id, bi.created_at, bi.item_id
            "#,
        )
        .bind(&booking_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut lines_by_booking: HashMap<i32, Vec<BookingItemLine>> = HashMap::new();
        for line in lines {
            lines_by_booking.entry(line.booking_id).or_default().push(line);
        }

        Ok(rows
            .into_iter()
            .map(|booking| BookingDetails {
                category: categories.get(&booking.category_id).cloned(),
                time_slot: slots.get(&booking.time_slot_id).cloned(),
                customer: booking.customer_id.and_then(|id| customers.get(&id).cloned()),
                user: booking.user_id.and_then(|id| users.get(&id).cloned()),
                items: lines_by_booking.remove(&booking.id).unwrap_or_default(),
                booking,
            })
            .collect())
    }
}
