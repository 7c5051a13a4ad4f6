//! Time slots domain methods on Repository

use chrono::Utc;

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::time_slot::{SlotRange, TimeSlot},
};

impl Repository {
    /// List slots ordered by start time; inactive slots only when asked for
    pub async fn time_slots_list(&self, include_inactive: bool) -> AppResult<Vec<TimeSlot>> {
        let rows = sqlx::query_as::<_, TimeSlot>(
            r#"
            SELECT * FROM time_slots
            WHERE $1 OR is_active
            ORDER BY start_time, end_time
            "#,
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Get a time slot by ID
    pub async fn time_slots_get_by_id(&self, id: i32) -> AppResult<TimeSlot> {
        sqlx::query_as::<_, TimeSlot>("SELECT * FROM time_slots WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Time slot {} not found", id)))
    }

    pub async fn time_slots_exists(&self, id: i32) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM time_slots WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Create a time slot
    pub async fn time_slots_create(
        &self,
        range: SlotRange,
        is_active: bool,
    ) -> AppResult<TimeSlot> {
        let row = sqlx::query_as::<_, TimeSlot>(
            r#"
            INSERT INTO time_slots (start_time, end_time, is_active)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .bind(is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Insert every planned slot in one transaction.
    ///
    /// A slot whose exact bounds already exist is returned as skipped; any
    /// other failure rolls the whole batch back.
    pub async fn time_slots_bulk_insert(
        &self,
        ranges: &[SlotRange],
    ) -> AppResult<(Vec<TimeSlot>, Vec<SlotRange>)> {
        let mut tx = self.pool.begin().await?;

        let mut created = Vec::new();
        let mut skipped = Vec::new();
        for range in ranges {
            let row = sqlx::query_as::<_, TimeSlot>(
                r#"
                INSERT INTO time_slots (start_time, end_time, is_active)
                VALUES ($1, $2, TRUE)
                ON CONFLICT (start_time, end_time) DO NOTHING
                RETURNING *
                "#,
            )
            .bind(range.start)
            .bind(range.end)
            .fetch_optional(&mut *tx)
            .await?;

            match row {
                Some(slot) => created.push(slot),
                None => skipped.push(*range),
            }
        }

        tx.commit().await?;
        Ok((created, skipped))
    }

    /// Update a time slot's bounds and/or active flag
    pub async fn time_slots_update(
        &self,
        id: i32,
        range: Option<SlotRange>,
        is_active: Option<bool>,
    ) -> AppResult<TimeSlot> {
        sqlx::query_as::<_, TimeSlot>(
            r#"
            UPDATE time_slots SET
                start_time = COALESCE($2, start_time),
                end_time = COALESCE($3, end_time),
                is_active = COALESCE($4, is_active),
                updated_at = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(range.map(|r| r.start))
        .bind(range.map(|r| r.end))
        .bind(is_active)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Time slot {} not found", id)))
    }

    /// Number of bookings using a slot
    pub async fn time_slots_count_bookings(&self, id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE time_slot_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn time_slots_delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM time_slots WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Time slot {} not found", id)));
        }
        Ok(())
    }
}
