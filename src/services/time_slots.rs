//! Time slot registry service

use crate::{
    error::{AppError, AppResult},
    models::time_slot::{
        plan_slots, BulkCreateReport, BulkCreateTimeSlots, CreateTimeSlot, SkippedSlot, SlotRange,
        TimeSlot, UpdateTimeSlot,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct TimeSlotsService {
    repository: Repository,
}

impl TimeSlotsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, include_inactive: bool) -> AppResult<Vec<TimeSlot>> {
        self.repository.time_slots_list(include_inactive).await
    }

    pub async fn get(&self, id: i32) -> AppResult<TimeSlot> {
        self.repository.time_slots_get_by_id(id).await
    }

    /// Fail with a conflict when `range` intersects any slot other than `exclude_id`
    async fn ensure_no_overlap(&self, range: SlotRange, exclude_id: Option<i32>) -> AppResult<()> {
        let slots = self.repository.time_slots_list(true).await?;
        if let Some(existing) = slots
            .iter()
            .filter(|slot| Some(slot.id) != exclude_id)
            .find(|slot| slot.range().overlaps(&range))
        {
            return Err(AppError::Conflict(format!(
                "Time slot {} overlaps existing slot {}",
                range.label(),
                existing.label()
            )));
        }
        Ok(())
    }

    pub async fn create(&self, data: &CreateTimeSlot) -> AppResult<TimeSlot> {
        let range = data.validate_range()?;
        self.ensure_no_overlap(range, None).await?;
        let slot = self
            .repository
            .time_slots_create(range, data.is_active.unwrap_or(true))
            .await?;
        tracing::info!("Time slot created: id={} {}", slot.id, slot.label());
        Ok(slot)
    }

    pub async fn update(&self, id: i32, data: &UpdateTimeSlot) -> AppResult<TimeSlot> {
        let current = self.repository.time_slots_get_by_id(id).await?;
        let range = data.resolve(&current)?;
        if let Some(range) = range {
            self.ensure_no_overlap(range, Some(id)).await?;
        }
        self.repository.time_slots_update(id, range, data.is_active).await
    }

    /// Delete a slot unless bookings use it
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.time_slots_get_by_id(id).await?;
        let bookings = self.repository.time_slots_count_bookings(id).await?;
        if bookings > 0 {
            return Err(AppError::Conflict(format!(
                "Cannot delete time slot with existing bookings ({})",
                bookings
            )));
        }
        self.repository.time_slots_delete(id).await
    }

    /// Generate consecutive slots, skipping those that already exist exactly
    pub async fn bulk_create(&self, data: &BulkCreateTimeSlots) -> AppResult<BulkCreateReport> {
        let (start_hour, end_hour, interval) = data.params()?;

        let planned = plan_slots(start_hour, end_hour, interval);
        let (created, skipped) = self.repository.time_slots_bulk_insert(&planned).await?;
        let skipped = skipped
            .into_iter()
            .map(|range| SkippedSlot {
                start_time: range.start,
                end_time: range.end,
            })
            .collect();

        let report = BulkCreateReport::new(created, skipped);
        tracing::info!("Bulk time slot generation: {}", report.message);
        Ok(report)
    }
}
