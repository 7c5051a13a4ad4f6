//! Time slot models and the slot overlap / generation rules

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::FieldErrors;

/// A bookable time-of-day window
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TimeSlot {
    pub id: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TimeSlot {
    pub fn range(&self) -> SlotRange {
        SlotRange {
            start: self.start_time,
            end: self.end_time,
        }
    }

    /// Display form used in exports ("09:00-10:00")
    pub fn label(&self) -> String {
        self.range().label()
    }
}

/// Half-open interval `[start, end)` within a day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl SlotRange {
    /// Returns `None` unless `end` is strictly after `start`
    pub fn new(start: NaiveTime, end: NaiveTime) -> Option<Self> {
        (end > start).then_some(Self { start, end })
    }

    /// Two slots overlap when they share any instant. Back-to-back slots
    /// (one ends exactly when the other starts) do not overlap.
    pub fn overlaps(&self, other: &SlotRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn label(&self) -> String {
        format!("{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// Parse `HH:MM` or `HH:MM:SS`
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

fn parse_time_field(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
) -> Option<NaiveTime> {
    match value {
        None => {
            errors.add(field, format!("The {} field is required", field));
            None
        }
        Some(raw) => {
            let parsed = parse_time(raw);
            if parsed.is_none() {
                errors.add(field, format!("The {} must be a time in HH:MM format", field));
            }
            parsed
        }
    }
}

/// Create time slot request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTimeSlot {
    /// Start time (HH:MM)
    pub start_time: Option<String>,
    /// End time (HH:MM), must be after start_time
    pub end_time: Option<String>,
    /// Defaults to true
    pub is_active: Option<bool>,
}

impl CreateTimeSlot {
    pub fn validate_range(&self) -> Result<SlotRange, FieldErrors> {
        let mut errors = FieldErrors::new();
        let start = parse_time_field(&mut errors, "start_time", self.start_time.as_deref());
        let end = parse_time_field(&mut errors, "end_time", self.end_time.as_deref());

        match (start, end) {
            (Some(start), Some(end)) => SlotRange::new(start, end).ok_or_else(|| {
                errors.add("end_time", "The end time must be after the start time");
                errors
            }),
            _ => Err(errors),
        }
    }
}

/// Update time slot request
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateTimeSlot {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateTimeSlot {
    /// Effective range after applying this update to `current`.
    ///
    /// `Ok(None)` means neither bound was supplied and no overlap check is needed.
    pub fn resolve(&self, current: &TimeSlot) -> Result<Option<SlotRange>, FieldErrors> {
        if self.start_time.is_none() && self.end_time.is_none() {
            return Ok(None);
        }

        let mut errors = FieldErrors::new();
        let start = match self.start_time.as_deref() {
            Some(raw) => parse_time_field(&mut errors, "start_time", Some(raw)),
            None => Some(current.start_time),
        };
        let end = match self.end_time.as_deref() {
            Some(raw) => parse_time_field(&mut errors, "end_time", Some(raw)),
            None => Some(current.end_time),
        };

        match (start, end) {
            (Some(start), Some(end)) => match SlotRange::new(start, end) {
                Some(range) => Ok(Some(range)),
                None => {
                    errors.add("end_time", "The end time must be after the start time");
                    Err(errors)
                }
            },
            _ => Err(errors),
        }
    }
}

/// Query parameters for listing time slots
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct TimeSlotQuery {
    /// Include inactive slots (default false)
    pub include_inactive: Option<bool>,
}

/// Bulk generation request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BulkCreateTimeSlots {
    #[validate(
        required(message = "The start hour field is required"),
        range(min = 0, max = 23, message = "The start hour must be between 0 and 23")
    )]
    pub start_hour: Option<u32>,
    #[validate(
        required(message = "The end hour field is required"),
        range(min = 0, max = 23, message = "The end hour must be between 0 and 23")
    )]
    pub end_hour: Option<u32>,
    /// Slot length in minutes
    #[validate(
        required(message = "The interval field is required"),
        range(min = 1, max = 240, message = "The interval must be between 1 and 240 minutes")
    )]
    pub interval: Option<u32>,
}

impl BulkCreateTimeSlots {
    /// Validated `(start_hour, end_hour, interval)`
    pub fn params(&self) -> Result<(u32, u32, u32), FieldErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };

        if let (Some(start), Some(end)) = (self.start_hour, self.end_hour) {
            if end <= start && !errors.contains("end_hour") {
                errors.add("end_hour", "The end hour must be greater than the start hour");
            }
        }

        match (self.start_hour, self.end_hour, self.interval) {
            (Some(start), Some(end), Some(interval)) if errors.is_empty() => {
                Ok((start, end, interval))
            }
            _ => Err(errors),
        }
    }
}

fn minutes_to_time(minutes: u32) -> Option<NaiveTime> {
    NaiveTime::from_num_seconds_from_midnight_opt(minutes * 60, 0)
}

/// Consecutive slots of `interval_minutes` starting at `start_hour:00`.
///
/// Generation stops before the first slot that would end after `end_hour:00`.
pub fn plan_slots(start_hour: u32, end_hour: u32, interval_minutes: u32) -> Vec<SlotRange> {
    let mut slots = Vec::new();
    if interval_minutes == 0 {
        return slots;
    }

    let limit = end_hour * 60;
    let mut start = start_hour * 60;
    while start + interval_minutes <= limit {
        let end = start + interval_minutes;
        let (Some(start_time), Some(end_time)) = (minutes_to_time(start), minutes_to_time(end))
        else {
            break;
        };
        slots.push(SlotRange {
            start: start_time,
            end: end_time,
        });
        start = end;
    }
    slots
}

/// A generated slot that already existed
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SkippedSlot {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Result of a bulk generation
#[derive(Debug, Serialize, ToSchema)]
pub struct BulkCreateReport {
    pub created: Vec<TimeSlot>,
    pub skipped: Vec<SkippedSlot>,
    pub created_count: usize,
    pub skipped_count: usize,
    pub message: String,
}

impl BulkCreateReport {
    pub fn new(created: Vec<TimeSlot>, skipped: Vec<SkippedSlot>) -> Self {
        let message = format!(
            "{} time slots created, {} skipped",
            created.len(),
            skipped.len()
        );
        Self {
            created_count: created.len(),
            skipped_count: skipped.len(),
            created,
            skipped,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(value: &str) -> NaiveTime {
        parse_time(value).expect("valid time")
    }

    fn range(start: &str, end: &str) -> SlotRange {
        SlotRange::new(t(start), t(end)).expect("valid range")
    }

    #[test]
    fn identical_and_nested_slots_overlap() {
        let base = range("09:00", "10:00");
        assert!(base.overlaps(&range("09:00", "10:00")));
        assert!(base.overlaps(&range("09:15", "09:45")));
        assert!(base.overlaps(&range("08:00", "11:00")));
        assert!(base.overlaps(&range("09:30", "10:30")));
        assert!(base.overlaps(&range("08:30", "09:30")));
    }

    #[test]
    fn back_to_back_slots_do_not_overlap() {
        let base = range("09:00", "10:00");
        assert!(!base.overlaps(&range("10:00", "11:00")));
        assert!(!base.overlaps(&range("08:00", "09:00")));
        assert!(!base.overlaps(&range("13:00", "14:00")));
    }

    #[test]
    fn range_requires_end_after_start() {
        assert!(SlotRange::new(t("10:00"), t("10:00")).is_none());
        assert!(SlotRange::new(t("11:00"), t("10:00")).is_none());
    }

    #[test]
    fn parses_both_time_formats() {
        assert_eq!(t("09:30"), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(t("09:30:15"), NaiveTime::from_hms_opt(9, 30, 15).unwrap());
        assert!(parse_time("9h30").is_none());
    }

    #[test]
    fn create_request_reports_every_problem() {
        let request = CreateTimeSlot {
            start_time: None,
            end_time: Some("later".to_string()),
            is_active: None,
        };
        let errors = request.validate_range().unwrap_err();
        assert!(errors.contains("start_time"));
        assert!(errors.contains("end_time"));

        let reversed = CreateTimeSlot {
            start_time: Some("11:00".to_string()),
            end_time: Some("10:00".to_string()),
            is_active: None,
        };
        assert!(reversed.validate_range().unwrap_err().contains("end_time"));
    }

    #[test]
    fn update_resolves_against_current_bounds() {
        let current = TimeSlot {
            id: 1,
            start_time: t("09:00"),
            end_time: t("10:00"),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(UpdateTimeSlot::default().resolve(&current), Ok(None));

        let later_end = UpdateTimeSlot {
            end_time: Some("10:30".to_string()),
            ..Default::default()
        };
        assert_eq!(later_end.resolve(&current), Ok(Some(range("09:00", "10:30"))));

        let start_past_end = UpdateTimeSlot {
            start_time: Some("10:00".to_string()),
            ..Default::default()
        };
        assert!(start_past_end.resolve(&current).is_err());
    }

    #[test]
    fn plans_hourly_slots() {
        let labels: Vec<String> = plan_slots(9, 12, 60).iter().map(SlotRange::label).collect();
        assert_eq!(labels, vec!["09:00-10:00", "10:00-11:00", "11:00-12:00"]);
    }

    #[test]
    fn plans_uneven_intervals_without_passing_end_hour() {
        let labels: Vec<String> = plan_slots(9, 12, 90).iter().map(SlotRange::label).collect();
        assert_eq!(labels, vec!["09:00-10:30", "10:30-12:00"]);

        let labels: Vec<String> = plan_slots(9, 10, 45).iter().map(SlotRange::label).collect();
        assert_eq!(labels, vec!["09:00-09:45"]);
    }

    #[test]
    fn planned_slots_never_overlap_each_other() {
        let slots = plan_slots(0, 23, 37);
        for (i, a) in slots.iter().enumerate() {
            for b in slots.iter().skip(i + 1) {
                assert!(!a.overlaps(b), "{} overlaps {}", a.label(), b.label());
            }
        }
    }

    #[test]
    fn bulk_request_rejects_inverted_hours() {
        let request = BulkCreateTimeSlots {
            start_hour: Some(17),
            end_hour: Some(9),
            interval: Some(60),
        };
        assert!(request.params().unwrap_err().contains("end_hour"));

        let missing = BulkCreateTimeSlots {
            start_hour: None,
            end_hour: Some(9),
            interval: Some(500),
        };
        let errors = missing.params().unwrap_err();
        assert!(errors.contains("start_hour"));
        assert!(errors.contains("interval"));

        let ok = BulkCreateTimeSlots {
            start_hour: Some(9),
            end_hour: Some(17),
            interval: Some(30),
        };
        assert_eq!(ok.params(), Ok((9, 17, 30)));
    }
}
