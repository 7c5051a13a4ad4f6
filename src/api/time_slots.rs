//! Time slot endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::time_slot::{
        BulkCreateReport, BulkCreateTimeSlots, CreateTimeSlot, TimeSlot, TimeSlotQuery,
        UpdateTimeSlot,
    },
};

use super::AuthenticatedUser;

/// List time slots ordered by start time
#[utoipa::path(
    get,
    path = "/time-slots",
    tag = "time-slots",
    security(("bearer_auth" = [])),
    params(TimeSlotQuery),
    responses(
        (status = 200, description = "Time slots", body = Vec<TimeSlot>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_time_slots(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<TimeSlotQuery>,
) -> AppResult<Json<Vec<TimeSlot>>> {
    let slots = state
        .services
        .time_slots
        .list(query.include_inactive.unwrap_or(false))
        .await?;
    Ok(Json(slots))
}

/// Get a time slot by ID
#[utoipa::path(
    get,
    path = "/time-slots/{id}",
    tag = "time-slots",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Time slot ID")),
    responses(
        (status = 200, description = "Time slot", body = TimeSlot),
        (status = 404, description = "Time slot not found")
    )
)]
pub async fn get_time_slot(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<TimeSlot>> {
    let slot = state.services.time_slots.get(id).await?;
    Ok(Json(slot))
}

/// Create a time slot (admin only)
#[utoipa::path(
    post,
    path = "/time-slots",
    tag = "time-slots",
    security(("bearer_auth" = [])),
    request_body = CreateTimeSlot,
    responses(
        (status = 201, description = "Time slot created", body = TimeSlot),
        (status = 403, description = "Administrator privileges required"),
        (status = 409, description = "Overlaps an existing slot"),
        (status = 422, description = "Invalid times")
    )
)]
pub async fn create_time_slot(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateTimeSlot>,
) -> AppResult<(StatusCode, Json<TimeSlot>)> {
    claims.require_admin()?;

    let slot = state.services.time_slots.create(&data).await?;
    Ok((StatusCode::CREATED, Json(slot)))
}

/// Generate consecutive time slots (admin only)
#[utoipa::path(
    post,
    path = "/time-slots/bulk",
    tag = "time-slots",
    security(("bearer_auth" = [])),
    request_body = BulkCreateTimeSlots,
    responses(
        (status = 201, description = "Slots generated", body = BulkCreateReport),
        (status = 403, description = "Administrator privileges required"),
        (status = 422, description = "Invalid parameters")
    )
)]
pub async fn bulk_create_time_slots(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<BulkCreateTimeSlots>,
) -> AppResult<(StatusCode, Json<BulkCreateReport>)> {
    claims.require_admin()?;

    let report = state.services.time_slots.bulk_create(&data).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// Update a time slot (admin only)
#[utoipa::path(
    put,
    path = "/time-slots/{id}",
    tag = "time-slots",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Time slot ID")),
    request_body = UpdateTimeSlot,
    responses(
        (status = 200, description = "Time slot updated", body = TimeSlot),
        (status = 404, description = "Time slot not found"),
        (status = 409, description = "Overlaps an existing slot")
    )
)]
pub async fn update_time_slot(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdateTimeSlot>,
) -> AppResult<Json<TimeSlot>> {
    claims.require_admin()?;

    let slot = state.services.time_slots.update(id, &data).await?;
    Ok(Json(slot))
}

/// Delete a time slot (admin only)
#[utoipa::path(
    delete,
    path = "/time-slots/{id}",
    tag = "time-slots",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Time slot ID")),
    responses(
        (status = 204, description = "Time slot deleted"),
        (status = 404, description = "Time slot not found"),
        (status = 409, description = "Time slot has bookings")
    )
)]
pub async fn delete_time_slot(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;

    state.services.time_slots.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
