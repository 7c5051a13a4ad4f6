//! Booking endpoints

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;

use crate::{
    error::AppResult,
    models::booking::{
        export_filename, write_csv, BookingDetails, BookingQuery, CreateBooking, UpdateBooking,
    },
};

use super::{AuthenticatedUser, PaginatedResponse};

/// List bookings with filters, search, sorting and pagination
#[utoipa::path(
    get,
    path = "/bookings",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(BookingQuery),
    responses(
        (status = 200, description = "Page of bookings", body = PaginatedResponse<BookingDetails>),
        (status = 401, description = "Not authenticated"),
        (status = 422, description = "Invalid filter")
    )
)]
pub async fn list_bookings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<BookingQuery>,
) -> AppResult<Json<PaginatedResponse<BookingDetails>>> {
    let (bookings, total, page) = state.services.bookings.list(&query).await?;
    Ok(Json(PaginatedResponse::new(bookings, total, page)))
}

/// Download the filtered bookings as CSV
#[utoipa::path(
    get,
    path = "/bookings/export",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(BookingQuery),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv", body = String),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn export_bookings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<BookingQuery>,
) -> AppResult<impl IntoResponse> {
    let rows = state.services.bookings.export(&query).await?;
    let disposition = format!("attachment; filename=\"{}\"", export_filename(Utc::now()));

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        write_csv(&rows),
    ))
}

/// Get a booking with its relations and item lines
#[utoipa::path(
    get,
    path = "/bookings/{id}",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking", body = BookingDetails),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn get_booking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookingDetails>> {
    let booking = state.services.bookings.get(id).await?;
    Ok(Json(booking))
}

/// Create a booking for one or more items
#[utoipa::path(
    post,
    path = "/bookings",
    tag = "bookings",
    security(("bearer_auth" = [])),
    request_body = CreateBooking,
    responses(
        (status = 201, description = "Booking created", body = BookingDetails),
        (status = 422, description = "Invalid fields, all reported at once")
    )
)]
pub async fn create_booking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateBooking>,
) -> AppResult<(StatusCode, Json<BookingDetails>)> {
    let booking = state.services.bookings.create(claims.context(), &data).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Update a booking; omitted fields are kept
#[utoipa::path(
    put,
    path = "/bookings/{id}",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Booking ID")),
    request_body = UpdateBooking,
    responses(
        (status = 200, description = "Booking updated", body = BookingDetails),
        (status = 404, description = "Booking not found"),
        (status = 422, description = "Invalid fields")
    )
)]
pub async fn update_booking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdateBooking>,
) -> AppResult<Json<BookingDetails>> {
    let booking = state.services.bookings.update(id, &data).await?;
    Ok(Json(booking))
}

#[utoipa::path(
    delete,
    path = "/bookings/{id}",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Booking ID")),
    responses(
        (status = 204, description = "Booking deleted"),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn delete_booking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.bookings.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
