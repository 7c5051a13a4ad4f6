//! Dashboard endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Local;

use crate::{
    error::AppResult,
    models::{
        booking::BookingDetails,
        report::{DashboardStats, RecentQuery},
    },
};

use super::AuthenticatedUser;

/// Booking counts, revenue totals and the six month trend
#[utoipa::path(
    get,
    path = "/dashboard/stats",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStats),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<DashboardStats>> {
    let today = Local::now().date_naive();
    let stats = state.services.reports.dashboard(today).await?;
    Ok(Json(stats))
}

/// Latest bookings by creation time
#[utoipa::path(
    get,
    path = "/dashboard/recent-bookings",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    params(RecentQuery),
    responses(
        (status = 200, description = "Recent bookings", body = Vec<BookingDetails>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn recent_bookings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<RecentQuery>,
) -> AppResult<Json<Vec<BookingDetails>>> {
    let bookings = state.services.reports.recent(query.limit()).await?;
    Ok(Json(bookings))
}
