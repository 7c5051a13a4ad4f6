//! Calendar endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{error::AppResult, models::calendar::CalendarMonth};

use super::AuthenticatedUser;

/// Sunday to Saturday weeks covering a month
#[utoipa::path(
    get,
    path = "/calendar/weeks/{month}/{year}",
    tag = "calendar",
    security(("bearer_auth" = [])),
    params(
        ("month" = i64, Path, description = "Month, 1 to 12"),
        ("year" = i64, Path, description = "Four digit year")
    ),
    responses(
        (status = 200, description = "Weeks of the month", body = CalendarMonth),
        (status = 422, description = "Invalid month or year")
    )
)]
pub async fn get_weeks(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path((month, year)): Path<(i64, i64)>,
) -> AppResult<Json<CalendarMonth>> {
    let weeks = state.services.reports.calendar(month, year)?;
    Ok(Json(weeks))
}
