//! Date range report endpoints

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::report::{BookingsReport, CategoryWiseReport, ReportQuery, RevenueReport},
};

use super::AuthenticatedUser;

/// Bookings in a date range with a revenue summary
#[utoipa::path(
    get,
    path = "/reports/bookings",
    tag = "reports",
    security(("bearer_auth" = [])),
    params(ReportQuery),
    responses(
        (status = 200, description = "Bookings report", body = BookingsReport),
        (status = 422, description = "Missing or invalid date range")
    )
)]
pub async fn bookings_report(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<BookingsReport>> {
    let report = state.services.reports.bookings(&query).await?;
    Ok(Json(report))
}

/// Revenue grouped by day, week or month
#[utoipa::path(
    get,
    path = "/reports/revenue",
    tag = "reports",
    security(("bearer_auth" = [])),
    params(ReportQuery),
    responses(
        (status = 200, description = "Revenue report", body = RevenueReport),
        (status = 422, description = "Missing or invalid date range")
    )
)]
pub async fn revenue_report(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<RevenueReport>> {
    let report = state.services.reports.revenue(&query).await?;
    Ok(Json(report))
}

/// Totals per category
#[utoipa::path(
    get,
    path = "/reports/category-wise",
    tag = "reports",
    security(("bearer_auth" = [])),
    params(ReportQuery),
    responses(
        (status = 200, description = "Category-wise report", body = CategoryWiseReport),
        (status = 422, description = "Missing or invalid date range")
    )
)]
pub async fn category_wise_report(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<CategoryWiseReport>> {
    let report = state.services.reports.category_wise(&query).await?;
    Ok(Json(report))
}
