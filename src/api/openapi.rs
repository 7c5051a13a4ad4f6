//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{
    auth, bookings, calendar, categories, customers, dashboard, health, items, reports, time_slots,
    users,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attire Booking API",
        version = "1.0.0",
        description = "Attire rental booking management REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    modifiers(&BearerAuth),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        // Categories
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        // Items
        items::list_items,
        items::get_item,
        items::create_item,
        items::update_item,
        items::delete_item,
        // Time slots
        time_slots::list_time_slots,
        time_slots::get_time_slot,
        time_slots::create_time_slot,
        time_slots::bulk_create_time_slots,
        time_slots::update_time_slot,
        time_slots::delete_time_slot,
        // Customers
        customers::list_customers,
        customers::get_customer,
        customers::create_customer,
        customers::update_customer,
        customers::delete_customer,
        // Bookings
        bookings::list_bookings,
        bookings::export_bookings,
        bookings::get_booking,
        bookings::create_booking,
        bookings::update_booking,
        bookings::delete_booking,
        // Users
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        // Dashboard
        dashboard::get_stats,
        dashboard::recent_bookings,
        // Reports
        reports::bookings_report,
        reports::revenue_report,
        reports::category_wise_report,
        // Calendar
        calendar::get_weeks,
    ),
    components(
        schemas(
            // Auth
            crate::models::user::LoginRequest,
            crate::models::user::LoginResponse,
            // Catalog
            crate::models::category::Category,
            crate::models::category::CreateCategory,
            crate::models::category::UpdateCategory,
            crate::models::item::Item,
            crate::models::item::CreateItem,
            crate::models::item::UpdateItem,
            // Time slots
            crate::models::time_slot::TimeSlot,
            crate::models::time_slot::CreateTimeSlot,
            crate::models::time_slot::UpdateTimeSlot,
            crate::models::time_slot::BulkCreateTimeSlots,
            crate::models::time_slot::BulkCreateReport,
            crate::models::time_slot::SkippedSlot,
            // Customers
            crate::models::customer::Customer,
            crate::models::customer::CreateCustomer,
            crate::models::customer::UpdateCustomer,
            // Bookings
            crate::models::booking::Booking,
            crate::models::booking::BookingDetails,
            crate::models::booking::BookingItemLine,
            crate::models::booking::BookingLineInput,
            crate::models::booking::CreateBooking,
            crate::models::booking::UpdateBooking,
            crate::models::booking::PaymentStatus,
            // Users
            crate::models::user::User,
            crate::models::user::UserRef,
            crate::models::user::Role,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            // Dashboard and reports
            crate::models::report::DashboardStats,
            crate::models::report::BookingCounts,
            crate::models::report::RevenueTotals,
            crate::models::report::StatusCounts,
            crate::models::report::CategoryCount,
            crate::models::report::MonthlyTrend,
            crate::models::report::GroupBy,
            crate::models::report::DateRange,
            crate::models::report::RevenueSummary,
            crate::models::report::RevenueBucket,
            crate::models::report::CategoryReportRow,
            crate::models::report::BookingsReport,
            crate::models::report::RevenueReport,
            crate::models::report::CategoryWiseReport,
            // Calendar
            crate::models::calendar::CalendarMonth,
            crate::models::calendar::CalendarWeek,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "categories", description = "Attire categories"),
        (name = "items", description = "Rental items"),
        (name = "time-slots", description = "Bookable time slots"),
        (name = "customers", description = "Customer records"),
        (name = "bookings", description = "Booking management"),
        (name = "users", description = "Staff user management"),
        (name = "dashboard", description = "Dashboard statistics"),
        (name = "reports", description = "Date range reports"),
        (name = "calendar", description = "Calendar helpers")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
