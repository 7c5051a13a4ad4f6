//! Router tests for endpoints that answer without touching the database

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use attire_booking_server::{
    api,
    models::user::{Role, User, UserClaims},
    repository::Repository,
    services::Services,
    AppConfig, AppState,
};

fn app() -> (Router, AppConfig) {
    let config = AppConfig::default();
    // Never connects unless a handler reaches the database
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .unwrap();
    let services = Services::new(Repository::new(pool), config.auth.clone());
    let state = AppState {
        config: Arc::new(config.clone()),
        services: Arc::new(services),
    };
    (api::create_router(state), config)
}

fn token(config: &AppConfig, role: Role) -> String {
    let user = User {
        id: 7,
        name: "Test Staff".to_string(),
        username: Some("staff".to_string()),
        email: "staff@example.com".to_string(),
        password: String::new(),
        role,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    UserClaims::new(&user, 1)
        .create_token(&config.auth.jwt_secret)
        .unwrap()
}

async fn send(
    app: Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<&str>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _) = app();
    let (status, body) = send(app, "GET", "/api/v1/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let (app, _) = app();
    let (status, body) = send(app, "GET", "/api/v1/bookings", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "NotAuthenticated");
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let (app, _) = app();
    let (status, _) = send(app, "GET", "/api/v1/categories", Some("not-a-jwt"), None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let (app, mut config) = app();
    config.auth.jwt_secret = "some-other-secret".to_string();
    let forged = token(&config, Role::Admin);

    let (status, _) = send(app, "GET", "/api/v1/categories", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_calendar_weeks() {
    let (app, config) = app();
    let token = token(&config, Role::User);

    let uri = "/api/v1/calendar/weeks/2/2025";
    let (status, body) = send(app, "GET", uri, Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["month_name"], "February");
    let weeks = body["weeks"].as_array().unwrap();
    assert_eq!(weeks.len(), 5);
    assert_eq!(weeks[0]["start_date"], "2025-01-26");
    assert_eq!(weeks[0]["start_date_formatted"], "Jan 26");
    assert_eq!(weeks[4]["end_date"], "2025-03-01");
}

#[tokio::test]
async fn test_calendar_rejects_invalid_month() {
    let (app, config) = app();
    let token = token(&config, Role::User);

    let uri = "/api/v1/calendar/weeks/13/2025";
    let (status, body) = send(app, "GET", uri, Some(&token), None).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["month"].is_array());
}

#[tokio::test]
async fn test_category_writes_require_admin() {
    let (app, config) = app();
    let token = token(&config, Role::Manager);

    let (status, body) = send(
        app,
        "POST",
        "/api/v1/categories",
        Some(&token),
        Some(r#"{"name_en": "Kaftans", "name_ar": "قفاطين"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "NotAuthorized");
}

#[tokio::test]
async fn test_user_management_requires_admin() {
    let (app, config) = app();
    let token = token(&config, Role::User);

    let (status, _) = send(app, "DELETE", "/api/v1/users/3", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_cannot_delete_own_account() {
    let (app, config) = app();
    let token = token(&config, Role::Admin);

    // The acting admin has id 7
    let (status, body) = send(app, "DELETE", "/api/v1/users/7", Some(&token), None).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "NotAuthorized");
}

#[tokio::test]
async fn test_booking_list_rejects_invalid_month() {
    let (app, config) = app();
    let token = token(&config, Role::User);

    let uri = "/api/v1/bookings?month=13&year=2025";
    let (status, body) = send(app, "GET", uri, Some(&token), None).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["month"].is_array());
}

#[tokio::test]
async fn test_reports_require_date_range() {
    let (app, config) = app();
    let token = token(&config, Role::User);

    let (status, body) = send(
        app,
        "GET",
        "/api/v1/reports/revenue?date_from=2025-03-10&date_to=2025-03-01",
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["date_to"].is_array());
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let (app, _) = app();
    let (status, body) = send(app, "GET", "/api-docs/openapi.json", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/bookings"].is_object());
    assert!(body["components"]["securitySchemes"]["bearer_auth"].is_object());
}
