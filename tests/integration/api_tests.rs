//! API integration tests against a running server with a migrated database

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Log in with the bootstrap admin from config/default.toml
async fn get_auth_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "login": "admin",
            "password": "password"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

async fn get_json(client: &Client, token: &str, path: &str) -> Value {
    let response = client
        .get(format!("{}{}", BASE_URL, path))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success(), "GET {} failed: {}", path, response.status());
    response.json().await.expect("Failed to parse response")
}

async fn create_json(client: &Client, token: &str, path: &str, body: Value) -> Value {
    let response = client
        .post(format!("{}{}", BASE_URL, path))
        .header("Authorization", format!("Bearer {}", token))
        .json(&body)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201, "POST {} failed", path);
    response.json().await.expect("Failed to parse response")
}

async fn delete(client: &Client, token: &str, path: &str) -> u16 {
    client
        .delete(format!("{}{}", BASE_URL, path))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request")
        .status()
        .as_u16()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "login": "admin@booking.com",
            "password": "password"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["role"], "admin");
    assert!(body["user"]["password"].is_null());
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "login": "admin",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_get_current_user() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let body = get_json(&client, &token, "/auth/me").await;
    assert_eq!(body["username"], "admin");
}

#[tokio::test]
#[ignore]
async fn test_category_slug_suffixing() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let name = unique("Evening Gown");

    let body = json!({"name_en": name, "name_ar": "فستان"});

    let first = create_json(&client, &token, "/categories", body.clone()).await;
    let second = create_json(&client, &token, "/categories", body).await;

    let slug = first["slug"].as_str().unwrap();
    assert_eq!(second["slug"], format!("{}-1", slug));

    assert_eq!(delete(&client, &token, &format!("/categories/{}", first["id"])).await, 204);
    assert_eq!(delete(&client, &token, &format!("/categories/{}", second["id"])).await, 204);
}

#[tokio::test]
#[ignore]
async fn test_time_slot_overlap_and_adjacency() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    // Seeded hourly slots cover 09:00-18:00, so 22:00 onwards is free
    let slot = json!({"start_time": "22:00", "end_time": "22:30"});
    let slot = create_json(&client, &token, "/time-slots", slot).await;

    let overlapping = client
        .post(format!("{}/time-slots", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({"start_time": "22:15", "end_time": "22:45"}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(overlapping.status(), 409);

    let adjacent = json!({"start_time": "22:30", "end_time": "23:00"});
    let adjacent = create_json(&client, &token, "/time-slots", adjacent).await;

    assert_eq!(delete(&client, &token, &format!("/time-slots/{}", slot["id"])).await, 204);
    assert_eq!(delete(&client, &token, &format!("/time-slots/{}", adjacent["id"])).await, 204);
}

#[tokio::test]
#[ignore]
async fn test_booking_totals_end_to_end() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let categories = get_json(&client, &token, "/categories").await;
    let category_id = categories[0]["id"].as_i64().expect("No seeded category");
    let slots = get_json(&client, &token, "/time-slots").await;
    let time_slot_id = slots[0]["id"].as_i64().expect("No seeded time slot");

    let a = json!({"name": unique("Dress A"), "price": "100.00", "category_id": category_id});
    let a = create_json(&client, &token, "/items", a).await;
    let b = json!({"name": unique("Dress B"), "price": "50.00", "category_id": category_id});
    let b = create_json(&client, &token, "/items", b).await;

    let invoice = unique("INV");
    let booking = create_json(
        &client,
        &token,
        "/bookings",
        json!({
            "invoice_number": invoice,
            "phone_number": "0500000000",
            "payment_status": "partial",
            "deposit_amount": "30",
            "category_id": category_id,
            "booking_date": "2025-01-15",
            "time_slot_id": time_slot_id,
            "items": [
                {"id": a["id"], "price": "100"},
                {"id": b["id"], "price": "50"}
            ]
        }),
    )
    .await;

    assert_eq!(booking["total_amount"], "150.00");
    assert_eq!(booking["remaining_balance"], "120.00");
    assert_eq!(booking["items"].as_array().unwrap().len(), 2);
    assert_eq!(booking["user"]["name"], "Admin User");

    let booking_id = booking["id"].as_i64().unwrap();

    // Changing the catalog price leaves the booking snapshot untouched
    let response = client
        .put(format!("{}/items/{}", BASE_URL, a["id"]))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({"price": "999"}))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .put(format!("{}/bookings/{}", BASE_URL, booking_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({"deposit_amount": "50"}))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let updated: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(updated["total_amount"], "150.00");
    assert_eq!(updated["remaining_balance"], "100.00");

    // Duplicate invoice numbers are rejected
    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "invoice_number": invoice,
            "phone_number": "0500000000",
            "payment_status": "paid",
            "category_id": category_id,
            "booking_date": "2025-01-16",
            "time_slot_id": time_slot_id,
            "items": [{"id": b["id"], "price": "50"}]
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["errors"]["invoice_number"].is_array());

    let listed = get_json(&client, &token, &format!("/bookings?search={}", invoice)).await;
    assert_eq!(listed["total"], 1);

    assert_eq!(delete(&client, &token, &format!("/bookings/{}", booking_id)).await, 204);
    assert_eq!(delete(&client, &token, &format!("/items/{}", a["id"])).await, 204);
    assert_eq!(delete(&client, &token, &format!("/items/{}", b["id"])).await, 204);
}

#[tokio::test]
#[ignore]
async fn test_booking_validation_reports_all_errors() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "payment_status": "unknown",
            "deposit_amount": "-5",
            "items": [{"id": 999999, "price": "-1"}]
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.expect("Failed to parse response");
    let errors = &body["errors"];
    assert!(errors["invoice_number"].is_array());
    assert!(errors["payment_status"].is_array());
    assert!(errors["deposit_amount"].is_array());
    assert!(errors["items.0.id"].is_array());
    assert!(errors["items.0.price"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_export_bookings_csv() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/bookings/export", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let disposition = response.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.contains("bookings_"));
    let body = response.text().await.expect("Failed to read body");
    assert!(body.starts_with("Invoice Number,"));
}

#[tokio::test]
#[ignore]
async fn test_dashboard_stats() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let body = get_json(&client, &token, "/dashboard/stats").await;
    assert!(body["bookings"]["total"].is_number());
    assert_eq!(body["monthly_trends"].as_array().unwrap().len(), 6);
}

#[tokio::test]
#[ignore]
async fn test_revenue_report_daily_buckets() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let path = "/reports/revenue?date_from=2025-01-01&date_to=2025-01-05&group_by=day";
    let body = get_json(&client, &token, path).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
}

#[tokio::test]
#[ignore]
async fn test_create_and_delete_user() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let username = unique("staff");

    let user = create_json(
        &client,
        &token,
        "/users",
        json!({
            "name": "Test Staff",
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "secret123",
            "role": "manager"
        }),
    )
    .await;
    assert_eq!(user["role"], "manager");

    assert_eq!(delete(&client, &token, &format!("/users/{}", user["id"])).await, 204);
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/bookings", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_delete_guards_while_booked() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let category = create_json(
        &client,
        &token,
        "/categories",
        json!({"name_en": unique("Bridal"), "name_ar": "عروس"}),
    )
    .await;
    let slot = create_json(
        &client,
        &token,
        "/time-slots",
        json!({"start_time": "23:15", "end_time": "23:45"}),
    )
    .await;
    let item = create_json(
        &client,
        &token,
        "/items",
        json!({"name": unique("Veil"), "price": "20", "category_id": category["id"]}),
    )
    .await;

    let booking = create_json(
        &client,
        &token,
        "/bookings",
        json!({
            "invoice_number": unique("INV"),
            "phone_number": "0500000001",
            "payment_status": "pending",
            "deposit_amount": "0",
            "category_id": category["id"],
            "booking_date": "2025-02-03",
            "time_slot_id": slot["id"],
            "items": [{"id": item["id"], "price": "20"}]
        }),
    )
    .await;

    let category_path = format!("/categories/{}", category["id"]);
    let slot_path = format!("/time-slots/{}", slot["id"]);
    let item_path = format!("/items/{}", item["id"]);

    assert_eq!(delete(&client, &token, &category_path).await, 409);
    assert_eq!(delete(&client, &token, &slot_path).await, 409);
    assert_eq!(delete(&client, &token, &item_path).await, 409);

    // The booking keeps its lines and total
    let stored = get_json(&client, &token, &format!("/bookings/{}", booking["id"])).await;
    assert_eq!(stored["total_amount"], "20.00");
    assert_eq!(stored["items"].as_array().map(Vec::len), Some(1));

    assert_eq!(delete(&client, &token, &format!("/bookings/{}", booking["id"])).await, 204);
    assert_eq!(delete(&client, &token, &item_path).await, 204);
    assert_eq!(delete(&client, &token, &slot_path).await, 204);
    assert_eq!(delete(&client, &token, &category_path).await, 204);
}

#[tokio::test]
#[ignore]
async fn test_bulk_time_slots_skip_existing() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    // Seeded hourly slots already cover 09:00-12:00
    let report = create_json(
        &client,
        &token,
        "/time-slots/bulk",
        json!({"start_hour": 9, "end_hour": 12, "interval": 60}),
    )
    .await;
    assert_eq!(report["created_count"], 0);
    assert_eq!(report["skipped_count"], 3);
    assert_eq!(report["skipped"][0]["start_time"], "09:00:00");
}

#[tokio::test]
#[ignore]
async fn test_booking_amounts_beyond_column_range() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let categories = get_json(&client, &token, "/categories").await;
    let category_id = categories[0]["id"].as_i64().expect("No seeded category");
    let slots = get_json(&client, &token, "/time-slots").await;
    let time_slot_id = slots[0]["id"].as_i64().expect("No seeded time slot");
    let item = create_json(
        &client,
        &token,
        "/items",
        json!({"name": unique("Cape"), "price": "10", "category_id": category_id}),
    )
    .await;

    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "invoice_number": unique("INV"),
            "phone_number": "0500000002",
            "payment_status": "pending",
            "deposit_amount": "100000000",
            "category_id": category_id,
            "booking_date": "2025-02-04",
            "time_slot_id": time_slot_id,
            "items": [{"id": item["id"], "price": "1000000000"}]
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["errors"]["deposit_amount"].is_array());
    assert!(body["errors"]["items.0.price"].is_array());

    assert_eq!(delete(&client, &token, &format!("/items/{}", item["id"])).await, 204);
}
