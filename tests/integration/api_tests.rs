//! API integration tests
//!
//! These run against a live server with a seeded admin account
//! (admin@bookwise.app / admin-password). Run with: cargo test -- --ignored

use reqwest::Client;
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};

const BASE_URL: &str = "http://localhost:8080/api/v1";

fn unique_suffix() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Clock before epoch")
        .as_nanos()
}

/// Helper to get an authenticated admin token
async fn get_admin_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "admin@bookwise.app",
            "password": "admin-password"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Register a fresh patron account, returning (user_id, email, password)
async fn register_patron(client: &Client) -> (String, String, String) {
    let suffix = unique_suffix();
    let email = format!("patron{}@university.edu", suffix);
    let password = "patron-password".to_string();

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "full_name": "Test Patron",
            "email": email,
            "university_id": (suffix % 1_000_000_000_000) as u64,
            "university_card": format!("cards/patron-{}.png", suffix),
            "password": password
        }))
        .send()
        .await
        .expect("Failed to send register request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse register response");
    assert_eq!(body["status"], "PENDING");
    let user_id = body["id"].as_str().expect("No user ID").to_string();

    (user_id, email, password)
}

/// Approve an account request and log the patron in, returning their token
async fn approve_and_login(
    client: &Client,
    admin_token: &str,
    user_id: &str,
    email: &str,
    password: &str,
) -> String {
    let response = client
        .put(format!("{}/users/{}/status", BASE_URL, user_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&json!({ "status": "APPROVED" }))
        .send()
        .await
        .expect("Failed to send approval request");

    assert_eq!(response.status(), 200);

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Create a book with the given number of copies, returning its ID
async fn create_book(client: &Client, admin_token: &str, copies: i32) -> String {
    let suffix = unique_suffix();
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&json!({
            "title": format!("Integration Test Book {}", suffix),
            "author": "Test Author",
            "genre": "Testing",
            "rating": 4,
            "cover_url": "https://media.example.com/covers/test.png",
            "cover_color": "#12141d",
            "description": "A book created by the integration tests",
            "total_copies": copies,
            "summary": "Created and removed by tests"
        }))
        .send()
        .await
        .expect("Failed to send create book request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse book response");
    assert_eq!(body["available_copies"], copies);
    body["id"].as_str().expect("No book ID").to_string()
}

async fn delete_book(client: &Client, admin_token: &str, book_id: &str) {
    let _ = client
        .delete(format!("{}/books/{}?force=true", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await;
}

async fn delete_user(client: &Client, admin_token: &str, user_id: &str) {
    let _ = client
        .delete(format!("{}/users/{}?force=true", BASE_URL, user_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await;
}

async fn get_available_copies(client: &Client, admin_token: &str, book_id: &str) -> i64 {
    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await
        .expect("Failed to fetch book");

    let body: Value = response.json().await.expect("Failed to parse book");
    body["available_copies"].as_i64().expect("No copy count")
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
            "email": "admin@bookwise.app",
            "password": "admin-password"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["role"], "ADMIN");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "admin@bookwise.app",
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
    let token = get_admin_token(&client).await;

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["email"], "admin@bookwise.app");
    // The password hash must never be serialized
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
#[ignore]
async fn test_list_books() {
    let client = Client::new();
    let token = get_admin_token(&client).await;

    let response = client
        .get(format!("{}/books?sort=name_asc&per_page=5", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"].is_array());
    assert!(body["total"].is_number());
    assert_eq!(body["per_page"], 5);
}

#[tokio::test]
#[ignore]
async fn test_create_and_delete_book() {
    let client = Client::new();
    let token = get_admin_token(&client).await;

    let book_id = create_book(&client, &token, 3).await;

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 204);
}

#[tokio::test]
#[ignore]
async fn test_pending_account_cannot_borrow() {
    let client = Client::new();
    let admin_token = get_admin_token(&client).await;
    let book_id = create_book(&client, &admin_token, 1).await;

    let (user_id, email, password) = register_patron(&client).await;

    // Pending accounts can log in but not borrow
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");
    let body: Value = response.json().await.expect("Failed to parse login response");
    let patron_token = body["token"].as_str().expect("No token").to_string();

    let response = client
        .post(format!("{}/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", patron_token))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send borrow request");

    assert_eq!(response.status(), 403);

    delete_book(&client, &admin_token, &book_id).await;
    delete_user(&client, &admin_token, &user_id).await;
}

#[tokio::test]
#[ignore]
async fn test_borrow_lifecycle() {
    let client = Client::new();
    let admin_token = get_admin_token(&client).await;
    let book_id = create_book(&client, &admin_token, 1).await;

    let (user_id, email, password) = register_patron(&client).await;
    let patron_token = approve_and_login(&client, &admin_token, &user_id, &email, &password).await;

    // Borrow the only copy
    let response = client
        .post(format!("{}/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", patron_token))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send borrow request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse borrow response");
    let record_id = body["id"].as_str().expect("No record ID").to_string();
    assert_eq!(body["status"], "BORROWED");
    assert!(body["due_date"].is_string());

    assert_eq!(get_available_copies(&client, &admin_token, &book_id).await, 0);

    // The same user cannot borrow the same book twice
    let response = client
        .post(format!("{}/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", patron_token))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send borrow request");
    assert_eq!(response.status(), 409);

    // Receipt is available to the record owner
    let response = client
        .get(format!("{}/borrows/{}/receipt", BASE_URL, record_id))
        .header("Authorization", format!("Bearer {}", patron_token))
        .send()
        .await
        .expect("Failed to send receipt request");
    assert!(response.status().is_success());
    let receipt: Value = response.json().await.expect("Failed to parse receipt");
    assert_eq!(receipt["receipt_id"].as_str(), Some(record_id.as_str()));
    assert_eq!(receipt["duration_days"], 7);

    // Return the book
    let response = client
        .put(format!("{}/borrows/{}/status", BASE_URL, record_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&json!({ "status": "RETURNED" }))
        .send()
        .await
        .expect("Failed to send return request");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse return response");
    assert_eq!(body["status"], "RETURNED");
    assert!(body["return_date"].is_string());

    assert_eq!(get_available_copies(&client, &admin_token, &book_id).await, 1);

    // Returning again is an idempotent no-op, not a double increment
    let response = client
        .put(format!("{}/borrows/{}/status", BASE_URL, record_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&json!({ "status": "RETURNED" }))
        .send()
        .await
        .expect("Failed to send return request");
    assert_eq!(response.status(), 200);

    assert_eq!(get_available_copies(&client, &admin_token, &book_id).await, 1);

    delete_book(&client, &admin_token, &book_id).await;
    delete_user(&client, &admin_token, &user_id).await;
}

#[tokio::test]
#[ignore]
async fn test_borrow_exhausted_book_is_rejected() {
    let client = Client::new();
    let admin_token = get_admin_token(&client).await;
    let book_id = create_book(&client, &admin_token, 1).await;

    let (first_id, first_email, first_password) = register_patron(&client).await;
    let first_token =
        approve_and_login(&client, &admin_token, &first_id, &first_email, &first_password).await;
    let (second_id, second_email, second_password) = register_patron(&client).await;
    let second_token =
        approve_and_login(&client, &admin_token, &second_id, &second_email, &second_password).await;

    let response = client
        .post(format!("{}/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", first_token))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send borrow request");
    assert_eq!(response.status(), 201);

    // No copies left: the second patron is rejected with a distinct error code
    let response = client
        .post(format!("{}/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", second_token))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send borrow request");
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.expect("Failed to parse error");
    assert_eq!(body["error"], "BookNotAvailable");

    delete_book(&client, &admin_token, &book_id).await;
    delete_user(&client, &admin_token, &first_id).await;
    delete_user(&client, &admin_token, &second_id).await;
}

#[tokio::test]
#[ignore]
async fn test_concurrent_borrows_of_last_copy() {
    let client = Client::new();
    let admin_token = get_admin_token(&client).await;
    let book_id = create_book(&client, &admin_token, 1).await;

    let (first_id, first_email, first_password) = register_patron(&client).await;
    let first_token =
        approve_and_login(&client, &admin_token, &first_id, &first_email, &first_password).await;
    let (second_id, second_email, second_password) = register_patron(&client).await;
    let second_token =
        approve_and_login(&client, &admin_token, &second_id, &second_email, &second_password).await;

    let first_req = client
        .post(format!("{}/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", first_token))
        .json(&json!({ "book_id": book_id }))
        .send();
    let second_req = client
        .post(format!("{}/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", second_token))
        .json(&json!({ "book_id": book_id }))
        .send();

    let (first_res, second_res) = tokio::join!(first_req, second_req);
    let statuses = [
        first_res.expect("First borrow failed to send").status(),
        second_res.expect("Second borrow failed to send").status(),
    ];

    // Exactly one borrow wins the last copy
    let successes = statuses.iter().filter(|s| s.as_u16() == 201).count();
    let conflicts = statuses.iter().filter(|s| s.as_u16() == 409).count();
    assert_eq!(successes, 1, "statuses: {:?}", statuses);
    assert_eq!(conflicts, 1, "statuses: {:?}", statuses);

    assert_eq!(get_available_copies(&client, &admin_token, &book_id).await, 0);

    delete_book(&client, &admin_token, &book_id).await;
    delete_user(&client, &admin_token, &first_id).await;
    delete_user(&client, &admin_token, &second_id).await;
}

#[tokio::test]
#[ignore]
async fn test_account_requests_listing() {
    let client = Client::new();
    let admin_token = get_admin_token(&client).await;
    let (user_id, email, _) = register_patron(&client).await;

    let response = client
        .get(format!("{}/users/account-requests?query={}", BASE_URL, email))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    let items = body["items"].as_array().expect("No items array");
    assert!(items.iter().all(|u| u["status"] == "PENDING"));
    assert!(items.iter().any(|u| u["email"] == email.as_str()));

    delete_user(&client, &admin_token, &user_id).await;
}

#[tokio::test]
#[ignore]
async fn test_upload_auth() {
    let client = Client::new();
    let token = get_admin_token(&client).await;

    let response = client
        .get(format!("{}/uploads/auth", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert!(body["expire"].is_number());
    assert_eq!(body["signature"].as_str().map(|s| s.len()), Some(40));
}

#[tokio::test]
#[ignore]
async fn test_get_stats() {
    let client = Client::new();
    let token = get_admin_token(&client).await;

    let response = client
        .get(format!("{}/stats", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["total_books"].is_number());
    assert!(body["total_users"].is_number());
    assert!(body["borrowed_books"].is_number());
    assert!(body["recent_books"].is_array());
    assert!(body["borrow_requests"].is_array());
    assert!(body["account_requests"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_admin_routes_reject_patrons() {
    let client = Client::new();
    let admin_token = get_admin_token(&client).await;

    let (user_id, email, password) = register_patron(&client).await;
    let patron_token = approve_and_login(&client, &admin_token, &user_id, &email, &password).await;

    let response = client
        .get(format!("{}/users", BASE_URL))
        .header("Authorization", format!("Bearer {}", patron_token))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);

    delete_user(&client, &admin_token, &user_id).await;
}
