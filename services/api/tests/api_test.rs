//! Router-level tests for the paths that never reach the store: auth
//! rejection variants, request validation, and role gates. The pool is
//! created lazily and no connection is ever opened.

use axum::http::{header::AUTHORIZATION, HeaderValue};
use axum_test::TestServer;
use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use driveconnect_api::{
    config::{AppConfig, BookingPolicy},
    routes,
    state::AppState,
};
use driveconnect_auth::{Claims, JwtService};
use driveconnect_common::{ApiResponse, DatabaseConfig, JwtConfig, ServerConfig, UserRole};

const TEST_SECRET: &str = "test-secret";

fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: TEST_SECRET.to_string(),
        expiration_hours: 24,
        issuer: "driveconnect-test".to_string(),
    }
}

fn test_state() -> AppState {
    let config = AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig {
            host: "localhost".to_string(),
            port: 5432,
            username: "test".to_string(),
            password: "test".to_string(),
            database: "driveconnect_test".to_string(),
            max_connections: 1,
        },
        jwt: jwt_config(),
        policy: BookingPolicy::default(),
    };

    let db_pool = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy(&config.database.connection_string())
        .expect("lazy pool");

    AppState {
        db_pool,
        jwt_service: JwtService::new(TEST_SECRET),
        config,
    }
}

fn server() -> TestServer {
    TestServer::new(routes::create_routes().with_state(test_state())).expect("test server")
}

fn token_for(role: UserRole) -> String {
    let claims = Claims::new(
        Uuid::new_v4(),
        "user@example.nc".to_string(),
        "Test User".to_string(),
        role,
        &jwt_config(),
    );
    JwtService::new(TEST_SECRET).generate_token(&claims).unwrap()
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

fn error_message(response: &axum_test::TestResponse) -> String {
    let body: ApiResponse<serde_json::Value> = response.json();
    body.error.unwrap_or_default()
}

#[tokio::test]
async fn health_check_is_public() {
    let server = server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: ApiResponse<String> = response.json();
    assert!(body.success);
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let server = server();

    let response = server.get("/bookings").await;

    response.assert_status_unauthorized();
    assert_eq!(error_message(&response), "Missing authentication token");
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    let server = server();

    let response = server
        .get("/bookings")
        .add_header(AUTHORIZATION, bearer("not-a-real-token"))
        .await;

    response.assert_status_unauthorized();
    assert_eq!(error_message(&response), "Invalid token");
}

#[tokio::test]
async fn expired_token_gets_a_distinct_message() {
    let server = server();

    let mut claims = Claims::new(
        Uuid::new_v4(),
        "user@example.nc".to_string(),
        "Test User".to_string(),
        UserRole::Student,
        &jwt_config(),
    );
    claims.exp = (Utc::now() - Duration::hours(1)).timestamp();
    claims.iat = (Utc::now() - Duration::hours(2)).timestamp();
    let token = JwtService::new(TEST_SECRET).generate_token(&claims).unwrap();

    let response = server
        .get("/bookings")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status_unauthorized();
    assert!(error_message(&response).contains("expired"));
}

#[tokio::test]
async fn reserving_requires_a_slot_id() {
    let server = server();
    let token = token_for(UserRole::Student);

    let response = server
        .post("/bookings")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({}))
        .await;

    response.assert_status_bad_request();
    assert_eq!(error_message(&response), "slotId is required");
}

#[tokio::test]
async fn instructors_cannot_reserve_slots() {
    let server = server();
    let token = token_for(UserRole::Instructor);

    let response = server
        .post("/bookings")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "slotId": Uuid::new_v4() }))
        .await;

    response.assert_status_forbidden();
    assert_eq!(error_message(&response), "Students only");
}

#[tokio::test]
async fn students_cannot_publish_slots() {
    let server = server();
    let token = token_for(UserRole::Student);

    let response = server
        .post("/slots")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({
            "date": "2030-01-15",
            "time": "09:00",
            "duration": 2.0,
            "price": 3000
        }))
        .await;

    response.assert_status_forbidden();
    assert_eq!(error_message(&response), "Instructors only");
}

#[tokio::test]
async fn unknown_booking_action_is_rejected_at_the_boundary() {
    let server = server();
    let token = token_for(UserRole::Student);

    let response = server
        .put(&format!("/bookings/{}", Uuid::new_v4()))
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "action": "approve" }))
        .await;

    response.assert_status_bad_request();
    assert_eq!(
        error_message(&response),
        "Invalid action. Valid actions: cancel, confirm, reject"
    );
}

#[tokio::test]
async fn missing_booking_action_is_rejected() {
    let server = server();
    let token = token_for(UserRole::Student);

    let response = server
        .put(&format!("/bookings/{}", Uuid::new_v4()))
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({}))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn slot_listing_requires_an_instructor_id() {
    let server = server();

    let response = server.get("/slots").await;

    response.assert_status_bad_request();
    assert_eq!(error_message(&response), "instructorId is required");
}

#[tokio::test]
async fn registration_validates_the_email() {
    let server = server();

    let response = server
        .post("/auth/register")
        .json(&json!({
            "email": "not-an-email",
            "password": "secret1",
            "name": "Marie",
            "role": "student"
        }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn registration_rejects_short_passwords() {
    let server = server();

    let response = server
        .post("/auth/register")
        .json(&json!({
            "email": "marie@example.nc",
            "password": "abc",
            "name": "Marie",
            "role": "student"
        }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn registration_rejects_unknown_roles() {
    let server = server();

    let response = server
        .post("/auth/register")
        .json(&json!({
            "email": "marie@example.nc",
            "password": "secret1",
            "name": "Marie",
            "role": "admin"
        }))
        .await;

    response.assert_status_bad_request();
    assert_eq!(error_message(&response), "Invalid user role: admin");
}

#[tokio::test]
async fn own_profile_requires_the_instructor_role() {
    let server = server();
    let token = token_for(UserRole::Student);

    let response = server
        .get("/instructors/me")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;

    response.assert_status_forbidden();
    assert_eq!(error_message(&response), "Instructors only");
}

#[tokio::test]
async fn unknown_endpoints_are_not_found() {
    let server = server();

    let response = server.get("/instructors/unknown/extra").await;

    response.assert_status_not_found();
}
