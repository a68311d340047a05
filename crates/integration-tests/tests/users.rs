//! Registration, login and health endpoint tests.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::net::{IpAddr, Ipv4Addr};

use axum::http::{Method, StatusCode};
use serde_json::json;

use tidewater_integration_tests::TestApp;

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_returns_account_and_token() {
    let app = TestApp::new();
    let response = app
        .send(
            Method::POST,
            "/api/users/register",
            None,
            Some(&json!({
                "name": "Jane Doe",
                "email": "Jane@Example.com",
                "password": "password123",
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["name"], "Jane Doe");
    assert_eq!(response.body["email"], "jane@example.com");
    assert_eq!(response.body["isAdmin"], false);
    assert!(response.body.get("password").is_none());

    let token = response.body["token"].as_str().unwrap();
    let claims = app.tokens.verify(token).unwrap();
    assert_eq!(
        claims.sub.to_string(),
        response.body["id"].as_str().unwrap()
    );
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = TestApp::new();
    app.register("Jane", "jane@example.com", "password123")
        .await;

    let response = app
        .send(
            Method::POST,
            "/api/users/register",
            None,
            Some(&json!({
                "name": "Impostor",
                "email": "JANE@example.com",
                "password": "password456",
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body, json!({ "message": "User already exists" }));
}

#[tokio::test]
async fn test_register_validation() {
    let app = TestApp::new();
    let cases = [
        json!({ "name": "Jane", "email": "jane@example.com", "password": "short" }),
        json!({ "name": "Jane", "email": "not-an-email", "password": "password123" }),
        json!({ "name": "  ", "email": "jane@example.com", "password": "password123" }),
        json!({ "email": "jane@example.com" }),
    ];

    for case in &cases {
        let response = app
            .send(Method::POST, "/api/users/register", None, Some(case))
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{case}");
        assert!(response.body["message"].is_string(), "{case}");
    }
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_round_trip() {
    let app = TestApp::new();
    app.register("Jane", "jane@example.com", "password123")
        .await;

    let response = app
        .send(
            Method::POST,
            "/api/users/login",
            None,
            Some(&json!({ "email": "jane@example.com", "password": "password123" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let token = response.body["token"].as_str().unwrap();
    let profile = app
        .send(
            Method::GET,
            "/api/users/profile",
            Some(&TestApp::bearer(token)),
            None,
        )
        .await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.body["email"], "jane@example.com");
}

#[tokio::test]
async fn test_login_failures_do_not_enumerate() {
    let app = TestApp::new();
    app.register("Jane", "jane@example.com", "password123")
        .await;

    let wrong_password = app
        .send(
            Method::POST,
            "/api/users/login",
            None,
            Some(&json!({ "email": "jane@example.com", "password": "password999" })),
        )
        .await;
    let unknown_email = app
        .send(
            Method::POST,
            "/api/users/login",
            None,
            Some(&json!({ "email": "bob@example.com", "password": "password123" })),
        )
        .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        wrong_password.body,
        json!({ "message": "Invalid email or password" })
    );
    assert_eq!(unknown_email.status, wrong_password.status);
    assert_eq!(unknown_email.body, wrong_password.body);
}

#[tokio::test]
async fn test_login_is_rate_limited_per_client() {
    let app = TestApp::new().with_client_ip(IpAddr::V4(Ipv4Addr::new(198, 51, 100, 77)));
    let body = json!({ "email": "nobody@example.com", "password": "password123" });

    let mut statuses = Vec::new();
    for _ in 0..6 {
        let response = app
            .send(Method::POST, "/api/users/login", None, Some(&body))
            .await;
        statuses.push(response.status);
    }

    assert!(
        statuses[..5]
            .iter()
            .all(|status| *status == StatusCode::UNAUTHORIZED),
        "{statuses:?}"
    );
    assert_eq!(statuses[5], StatusCode::TOO_MANY_REQUESTS);
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new();

    let live = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.body, json!("ok"));

    let ready = app.send(Method::GET, "/health/ready", None, None).await;
    assert_eq!(ready.status, StatusCode::OK);
}
