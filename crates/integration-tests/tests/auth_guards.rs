//! Bearer token and role checks on protected routes.
//!
//! Every request here is rejected before a query runs, so no database is
//! needed.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use selempangku_core::Role;
use selempangku_integration_tests::TestApp;

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new();
    let (status, _) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = TestApp::new();
    for uri in ["/auth/me", "/orders", "/payments", "/profile", "/admin/dashboard"] {
        let (status, body) = app.send(Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["message"], "Access token required", "{uri}");
    }
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let app = TestApp::new();
    let (status, body) = app
        .send(Method::GET, "/orders", Some("not.a.jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");
}

#[tokio::test]
async fn test_token_from_another_secret_is_rejected() {
    let app = TestApp::new();
    // Tokens are only valid for the secret that signed them.
    let foreign = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.\
                   eyJzdWIiOiIxIiwicm9sZSI6IkFkbWluIiwiaWF0IjoxLCJleHAiOjk5OTk5OTk5OTl9.\
                   c2lnbmF0dXJl";
    let (status, _) = app
        .send(Method::GET, "/admin/dashboard", Some(foreign), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_customer_cannot_use_admin_routes() {
    let app = TestApp::new();
    let token = app.token(7, Role::Customer);
    for uri in [
        "/admin/dashboard",
        "/admin/members",
        "/admin/reports",
        "/orders/admin/all",
        "/payments/admin/all",
        "/banks/admin/all",
    ] {
        let (status, body) = app.send(Method::GET, uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(body["message"], "Admin access required", "{uri}");
    }
}

#[tokio::test]
async fn test_admin_cannot_place_orders() {
    let app = TestApp::new();
    let token = app.token(1, Role::Admin);
    let (status, body) = app
        .send(
            Method::POST,
            "/orders",
            Some(&token),
            Some(serde_json::json!({ "product_id": 1, "quantity": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Customer access required");
}

#[tokio::test]
async fn test_customer_cannot_verify_payments() {
    let app = TestApp::new();
    let token = app.token(7, Role::Customer);
    let (status, _) = app
        .send(
            Method::PUT,
            "/payments/1/verify",
            Some(&token),
            Some(serde_json::json!({ "status": "Terverifikasi" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
