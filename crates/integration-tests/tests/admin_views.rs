//! Admin listings and reports are plain reads: asking twice gives the same
//! answer. Kept in its own test binary so no other test writes in between.
//!
//! Requires a migrated database at `TEST_DATABASE_URL`.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::json;

use selempangku_api::db::users::NewUser;
use selempangku_api::db::{ProductRepository, UserRepository};
use selempangku_api::models::ProductInput;
use selempangku_core::{Email, Role};
use selempangku_integration_tests::TestApp;

const ADMIN_VIEWS: &[&str] = &[
    "/orders/admin/all",
    "/orders/admin/all?status=Pending",
    "/payments/admin/all",
    "/admin/dashboard",
    "/admin/members",
    "/admin/reports",
    "/admin/reports/daily",
    "/admin/reports/monthly",
];

#[tokio::test]
#[ignore = "Requires a migrated database at TEST_DATABASE_URL"]
async fn test_admin_reads_are_repeatable() {
    let app = TestApp::connected().await;

    let tag = uuid::Uuid::new_v4().simple().to_string();
    let email = Email::parse(&format!("laporan-{tag}@example.com")).unwrap();
    let customer = UserRepository::new(app.state.pool())
        .create(&NewUser {
            email: &email,
            username: &format!("l{}", &tag[..12]),
            password_hash: "unused",
            full_name: None,
            phone: None,
            role: Role::Customer,
        })
        .await
        .unwrap();
    let product = ProductRepository::new(app.state.pool())
        .create(&ProductInput {
            name: "Selempang Beludru".to_owned(),
            description: None,
            price: Decimal::from(120_000),
            image: None,
        })
        .await
        .unwrap();

    let customer_token = app.token(customer.id.as_i32(), Role::Customer);
    let (status, body) = app
        .send(
            Method::POST,
            "/orders",
            Some(&customer_token),
            Some(json!({
                "product_id": product.id.as_i32(),
                "quantity": 1,
                "shipping_address": "Jl. Pemuda 3, Surabaya"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let admin = app.token(1, Role::Admin);
    for uri in ADMIN_VIEWS {
        let (first_status, first) = app.send(Method::GET, uri, Some(&admin), None).await;
        let (second_status, second) = app.send(Method::GET, uri, Some(&admin), None).await;
        assert_eq!(first_status, StatusCode::OK, "{uri}: {first}");
        assert_eq!(second_status, StatusCode::OK, "{uri}");
        assert_eq!(first, second, "{uri}");
    }
}
