//! Order, payment and verification against a migrated database.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied (`sk-cli migrate`)
//! - `TEST_DATABASE_URL` pointing at it
//!
//! Run with: cargo test -p selempangku-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use std::str::FromStr;

use axum::http::{Method, Request, StatusCode, header};
use rust_decimal::Decimal;
use serde_json::{Value, json};

use selempangku_api::db::users::NewUser;
use selempangku_api::db::{ProductRepository, UserRepository};
use selempangku_api::models::ProductInput;
use selempangku_api::services::auth::password::hash_password;
use selempangku_core::{Email, ProductId, Role};
use selempangku_integration_tests::{TestApp, multipart_body};

const PASSWORD: &str = "wisuda-2026";

/// Insert an account and log it in through the API.
async fn login_as(app: &TestApp, role: Role) -> String {
    let tag = uuid::Uuid::new_v4().simple().to_string();
    let email = Email::parse(&format!("{}-{tag}@example.com", role.as_str().to_lowercase())).unwrap();
    let hash = hash_password(PASSWORD).unwrap();
    UserRepository::new(app.state.pool())
        .create(&NewUser {
            email: &email,
            username: &format!("u{}", &tag[..12]),
            password_hash: &hash,
            full_name: Some("Test User"),
            phone: None,
            role,
        })
        .await
        .unwrap();

    let uri = if role.is_admin() { "/auth/admin/login" } else { "/auth/login" };
    let (status, body) = app
        .send(
            Method::POST,
            uri,
            None,
            Some(json!({ "email": email.as_str(), "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"]["token"].as_str().unwrap().to_owned()
}

fn satin(price: i64) -> ProductInput {
    ProductInput {
        name: "Selempang Satin".to_owned(),
        description: None,
        price: Decimal::from(price),
        image: None,
    }
}

async fn seed_product(app: &TestApp) -> ProductId {
    ProductRepository::new(app.state.pool())
        .create(&satin(100_000))
        .await
        .unwrap()
        .id
}

async fn place_order(app: &TestApp, token: &str, product_id: ProductId) -> i64 {
    let (status, body) = app
        .send(
            Method::POST,
            "/orders",
            Some(token),
            Some(json!({
                "product_id": product_id.as_i32(),
                "quantity": 2,
                "shipping_fee": 15000,
                "shipping_address": "Jl. Diponegoro 22, Semarang"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["orderId"].as_i64().unwrap()
}

async fn submit_payment(app: &TestApp, token: &str, order_id: &str) -> (StatusCode, Value) {
    let (content_type, body) = multipart_body(&[
        ("pesanan_id", order_id),
        ("metode_pembayaran", "Transfer"),
        ("jumlah_transfer", "215000"),
        ("bank_pengirim", "BCA"),
    ]);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/payments")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, content_type)
        .body(body)
        .unwrap();
    app.dispatch(request).await
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        other => Decimal::from_str(&other.to_string()).unwrap(),
    }
}

#[tokio::test]
#[ignore = "Requires a migrated database at TEST_DATABASE_URL"]
async fn test_order_to_shipment() {
    let app = TestApp::connected().await;
    let customer = login_as(&app, Role::Customer).await;
    let admin = login_as(&app, Role::Admin).await;
    let product_id = seed_product(&app).await;

    // Client-sent totals are ignored.
    let (status, body) = app
        .send(
            Method::POST,
            "/orders",
            Some(&customer),
            Some(json!({
                "produk_id": product_id.as_i32(),
                "jumlah": 2,
                "ongkir": "15000",
                "alamat_pengiriman": "Jl. Ganesha 10, Bandung",
                "total": 1
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(decimal(&body["data"]["total"]), Decimal::from(215_000));
    let order_id = body["data"]["orderId"].as_i64().unwrap().to_string();

    let (status, body) = submit_payment(&app, &customer, &order_id).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["orderStatus"], "Verifikasi");
    let payment_id = body["data"]["paymentId"].as_i64().unwrap();

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/payments/{payment_id}/verify"),
            Some(&admin),
            Some(json!({ "status": "Terverifikasi" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["orderStatus"], "Proses");

    // A payment is decided once.
    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/payments/{payment_id}/verify"),
            Some(&admin),
            Some(json!({ "status": "Ditolak" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/orders/{order_id}/status"),
            Some(&admin),
            Some(json!({ "status": "Terkirim" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, body) = app
        .send(Method::GET, &format!("/orders/{order_id}"), Some(&customer), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "Terkirim");
}

#[tokio::test]
#[ignore = "Requires a migrated database at TEST_DATABASE_URL"]
async fn test_skipping_a_state_is_a_conflict() {
    let app = TestApp::connected().await;
    let customer = login_as(&app, Role::Customer).await;
    let admin = login_as(&app, Role::Admin).await;
    let product_id = seed_product(&app).await;

    let (_, body) = app
        .send(
            Method::POST,
            "/orders",
            Some(&customer),
            Some(json!({
                "product_id": product_id.as_i32(),
                "quantity": 1,
                "shipping_address": "Jl. Malioboro 5, Yogyakarta"
            })),
        )
        .await;
    let order_id = body["data"]["orderId"].as_i64().unwrap();

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/orders/{order_id}/status"),
            Some(&admin),
            Some(json!({ "status": "Selesai" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires a migrated database at TEST_DATABASE_URL"]
async fn test_orders_are_private_to_their_owner() {
    let app = TestApp::connected().await;
    let owner = login_as(&app, Role::Customer).await;
    let other = login_as(&app, Role::Customer).await;
    let product_id = seed_product(&app).await;

    let (_, body) = app
        .send(
            Method::POST,
            "/orders",
            Some(&owner),
            Some(json!({
                "product_id": product_id.as_i32(),
                "quantity": 1,
                "shipping_address": "Jl. Sudirman 1, Jakarta"
            })),
        )
        .await;
    let order_id = body["data"]["orderId"].as_i64().unwrap();

    let (status, _) = app
        .send(Method::GET, &format!("/orders/{order_id}"), Some(&other), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = submit_payment(&app, &other, &order_id.to_string()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires a migrated database at TEST_DATABASE_URL"]
async fn test_rejected_payment_allows_resubmission() {
    let app = TestApp::connected().await;
    let customer = login_as(&app, Role::Customer).await;
    let admin = login_as(&app, Role::Admin).await;
    let product_id = seed_product(&app).await;
    let order_id = place_order(&app, &customer, product_id).await.to_string();

    let (_, body) = submit_payment(&app, &customer, &order_id).await;
    let first = body["data"]["paymentId"].as_i64().unwrap();

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/payments/{first}/verify"),
            Some(&admin),
            Some(json!({ "status": "Ditolak", "catatan": "Bukti buram" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["payment"]["status"], "Ditolak");
    assert_eq!(body["data"]["orderStatus"], "Verifikasi");

    let (status, body) = submit_payment(&app, &customer, &order_id).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["orderStatus"], "Verifikasi");
    let second = body["data"]["paymentId"].as_i64().unwrap();
    assert_ne!(first, second);

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/payments/{second}/verify"),
            Some(&admin),
            Some(json!({ "status": "Terverifikasi" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["orderStatus"], "Proses");
}

#[tokio::test]
#[ignore = "Requires a migrated database at TEST_DATABASE_URL"]
async fn test_price_change_does_not_reprice_order() {
    let app = TestApp::connected().await;
    let customer = login_as(&app, Role::Customer).await;
    let product_id = seed_product(&app).await;
    let order_id = place_order(&app, &customer, product_id).await;

    ProductRepository::new(app.state.pool())
        .update(product_id, &satin(250_000))
        .await
        .unwrap();

    let (status, body) = app
        .send(Method::GET, &format!("/orders/{order_id}"), Some(&customer), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(decimal(&body["data"]["unit_price"]), Decimal::from(100_000));
    assert_eq!(decimal(&body["data"]["subtotal"]), Decimal::from(200_000));
    assert_eq!(decimal(&body["data"]["total"]), Decimal::from(215_000));

    // New orders pick up the new price.
    let (_, body) = app
        .send(
            Method::POST,
            "/orders",
            Some(&customer),
            Some(json!({
                "product_id": product_id.as_i32(),
                "quantity": 1,
                "shipping_address": "Jl. Diponegoro 22, Semarang"
            })),
        )
        .await;
    assert_eq!(decimal(&body["data"]["total"]), Decimal::from(250_000));
}
