//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! # Auth (rate limited)
//! POST /auth/register              - Validate and email an OTP
//! POST /auth/verify-email          - Create the account from a valid OTP
//! POST /auth/login                 - Issue a session token
//! POST /auth/admin/login           - Issue a session token (admins only)
//! POST /auth/forgot-password       - Email a reset link
//! POST /auth/reset-password        - Set a new password from a reset token
//! GET  /auth/me                    - Current user
//!
//! # Profile (any signed-in user)
//! GET  /profile
//! PUT  /profile                    - Multipart, optional avatar
//! PUT  /profile/password
//!
//! # Products
//! GET    /products, /products/{id}
//! POST   /products                 - Admin, multipart
//! PUT    /products/{id}            - Admin, multipart
//! DELETE /products/{id}            - Admin
//!
//! # Orders
//! POST /orders                     - Customer
//! GET  /orders, /orders/{id}       - Customer, own orders only
//! GET  /orders/{id}/payments       - Customer, own orders only
//! GET  /orders/admin/all?status=   - Admin
//! PUT  /orders/{id}/status         - Admin
//!
//! # Payments
//! POST /payments                   - Customer, multipart
//! GET  /payments                   - Customer
//! GET  /payments/admin/all?status= - Admin
//! PUT  /payments/{id}/verify       - Admin
//!
//! # Banks
//! GET    /banks, /banks/{id}       - Active accounts
//! GET    /banks/admin/all          - Admin
//! POST   /banks                    - Admin
//! PUT    /banks/{id}               - Admin
//! DELETE /banks/{id}               - Admin
//!
//! # Admin
//! GET /admin/dashboard, /admin/members
//! GET /admin/reports, /admin/reports/daily, /admin/reports/monthly
//! ```

pub mod admin;
pub mod auth;
pub mod banks;
pub mod form;
pub mod orders;
pub mod payments;
pub mod products;
pub mod profile;

use std::str::FromStr;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts},
    routing::{get, post, put},
};
use serde::Deserialize;

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::middleware::{auth_rate_limiter, rate_limit_envelope};
use crate::state::AppState;

/// JSON body whose rejection renders as the `{ "message": ... }` envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Path parameter whose rejection renders as the error envelope.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct PathParam<T>(pub T);

/// Query string whose rejection renders as the error envelope.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);

/// `?status=` filter on the admin list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct StatusFilter {
    #[serde(default)]
    pub status: Option<String>,
}

impl StatusFilter {
    /// Parse the filter; absent or blank means no filter.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a value outside the enum.
    pub fn parse<T: FromStr>(&self) -> Result<Option<T>, AppError> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => T::from_str(s)
                .map(Some)
                .map_err(|_| AppError::Validation("Invalid status".to_owned())),
        }
    }
}

/// Map a repository `NotFound` to a 404 with a specific message.
pub(crate) fn not_found(message: &'static str) -> impl Fn(RepositoryError) -> AppError {
    move |err| match err {
        RepositoryError::NotFound => AppError::NotFound(message.to_owned()),
        other => other.into(),
    }
}

/// Create the auth routes router.
///
/// `trust_proxy_headers` selects how the rate limiter identifies a client.
pub fn auth_routes(trust_proxy_headers: bool) -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/verify-email", post(auth::verify_email))
        .route("/login", post(auth::login))
        .route("/admin/login", post(auth::admin_login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        .layer(auth_rate_limiter(trust_proxy_headers))
        .layer(axum::middleware::from_fn(rate_limit_envelope))
        .route("/me", get(auth::me))
}

/// Create the profile routes router.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(profile::show).put(profile::update))
        .route("/password", put(profile::change_password))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::mine).post(orders::create))
        .route("/admin/all", get(orders::all))
        .route("/{id}", get(orders::show))
        .route("/{id}/payments", get(orders::payments))
        .route("/{id}/status", put(orders::update_status))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(payments::mine).post(payments::create))
        .route("/admin/all", get(payments::all))
        .route("/{id}/verify", put(payments::verify))
}

/// Create the bank account routes router.
pub fn bank_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(banks::index).post(banks::create))
        .route("/admin/all", get(banks::all))
        .route(
            "/{id}",
            get(banks::show).put(banks::update).delete(banks::destroy),
        )
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(admin::dashboard))
        .route("/members", get(admin::members))
        .route("/reports", get(admin::reports))
        .route("/reports/daily", get(admin::daily))
        .route("/reports/monthly", get(admin::monthly))
}

/// Create all API routes.
pub fn routes(trust_proxy_headers: bool) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes(trust_proxy_headers))
        .nest("/profile", profile_routes())
        .nest("/products", product_routes())
        .nest("/orders", order_routes())
        .nest("/payments", payment_routes())
        .nest("/banks", bank_routes())
        .nest("/admin", admin_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use selempangku_core::{OrderStatus, PaymentStatus};

    fn filter(status: Option<&str>) -> StatusFilter {
        StatusFilter {
            status: status.map(str::to_owned),
        }
    }

    #[test]
    fn test_status_filter() {
        assert_eq!(filter(None).parse::<OrderStatus>().unwrap(), None);
        assert_eq!(filter(Some(" ")).parse::<OrderStatus>().unwrap(), None);
        assert_eq!(
            filter(Some("Terkirim")).parse::<OrderStatus>().unwrap(),
            Some(OrderStatus::Shipped)
        );
        assert_eq!(
            filter(Some("Ditolak")).parse::<PaymentStatus>().unwrap(),
            Some(PaymentStatus::Rejected)
        );
        assert!(filter(Some("Lost")).parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_not_found_mapping() {
        let err = not_found("Order not found")(RepositoryError::NotFound);
        assert!(matches!(err, AppError::NotFound(ref m) if m == "Order not found"));

        let err = not_found("Order not found")(RepositoryError::Conflict("x".into()));
        assert!(matches!(err, AppError::Database(RepositoryError::Conflict(_))));
    }
}
