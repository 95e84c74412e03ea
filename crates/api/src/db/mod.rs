//! Database operations for the SelempangKu `PostgreSQL` store.
//!
//! ## Tables
//!
//! - `app_user` - Customer and admin accounts (role column)
//! - `product` - Sash catalog
//! - `customer_order` - Orders with fixed money snapshot
//! - `payment` - Payment attempts against an order
//! - `bank_account` - Transfer destinations shown to customers
//! - `pending_registration` - Hashed email OTPs awaiting confirmation
//! - `password_reset_token` - Hashed password reset tokens
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p selempangku-cli -- migrate
//! ```
//!
//! All queries are runtime-checked (`sqlx::query_as` + `FromRow`) so the
//! workspace builds without a database.

pub mod banks;
pub mod orders;
pub mod payments;
pub mod products;
pub mod reports;
pub mod users;
pub mod verification;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use banks::BankAccountRepository;
pub use orders::OrderRepository;
pub use payments::PaymentRepository;
pub use products::ProductRepository;
pub use reports::ReportRepository;
pub use users::UserRepository;
pub use verification::VerificationRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A status change the order/payment lifecycle does not allow.
    #[error(transparent)]
    Lifecycle(#[from] selempangku_core::LifecycleError),

    /// Order amounts could not be computed.
    #[error(transparent)]
    Money(#[from] selempangku_core::MoneyError),
}

impl RepositoryError {
    /// Map unique and foreign-key violations to `Conflict`, everything else
    /// to `Database`.
    pub(crate) fn from_write(err: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && (db_err.is_unique_violation() || db_err.is_foreign_key_violation())
        {
            return Self::Conflict(conflict.to_owned());
        }
        Self::Database(err)
    }
}

/// Parse a status column into its closed enum.
pub(crate) fn parse_column<T>(value: &str) -> Result<T, RepositoryError>
where
    T: std::str::FromStr<Err = selempangku_core::UnknownValue>,
{
    value
        .parse()
        .map_err(|e: selempangku_core::UnknownValue| RepositoryError::DataCorruption(e.to_string()))
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    pool_options().connect(database_url.expose_secret()).await
}

/// Create a pool that connects on first use.
///
/// Used by tests that exercise routes which reject a request before touching
/// the database.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL cannot be parsed.
pub fn create_lazy_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    pool_options().connect_lazy(database_url.expose_secret())
}

fn pool_options() -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
}
