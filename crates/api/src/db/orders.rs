//! Order repository.
//!
//! Amounts are computed once, inside the creating transaction, from the
//! product price at that moment. Status changes lock the order row and go
//! through [`OrderStatus::admin_transition`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use selempangku_core::{Email, OrderId, OrderStatus, OrderTotals, ProductId, UserId};

use super::{RepositoryError, parse_column};
use crate::models::order::{NewOrder, Order, OrderSummary, Personalization};

const ORDER_COLUMNS: &str = "o.id, o.user_id, o.product_id, o.quantity, o.unit_price, o.subtotal, \
                             o.shipping_fee, o.total, o.shipping_address, o.sash_text, o.degree, \
                             o.institution, o.major, o.graduation_year, o.status, o.created_at, \
                             o.updated_at";

const SUMMARY_JOINS: &str = "FROM customer_order o
                             JOIN product p ON p.id = o.product_id
                             JOIN app_user u ON u.id = o.user_id";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    product_id: ProductId,
    quantity: i32,
    unit_price: Decimal,
    subtotal: Decimal,
    shipping_fee: Decimal,
    total: Decimal,
    shipping_address: String,
    sash_text: Option<String>,
    degree: Option<String>,
    institution: Option<String>,
    major: Option<String>,
    graduation_year: Option<i32>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let order = Self {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            subtotal: row.subtotal,
            shipping_fee: row.shipping_fee,
            total: row.total,
            shipping_address: row.shipping_address,
            personalization: Personalization {
                sash_text: row.sash_text,
                degree: row.degree,
                institution: row.institution,
                major: row.major,
                graduation_year: row.graduation_year,
            },
            status: parse_column(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };

        if !order.totals().is_consistent() {
            return Err(RepositoryError::DataCorruption(format!(
                "order {} amounts are inconsistent",
                order.id
            )));
        }
        Ok(order)
    }
}

#[derive(sqlx::FromRow)]
struct OrderSummaryRow {
    #[sqlx(flatten)]
    order: OrderRow,
    product_name: String,
    product_image: Option<String>,
    customer_email: Email,
    customer_name: Option<String>,
}

impl OrderSummaryRow {
    fn into_summary(self, with_customer: bool) -> Result<OrderSummary, RepositoryError> {
        let (customer_email, customer_name) = if with_customer {
            (Some(self.customer_email), self.customer_name)
        } else {
            (None, None)
        };
        Ok(OrderSummary {
            order: Order::try_from(self.order)?,
            product_name: self.product_name,
            product_image: self.product_image,
            customer_email,
            customer_name,
        })
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create an order in `Pending`, snapshotting the current product price.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Money` if the amounts cannot be computed.
    pub async fn create(
        &self,
        user_id: UserId,
        new: &NewOrder,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let unit_price: Decimal =
            sqlx::query_scalar("SELECT price FROM product WHERE id = $1 FOR SHARE")
                .bind(new.product_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(RepositoryError::NotFound)?;

        let totals = OrderTotals::compute(unit_price, new.quantity, new.shipping_fee)?;
        let p = &new.personalization;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO customer_order AS o
                 (user_id, product_id, quantity, unit_price, subtotal, shipping_fee, total,
                  shipping_address, sash_text, degree, institution, major, graduation_year, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(new.product_id)
        .bind(totals.quantity)
        .bind(totals.unit_price)
        .bind(totals.subtotal)
        .bind(totals.shipping_fee)
        .bind(totals.total)
        .bind(&new.shipping_address)
        .bind(p.sash_text.as_deref())
        .bind(p.degree.as_deref())
        .bind(p.institution.as_deref())
        .bind(p.major.as_deref())
        .bind(p.graduation_year)
        .bind(OrderStatus::Pending.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Order::try_from(row)
    }

    /// List a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderSummaryRow>(&format!(
            "SELECT {ORDER_COLUMNS}, p.name AS product_name, p.image AS product_image,
                    u.email AS customer_email, u.full_name AS customer_name
             {SUMMARY_JOINS}
             WHERE o.user_id = $1
             ORDER BY o.created_at DESC, o.id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_summary(false)).collect()
    }

    /// Get one order if it belongs to `user_id`.
    ///
    /// An order owned by someone else is indistinguishable from a missing one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        id: OrderId,
        user_id: UserId,
    ) -> Result<Option<OrderSummary>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderSummaryRow>(&format!(
            "SELECT {ORDER_COLUMNS}, p.name AS product_name, p.image AS product_image,
                    u.email AS customer_email, u.full_name AS customer_name
             {SUMMARY_JOINS}
             WHERE o.id = $1 AND o.user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| r.into_summary(false)).transpose()
    }

    /// Whether `user_id` owns order `id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_owned_by(&self, id: OrderId, user_id: UserId) -> Result<bool, RepositoryError> {
        let owned: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM customer_order WHERE id = $1 AND user_id = $2)",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;
        Ok(owned)
    }

    /// List every order with customer details, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderSummaryRow>(&format!(
            "SELECT {ORDER_COLUMNS}, p.name AS product_name, p.image AS product_image,
                    u.email AS customer_email, u.full_name AS customer_name
             {SUMMARY_JOINS}
             WHERE ($1::text IS NULL OR o.status = $1)
             ORDER BY o.created_at DESC, o.id DESC"
        ))
        .bind(status.map(OrderStatus::as_str))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_summary(true)).collect()
    }

    /// Move an order to `target` on an admin's request.
    ///
    /// The row is locked for the duration of the check and write, so two
    /// concurrent updates apply one after the other.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Lifecycle` if the transition is not allowed;
    /// the row is left unchanged.
    pub async fn update_status(
        &self,
        id: OrderId,
        target: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: String =
            sqlx::query_scalar("SELECT status FROM customer_order WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(RepositoryError::NotFound)?;

        let next = parse_column::<OrderStatus>(&current)?.admin_transition(target)?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "UPDATE customer_order AS o SET status = $2, updated_at = now()
             WHERE o.id = $1
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(next.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Order::try_from(row)
    }
}
