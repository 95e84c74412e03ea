//! Payment repository.
//!
//! Submitting and verifying a payment each change two rows (the payment and
//! its order). Both happen in one transaction with the order row locked, and
//! the order status only moves through the lifecycle transition table.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use selempangku_core::{
    Email, OrderEvent, OrderId, OrderStatus, PaymentDecision, PaymentId, PaymentStatus, UserId,
    lifecycle::order_event_for,
};

use super::{RepositoryError, parse_column};
use crate::models::payment::{NewPayment, Payment, PaymentSummary};

const PAYMENT_COLUMNS: &str = "pb.id, pb.order_id, pb.method, pb.sender_bank, pb.sender_account, \
                               pb.amount, pb.proof_image, pb.status, pb.note, pb.submitted_at, \
                               pb.verified_at";

const SUMMARY_SELECT: &str = "o.status AS order_status, o.total AS order_total,
                              p.name AS product_name, u.email AS customer_email,
                              u.full_name AS customer_name
                              FROM payment pb
                              JOIN customer_order o ON o.id = pb.order_id
                              JOIN product p ON p.id = o.product_id
                              JOIN app_user u ON u.id = o.user_id";

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: PaymentId,
    order_id: OrderId,
    method: String,
    sender_bank: Option<String>,
    sender_account: Option<String>,
    amount: Decimal,
    proof_image: Option<String>,
    status: String,
    note: Option<String>,
    submitted_at: DateTime<Utc>,
    verified_at: Option<DateTime<Utc>>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = RepositoryError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            order_id: row.order_id,
            method: row.method,
            sender_bank: row.sender_bank,
            sender_account: row.sender_account,
            amount: row.amount,
            proof_image: row.proof_image,
            status: parse_column(&row.status)?,
            note: row.note,
            submitted_at: row.submitted_at,
            verified_at: row.verified_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PaymentSummaryRow {
    #[sqlx(flatten)]
    payment: PaymentRow,
    order_status: String,
    order_total: Decimal,
    product_name: String,
    customer_email: Email,
    customer_name: Option<String>,
}

impl PaymentSummaryRow {
    fn into_summary(self, with_customer: bool) -> Result<PaymentSummary, RepositoryError> {
        let (customer_email, customer_name) = if with_customer {
            (Some(self.customer_email), self.customer_name)
        } else {
            (None, None)
        };
        Ok(PaymentSummary {
            payment: Payment::try_from(self.payment)?,
            order_status: parse_column(&self.order_status)?,
            order_total: self.order_total,
            product_name: self.product_name,
            customer_email,
            customer_name,
        })
    }
}

#[derive(sqlx::FromRow)]
struct DecisionTarget {
    payment_status: String,
    order_id: OrderId,
    order_status: String,
}

/// Outcome of an admin decision on a payment.
#[derive(Debug, Clone)]
pub struct Verification {
    pub payment: Payment,
    pub order_status: OrderStatus,
}

/// Repository for payment database operations.
pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    /// Create a new payment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a payment against an order owned by `user_id` and move the order
    /// to `Verifikasi`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist or
    /// belongs to another user.
    /// Returns `RepositoryError::Lifecycle` if the order is past verification;
    /// nothing is written in that case.
    pub async fn submit(
        &self,
        user_id: UserId,
        new: &NewPayment,
    ) -> Result<Payment, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: String = sqlx::query_scalar(
            "SELECT status FROM customer_order WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(new.order_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let next = parse_column::<OrderStatus>(&current)?.apply(OrderEvent::PaymentSubmitted)?;

        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "INSERT INTO payment AS pb
                 (order_id, method, sender_bank, sender_account, amount, proof_image, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(new.order_id)
        .bind(&new.method)
        .bind(new.sender_bank.as_deref())
        .bind(new.sender_account.as_deref())
        .bind(new.amount)
        .bind(new.proof_image.as_deref())
        .bind(PaymentStatus::Pending.as_str())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE customer_order SET status = $2, updated_at = now() WHERE id = $1")
            .bind(new.order_id)
            .bind(next.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Payment::try_from(row)
    }

    /// List payments on a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<PaymentSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, PaymentSummaryRow>(&format!(
            "SELECT {PAYMENT_COLUMNS}, {SUMMARY_SELECT}
             WHERE o.user_id = $1
             ORDER BY pb.submitted_at DESC, pb.id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_summary(false)).collect()
    }

    /// List every attempt made against one order, newest first.
    ///
    /// Ownership is checked by the caller.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_order(&self, order_id: OrderId) -> Result<Vec<Payment>, RepositoryError> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payment pb
             WHERE pb.order_id = $1
             ORDER BY pb.submitted_at DESC, pb.id DESC"
        ))
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Payment::try_from).collect()
    }

    /// List every payment with customer details, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(
        &self,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<PaymentSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, PaymentSummaryRow>(&format!(
            "SELECT {PAYMENT_COLUMNS}, {SUMMARY_SELECT}
             WHERE ($1::text IS NULL OR pb.status = $1)
             ORDER BY pb.submitted_at DESC, pb.id DESC"
        ))
        .bind(status.map(PaymentStatus::as_str))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_summary(true)).collect()
    }

    /// Record an admin decision. Accepting moves the order to `Proses`;
    /// rejecting leaves the order where it is.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the payment does not exist.
    /// Returns `RepositoryError::Lifecycle` if the payment was already decided
    /// or the order cannot take the payment; nothing is written in that case.
    pub async fn verify(
        &self,
        id: PaymentId,
        decision: PaymentDecision,
        note: Option<&str>,
    ) -> Result<Verification, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let target = sqlx::query_as::<_, DecisionTarget>(
            "SELECT pb.status AS payment_status, pb.order_id, o.status AS order_status
             FROM payment pb
             JOIN customer_order o ON o.id = pb.order_id
             WHERE pb.id = $1
             FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let payment_status = parse_column::<PaymentStatus>(&target.payment_status)?.decide(decision)?;
        let mut order_status = parse_column::<OrderStatus>(&target.order_status)?;

        if let Some(event) = order_event_for(decision) {
            order_status = order_status.apply(event)?;
            sqlx::query("UPDATE customer_order SET status = $2, updated_at = now() WHERE id = $1")
                .bind(target.order_id)
                .bind(order_status.as_str())
                .execute(&mut *tx)
                .await?;
        }

        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "UPDATE payment AS pb SET status = $2, note = $3, verified_at = now()
             WHERE pb.id = $1
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(payment_status.as_str())
        .bind(note)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Verification {
            payment: Payment::try_from(row)?,
            order_status,
        })
    }
}
