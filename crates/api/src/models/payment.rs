//! Payment ("pembayaran") models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use selempangku_core::{Email, OrderId, OrderStatus, PaymentId, PaymentStatus};

/// A payment attempt against an order.
#[derive(Debug, Clone, Serialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub method: String,
    pub sender_bank: Option<String>,
    pub sender_account: Option<String>,
    pub amount: Decimal,
    /// Path under `/uploads`, e.g. `bukti_pembayaran/<uuid>.jpg`.
    pub proof_image: Option<String>,
    pub status: PaymentStatus,
    pub note: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}

/// A payment joined with its order, product and, for admin views, customer.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentSummary {
    #[serde(flatten)]
    pub payment: Payment,
    pub order_status: OrderStatus,
    pub order_total: Decimal,
    pub product_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<Email>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
}

/// A validated payment submission.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: OrderId,
    pub method: String,
    pub sender_bank: Option<String>,
    pub sender_account: Option<String>,
    pub amount: Decimal,
    pub proof_image: Option<String>,
}
