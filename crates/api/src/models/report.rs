//! Admin reporting projections.
//!
//! Revenue figures only count completed (`Selesai`) orders.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use selempangku_core::OrderId;

/// Dashboard summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct DashboardStats {
    pub total_orders: i64,
    pub pending_orders: i64,
    pub verification_orders: i64,
    pub processing_orders: i64,
    pub shipped_orders: i64,
    pub completed_orders: i64,
    pub cancelled_orders: i64,
    pub pending_payments: i64,
    pub total_members: i64,
    pub total_revenue: Decimal,
}

/// One completed order in the flat sales report.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SalesReportRow {
    pub order_id: OrderId,
    pub date: DateTime<Utc>,
    pub customer_name: Option<String>,
    pub customer_email: String,
    pub product_name: String,
    pub quantity: i32,
    pub total: Decimal,
}

/// Completed orders grouped by calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct DailyReportRow {
    pub date: NaiveDate,
    pub order_count: i64,
    pub revenue: Decimal,
}

/// Completed orders grouped by `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct MonthlyReportRow {
    pub month: String,
    pub order_count: i64,
    pub revenue: Decimal,
}
