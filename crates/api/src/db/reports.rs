//! Read-only reporting queries. Every call recomputes from source rows.

use sqlx::PgPool;

use selempangku_core::{OrderStatus, PaymentStatus, Role};

use super::RepositoryError;
use crate::models::report::{DailyReportRow, DashboardStats, MonthlyReportRow, SalesReportRow};

/// Number of most recent days in the daily report.
pub const DAILY_REPORT_DAYS: i64 = 30;

/// Repository for admin reporting queries.
pub struct ReportRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReportRepository<'a> {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Compute the dashboard summary.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn dashboard(&self) -> Result<DashboardStats, RepositoryError> {
        let stats = sqlx::query_as::<_, DashboardStats>(
            "SELECT
                 COUNT(*) AS total_orders,
                 COUNT(*) FILTER (WHERE status = $1) AS pending_orders,
                 COUNT(*) FILTER (WHERE status = $2) AS verification_orders,
                 COUNT(*) FILTER (WHERE status = $3) AS processing_orders,
                 COUNT(*) FILTER (WHERE status = $4) AS shipped_orders,
                 COUNT(*) FILTER (WHERE status = $5) AS completed_orders,
                 COUNT(*) FILTER (WHERE status = $6) AS cancelled_orders,
                 (SELECT COUNT(*) FROM payment WHERE status = $7) AS pending_payments,
                 (SELECT COUNT(*) FROM app_user WHERE role = $8) AS total_members,
                 COALESCE(SUM(total) FILTER (WHERE status = $5), 0) AS total_revenue
             FROM customer_order",
        )
        .bind(OrderStatus::Pending.as_str())
        .bind(OrderStatus::AwaitingVerification.as_str())
        .bind(OrderStatus::InProduction.as_str())
        .bind(OrderStatus::Shipped.as_str())
        .bind(OrderStatus::Completed.as_str())
        .bind(OrderStatus::Cancelled.as_str())
        .bind(PaymentStatus::Pending.as_str())
        .bind(Role::Customer.as_str())
        .fetch_one(self.pool)
        .await?;
        Ok(stats)
    }

    /// List completed orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sales(&self) -> Result<Vec<SalesReportRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, SalesReportRow>(
            "SELECT o.id AS order_id, o.created_at AS date, u.full_name AS customer_name,
                    u.email AS customer_email, p.name AS product_name, o.quantity, o.total
             FROM customer_order o
             JOIN app_user u ON u.id = o.user_id
             JOIN product p ON p.id = o.product_id
             WHERE o.status = $1
             ORDER BY o.created_at DESC, o.id DESC",
        )
        .bind(OrderStatus::Completed.as_str())
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Completed orders per day, for the most recent [`DAILY_REPORT_DAYS`] days
    /// that have any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn daily(&self) -> Result<Vec<DailyReportRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, DailyReportRow>(
            "SELECT (created_at AT TIME ZONE 'UTC')::date AS date,
                    COUNT(*) AS order_count,
                    SUM(total) AS revenue
             FROM customer_order
             WHERE status = $1
             GROUP BY 1
             ORDER BY 1 DESC
             LIMIT $2",
        )
        .bind(OrderStatus::Completed.as_str())
        .bind(DAILY_REPORT_DAYS)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Completed orders per `YYYY-MM` month, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn monthly(&self) -> Result<Vec<MonthlyReportRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, MonthlyReportRow>(
            "SELECT to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM') AS month,
                    COUNT(*) AS order_count,
                    SUM(total) AS revenue
             FROM customer_order
             WHERE status = $1
             GROUP BY 1
             ORDER BY 1 DESC",
        )
        .bind(OrderStatus::Completed.as_str())
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}
