//! Admin back-office reads: dashboard, members and sales reports.

use axum::extract::State;
use serde::Serialize;

use crate::db::{ReportRepository, UserRepository};
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::{
    ApiResponse, DailyReportRow, DashboardStats, MonthlyReportRow, SalesReportRow, User,
};
use crate::state::AppState;

/// GET /admin/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<ApiResponse<DashboardStats>> {
    let stats = ReportRepository::new(state.pool()).dashboard().await?;
    Ok(ApiResponse::ok("Dashboard", stats))
}

#[derive(Debug, Serialize)]
pub struct Members {
    pub total: usize,
    pub members: Vec<User>,
}

/// GET /admin/members
pub async fn members(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<ApiResponse<Members>> {
    let members = UserRepository::new(state.pool()).list_customers().await?;
    Ok(ApiResponse::ok(
        "Members",
        Members {
            total: members.len(),
            members,
        },
    ))
}

/// GET /admin/reports
pub async fn reports(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<ApiResponse<Vec<SalesReportRow>>> {
    let rows = ReportRepository::new(state.pool()).sales().await?;
    Ok(ApiResponse::ok("Sales report", rows))
}

/// GET /admin/reports/daily
pub async fn daily(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<ApiResponse<Vec<DailyReportRow>>> {
    let rows = ReportRepository::new(state.pool()).daily().await?;
    Ok(ApiResponse::ok("Daily report", rows))
}

/// GET /admin/reports/monthly
pub async fn monthly(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<ApiResponse<Vec<MonthlyReportRow>>> {
    let rows = ReportRepository::new(state.pool()).monthly().await?;
    Ok(ApiResponse::ok("Monthly report", rows))
}
