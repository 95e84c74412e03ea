//! Destination bank account routes.
//!
//! Customers see active accounts only; admins manage the full registry.

use std::str::FromStr;

use axum::extract::State;
use serde::Serialize;

use selempangku_core::{BankAccountId, BankAccountStatus};

use crate::db::BankAccountRepository;
use crate::db::banks::BankAccountFields;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{ApiResponse, BankAccount, BankAccountInput};
use crate::routes::{JsonBody, PathParam, not_found};
use crate::state::AppState;

/// Trimmed, required fields; a missing status means `Aktif`.
fn validated(input: &BankAccountInput) -> Result<BankAccountFields<'_>> {
    let bank_name = input.bank_name.trim();
    let account_number = input.account_number.trim();
    let holder_name = input.holder_name.trim();
    if bank_name.is_empty() || account_number.is_empty() || holder_name.is_empty() {
        return Err(AppError::Validation("Required fields missing".to_owned()));
    }

    let status = match input.status.as_deref().map(str::trim) {
        None | Some("") => BankAccountStatus::Active,
        Some(s) => BankAccountStatus::from_str(s)
            .map_err(|_| AppError::Validation("Invalid status".to_owned()))?,
    };

    Ok(BankAccountFields {
        bank_name,
        account_number,
        holder_name,
        status,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankCreated {
    pub bank_id: BankAccountId,
}

/// GET /banks
pub async fn index(State(state): State<AppState>) -> Result<ApiResponse<Vec<BankAccount>>> {
    let banks = BankAccountRepository::new(state.pool()).list(true).await?;
    Ok(ApiResponse::ok("Banks retrieved successfully", banks))
}

/// GET /banks/{id}
pub async fn show(
    State(state): State<AppState>,
    PathParam(id): PathParam<BankAccountId>,
) -> Result<ApiResponse<BankAccount>> {
    let bank = BankAccountRepository::new(state.pool())
        .get(id, true)
        .await?
        .ok_or_else(|| AppError::NotFound("Bank account not found".to_owned()))?;
    Ok(ApiResponse::ok("Bank account", bank))
}

/// GET /banks/admin/all
pub async fn all(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<ApiResponse<Vec<BankAccount>>> {
    let banks = BankAccountRepository::new(state.pool()).list(false).await?;
    Ok(ApiResponse::ok("Banks retrieved successfully", banks))
}

/// POST /banks
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    JsonBody(input): JsonBody<BankAccountInput>,
) -> Result<ApiResponse<BankCreated>> {
    let fields = validated(&input)?;
    let bank = BankAccountRepository::new(state.pool())
        .create(&fields)
        .await?;

    tracing::info!(bank_id = %bank.id, "Bank account created");
    Ok(ApiResponse::created(
        "Bank account created successfully",
        BankCreated { bank_id: bank.id },
    ))
}

/// PUT /banks/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    PathParam(id): PathParam<BankAccountId>,
    JsonBody(input): JsonBody<BankAccountInput>,
) -> Result<ApiResponse<BankAccount>> {
    let fields = validated(&input)?;
    let bank = BankAccountRepository::new(state.pool())
        .update(id, &fields)
        .await
        .map_err(not_found("Bank account not found"))?;

    tracing::info!(bank_id = %id, status = %bank.status, "Bank account updated");
    Ok(ApiResponse::ok("Bank account updated successfully", bank))
}

/// DELETE /banks/{id}
pub async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    PathParam(id): PathParam<BankAccountId>,
) -> Result<ApiResponse<Option<()>>> {
    BankAccountRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(not_found("Bank account not found"))?;

    tracing::info!(bank_id = %id, "Bank account deleted");
    Ok(ApiResponse::message("Bank account deleted successfully"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(json: serde_json::Value) -> BankAccountInput {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_status_defaults_to_active() {
        let input = input(serde_json::json!({
            "nama_bank": "BCA",
            "nomor_rekening": "1234567890",
            "nama_pemilik": "SelempangKu"
        }));
        let fields = validated(&input).unwrap();
        assert_eq!(fields.status, BankAccountStatus::Active);
        assert_eq!(fields.holder_name, "SelempangKu");
    }

    #[test]
    fn test_explicit_inactive_status() {
        let input = input(serde_json::json!({
            "bank_name": "BNI",
            "account_number": "1",
            "holder_name": "X",
            "status": "Nonaktif"
        }));
        assert_eq!(validated(&input).unwrap().status, BankAccountStatus::Inactive);
    }

    #[test]
    fn test_rejects_missing_fields_and_bad_status() {
        let missing = input(serde_json::json!({ "bank_name": "BNI" }));
        assert!(matches!(validated(&missing), Err(AppError::Validation(_))));

        let bad = input(serde_json::json!({
            "bank_name": "BNI",
            "account_number": "1",
            "holder_name": "X",
            "status": "Closed"
        }));
        assert!(matches!(validated(&bad), Err(AppError::Validation(_))));
    }
}
