//! Payment routes: customers submit transfer proofs, admins decide on them.

use axum::extract::State;
use serde::{Deserialize, Serialize};

use selempangku_core::{
    MAX_TOTAL, OrderId, OrderStatus, PaymentDecision, PaymentId, PaymentStatus,
};

use crate::db::PaymentRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireCustomer};
use crate::models::{ApiResponse, NewPayment, Payment, PaymentSummary};
use crate::routes::form::FormData;
use crate::routes::products::parse_amount;
use crate::routes::{JsonBody, PathParam, QueryParams, StatusFilter, not_found};
use crate::services::uploads::UploadKind;
use crate::state::AppState;

const PROOF_FIELDS: &[&str] = &["proof", "proof_image", "bukti_pembayaran"];

/// Read the text fields of a payment submission.
fn payment_fields(form: &FormData) -> Result<NewPayment> {
    let order_id = form.text(&["order_id", "pesanan_id"]);
    let method = form.text(&["method", "metode_pembayaran"]);
    let amount = form.text(&["amount", "jumlah_transfer"]);
    let (Some(order_id), Some(method), Some(amount)) = (order_id, method, amount) else {
        return Err(AppError::Validation("Required fields missing".to_owned()));
    };

    let order_id = order_id
        .parse::<OrderId>()
        .map_err(|_| AppError::Validation("Invalid order id".to_owned()))?;

    Ok(NewPayment {
        order_id,
        method: method.to_owned(),
        sender_bank: form.text_owned(&["sender_bank", "bank_pengirim"]),
        sender_account: form.text_owned(&["sender_account", "nomor_rekening"]),
        amount: parse_amount(amount, "Amount", MAX_TOTAL)?,
        proof_image: None,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCreated {
    pub payment_id: PaymentId,
    pub order_status: OrderStatus,
}

/// POST /payments (multipart)
///
/// Moves the order to `Verifikasi` in the same transaction.
pub async fn create(
    State(state): State<AppState>,
    RequireCustomer(session): RequireCustomer,
    form: FormData,
) -> Result<ApiResponse<PaymentCreated>> {
    let mut new = payment_fields(&form)?;
    new.proof_image = form
        .save_file(state.uploads(), UploadKind::PaymentProof, PROOF_FIELDS)
        .await?;

    let payment = match PaymentRepository::new(state.pool())
        .submit(session.user_id, &new)
        .await
    {
        Ok(payment) => payment,
        Err(err) => {
            if let Some(saved) = &new.proof_image {
                state.uploads().remove(saved).await;
            }
            return Err(not_found("Order not found")(err));
        }
    };

    tracing::info!(
        payment_id = %payment.id,
        order_id = %payment.order_id,
        user_id = %session.user_id,
        "Payment submitted"
    );
    Ok(ApiResponse::created(
        "Payment submitted successfully",
        PaymentCreated {
            payment_id: payment.id,
            order_status: OrderStatus::AwaitingVerification,
        },
    ))
}

/// GET /payments
pub async fn mine(
    State(state): State<AppState>,
    RequireCustomer(session): RequireCustomer,
) -> Result<ApiResponse<Vec<PaymentSummary>>> {
    let payments = PaymentRepository::new(state.pool())
        .list_for_user(session.user_id)
        .await?;
    Ok(ApiResponse::ok("Payments", payments))
}

/// GET /payments/admin/all?status=
pub async fn all(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    QueryParams(filter): QueryParams<StatusFilter>,
) -> Result<ApiResponse<Vec<PaymentSummary>>> {
    let status = filter.parse::<PaymentStatus>()?;
    let payments = PaymentRepository::new(state.pool()).list_all(status).await?;
    Ok(ApiResponse::ok("Payments", payments))
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    #[serde(default)]
    pub status: String,
    #[serde(default, alias = "catatan")]
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentResponse {
    pub payment: Payment,
    pub order_status: OrderStatus,
}

/// PUT /payments/{id}/verify
///
/// Accepting moves the order to `Proses`; rejecting leaves it unchanged.
pub async fn verify(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    PathParam(id): PathParam<PaymentId>,
    JsonBody(req): JsonBody<VerifyPaymentRequest>,
) -> Result<ApiResponse<VerifyPaymentResponse>> {
    let decision = PaymentDecision::parse(req.status.trim())
        .ok_or_else(|| AppError::Validation("Invalid status".to_owned()))?;
    let note = req.note.as_deref().map(str::trim).filter(|n| !n.is_empty());

    let outcome = PaymentRepository::new(state.pool())
        .verify(id, decision, note)
        .await
        .map_err(not_found("Payment not found"))?;

    tracing::info!(
        payment_id = %id,
        admin_id = %admin.user_id,
        status = %outcome.payment.status,
        order_status = %outcome.order_status,
        "Payment decided"
    );
    Ok(ApiResponse::ok(
        "Payment verified successfully",
        VerifyPaymentResponse {
            payment: outcome.payment,
            order_status: outcome.order_status,
        },
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_payment_fields_original_names() {
        let form = FormData::default()
            .with_text("pesanan_id", "12")
            .with_text("metode_pembayaran", "Transfer Bank")
            .with_text("bank_pengirim", "BCA")
            .with_text("jumlah_transfer", "215000");
        let new = payment_fields(&form).unwrap();
        assert_eq!(new.order_id, OrderId::new(12));
        assert_eq!(new.method, "Transfer Bank");
        assert_eq!(new.sender_bank.as_deref(), Some("BCA"));
        assert_eq!(new.sender_account, None);
        assert_eq!(new.amount, Decimal::from(215_000));
    }

    #[test]
    fn test_payment_fields_required() {
        let form = FormData::default().with_text("order_id", "1");
        assert!(matches!(payment_fields(&form), Err(AppError::Validation(_))));

        let form = FormData::default()
            .with_text("order_id", "abc")
            .with_text("method", "Transfer")
            .with_text("amount", "10");
        assert!(matches!(payment_fields(&form), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_payment_amount_bounded() {
        let form = FormData::default()
            .with_text("order_id", "1")
            .with_text("method", "Transfer Bank")
            .with_text("amount", "100000000000000000");
        let Err(AppError::Validation(message)) = payment_fields(&form) else {
            panic!("oversized amount accepted");
        };
        assert!(message.starts_with("Amount must not exceed"));
    }

    #[test]
    fn test_response_keys_are_camel_case() {
        let body = serde_json::to_value(PaymentCreated {
            payment_id: PaymentId::new(3),
            order_status: OrderStatus::AwaitingVerification,
        })
        .unwrap();
        assert!(body.get("orderStatus").is_some());
        assert!(body.get("paymentId").is_some());
    }

    #[test]
    fn test_verify_request_accepts_catatan() {
        let req: VerifyPaymentRequest = serde_json::from_value(serde_json::json!({
            "status": "Ditolak",
            "catatan": "Bukti buram"
        }))
        .unwrap();
        assert_eq!(req.note.as_deref(), Some("Bukti buram"));
    }
}
