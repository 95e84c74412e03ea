//! Order routes.
//!
//! Customers create and read their own orders; admins list every order and
//! move orders along the lifecycle.

use std::str::FromStr;

use axum::extract::State;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use selempangku_core::{MAX_AMOUNT, MAX_QUANTITY, OrderId, OrderStatus, ProductId, check_amount};

use crate::db::{OrderRepository, PaymentRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireCustomer};
use crate::models::{ApiResponse, NewOrder, Order, OrderSummary, Payment, Personalization};
use crate::routes::{JsonBody, PathParam, QueryParams, StatusFilter, not_found};
use crate::state::AppState;

/// A money amount sent either as a JSON number or as a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(serde_json::Number),
    Text(String),
}

impl AmountInput {
    fn to_decimal(&self, field: &str) -> Result<Decimal> {
        let text = match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.trim().to_owned(),
        };
        if text.is_empty() {
            return Ok(Decimal::ZERO);
        }
        Decimal::from_str(&text)
            .or_else(|_| Decimal::from_scientific(&text))
            .map_err(|_| AppError::Validation(format!("{field} must be a number")))
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default, alias = "produk_id")]
    pub product_id: Option<ProductId>,
    #[serde(default, alias = "jumlah")]
    pub quantity: Option<i32>,
    #[serde(default, alias = "alamat_pengiriman")]
    pub shipping_address: String,
    #[serde(default, alias = "ongkir")]
    pub shipping_fee: Option<AmountInput>,
    #[serde(flatten)]
    pub personalization: Personalization,
}

impl CreateOrderRequest {
    /// Check the request and turn it into a `NewOrder`.
    ///
    /// Price, subtotal and total are never taken from the client.
    fn into_new_order(self) -> Result<NewOrder> {
        let (Some(product_id), Some(quantity)) = (self.product_id, self.quantity) else {
            return Err(AppError::Validation(
                "Product, quantity and shipping address are required".to_owned(),
            ));
        };
        let shipping_address = self.shipping_address.trim();
        if shipping_address.is_empty() {
            return Err(AppError::Validation(
                "Product, quantity and shipping address are required".to_owned(),
            ));
        }
        if quantity < 1 {
            return Err(AppError::Validation(
                "Quantity must be at least 1".to_owned(),
            ));
        }
        if quantity > MAX_QUANTITY {
            return Err(AppError::Validation(format!(
                "Quantity must not exceed {MAX_QUANTITY}"
            )));
        }

        let shipping_fee = match &self.shipping_fee {
            Some(fee) => fee.to_decimal("Shipping fee")?,
            None => Decimal::ZERO,
        };
        if shipping_fee.is_sign_negative() && !shipping_fee.is_zero() {
            return Err(AppError::Validation(
                "Shipping fee cannot be negative".to_owned(),
            ));
        }
        check_amount("Shipping fee", shipping_fee, MAX_AMOUNT)
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if !self.personalization.has_valid_year() {
            return Err(AppError::Validation(format!(
                "Graduation year must be between {} and {}",
                Personalization::MIN_YEAR,
                Personalization::MAX_YEAR
            )));
        }

        Ok(NewOrder {
            product_id,
            quantity,
            shipping_fee,
            shipping_address: shipping_address.to_owned(),
            personalization: self.personalization,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    pub order_id: OrderId,
    pub total: Decimal,
}

/// POST /orders
pub async fn create(
    State(state): State<AppState>,
    RequireCustomer(session): RequireCustomer,
    JsonBody(req): JsonBody<CreateOrderRequest>,
) -> Result<ApiResponse<OrderCreated>> {
    let new = req.into_new_order()?;
    let order = OrderRepository::new(state.pool())
        .create(session.user_id, &new)
        .await
        .map_err(not_found("Product not found"))?;

    tracing::info!(
        order_id = %order.id,
        user_id = %session.user_id,
        total = %order.total,
        "Order created"
    );
    Ok(ApiResponse::created(
        "Order created",
        OrderCreated {
            order_id: order.id,
            total: order.total,
        },
    ))
}

/// GET /orders
pub async fn mine(
    State(state): State<AppState>,
    RequireCustomer(session): RequireCustomer,
) -> Result<ApiResponse<Vec<OrderSummary>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(session.user_id)
        .await?;
    Ok(ApiResponse::ok("Orders", orders))
}

/// GET /orders/{id}
///
/// Another customer's order is reported as not found.
pub async fn show(
    State(state): State<AppState>,
    RequireCustomer(session): RequireCustomer,
    PathParam(id): PathParam<OrderId>,
) -> Result<ApiResponse<OrderSummary>> {
    let order = OrderRepository::new(state.pool())
        .get_for_user(id, session.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;
    Ok(ApiResponse::ok("Order", order))
}

/// GET /orders/{id}/payments
pub async fn payments(
    State(state): State<AppState>,
    RequireCustomer(session): RequireCustomer,
    PathParam(id): PathParam<OrderId>,
) -> Result<ApiResponse<Vec<Payment>>> {
    if !OrderRepository::new(state.pool())
        .is_owned_by(id, session.user_id)
        .await?
    {
        return Err(AppError::NotFound("Order not found".to_owned()));
    }
    let payments = PaymentRepository::new(state.pool())
        .list_for_order(id)
        .await?;
    Ok(ApiResponse::ok("Payments", payments))
}

/// GET /orders/admin/all?status=
pub async fn all(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    QueryParams(filter): QueryParams<StatusFilter>,
) -> Result<ApiResponse<Vec<OrderSummary>>> {
    let status = filter.parse::<OrderStatus>()?;
    let orders = OrderRepository::new(state.pool()).list_all(status).await?;
    Ok(ApiResponse::ok("Orders", orders))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: String,
}

/// PUT /orders/{id}/status
///
/// Unknown status strings are rejected before the order is read.
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    PathParam(id): PathParam<OrderId>,
    JsonBody(req): JsonBody<UpdateStatusRequest>,
) -> Result<ApiResponse<Order>> {
    let target = OrderStatus::from_str(req.status.trim())
        .map_err(|_| AppError::Validation("Invalid status".to_owned()))?;

    let order = OrderRepository::new(state.pool())
        .update_status(id, target)
        .await
        .map_err(not_found("Order not found"))?;

    tracing::info!(order_id = %id, status = %order.status, "Order status updated");
    Ok(ApiResponse::ok("Order status updated", order))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(json: serde_json::Value) -> CreateOrderRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_accepts_original_field_names() {
        let new = request(serde_json::json!({
            "produk_id": 3,
            "jumlah": 2,
            "alamat_pengiriman": "Jl. Merdeka 1",
            "ongkir": "15000",
            "sash_text": "S.Kom"
        }))
        .into_new_order()
        .unwrap();
        assert_eq!(new.product_id, ProductId::new(3));
        assert_eq!(new.quantity, 2);
        assert_eq!(new.shipping_fee, Decimal::from(15_000));
        assert_eq!(new.personalization.sash_text.as_deref(), Some("S.Kom"));
    }

    #[test]
    fn test_shipping_fee_defaults_to_zero() {
        let new = request(serde_json::json!({
            "product_id": 1,
            "quantity": 1,
            "shipping_address": "Bandung"
        }))
        .into_new_order()
        .unwrap();
        assert_eq!(new.shipping_fee, Decimal::ZERO);
    }

    #[test]
    fn test_numeric_shipping_fee() {
        let new = request(serde_json::json!({
            "product_id": 1,
            "quantity": 1,
            "shipping_address": "Bandung",
            "shipping_fee": 12500.5
        }))
        .into_new_order()
        .unwrap();
        assert_eq!(new.shipping_fee, Decimal::new(125_005, 1));
    }

    #[test]
    fn test_rejects_bad_input() {
        let cases = [
            serde_json::json!({ "quantity": 1, "shipping_address": "x" }),
            serde_json::json!({ "product_id": 1, "quantity": 0, "shipping_address": "x" }),
            serde_json::json!({ "product_id": 1, "quantity": 1, "shipping_address": "  " }),
            serde_json::json!({
                "product_id": 1, "quantity": 1, "shipping_address": "x", "shipping_fee": -5
            }),
            serde_json::json!({
                "product_id": 1, "quantity": 1, "shipping_address": "x", "graduation_year": 1800
            }),
            serde_json::json!({
                "product_id": 1, "quantity": 2_000_000_000, "shipping_address": "x"
            }),
            serde_json::json!({
                "product_id": 1, "quantity": 1, "shipping_address": "x",
                "shipping_fee": "1000000000000000"
            }),
            serde_json::json!({
                "product_id": 1, "quantity": 1, "shipping_address": "x", "shipping_fee": "0.001"
            }),
        ];
        for case in cases {
            let result = request(case.clone()).into_new_order();
            assert!(matches!(result, Err(AppError::Validation(_))), "{case}");
        }
    }

    #[test]
    fn test_client_totals_are_ignored() {
        let new = request(serde_json::json!({
            "product_id": 1,
            "quantity": 1,
            "shipping_address": "x",
            "total": 1,
            "subtotal": 1
        }))
        .into_new_order()
        .unwrap();
        assert_eq!(new.quantity, 1);
    }

    #[test]
    fn test_order_created_shape() {
        let body = serde_json::to_value(OrderCreated {
            order_id: OrderId::new(4),
            total: Decimal::from(215_000),
        })
        .unwrap();
        assert_eq!(body["orderId"], 4);
        assert_eq!(body["total"], "215000");

        let body = serde_json::to_value(OrderCreated {
            order_id: OrderId::new(5),
            total: selempangku_core::MAX_TOTAL,
        })
        .unwrap();
        assert_eq!(body["total"], "99999999999999.99");
    }
}
