//! Order ("pemesanan") models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use selempangku_core::{Email, OrderId, OrderStatus, OrderTotals, ProductId, UserId};

/// Customer-supplied sash personalisation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Personalization {
    /// Text printed on the sash.
    #[serde(default)]
    pub sash_text: Option<String>,
    /// Academic degree, e.g. "S.Kom".
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub major: Option<String>,
    #[serde(default)]
    pub graduation_year: Option<i32>,
}

impl Personalization {
    /// Earliest accepted graduation year.
    pub const MIN_YEAR: i32 = 1900;
    /// Latest accepted graduation year.
    pub const MAX_YEAR: i32 = 2100;

    /// Whether the graduation year, if given, is within range.
    #[must_use]
    pub fn has_valid_year(&self) -> bool {
        self.graduation_year
            .is_none_or(|y| (Self::MIN_YEAR..=Self::MAX_YEAR).contains(&y))
    }
}

/// A stored order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
    pub shipping_address: String,
    #[serde(flatten)]
    pub personalization: Personalization,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The money snapshot fixed at creation.
    #[must_use]
    pub const fn totals(&self) -> OrderTotals {
        OrderTotals {
            unit_price: self.unit_price,
            quantity: self.quantity,
            subtotal: self.subtotal,
            shipping_fee: self.shipping_fee,
            total: self.total,
        }
    }
}

/// An order joined with its product and, for admin views, its customer.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    #[serde(flatten)]
    pub order: Order,
    pub product_name: String,
    pub product_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<Email>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
}

/// A validated order request. Money amounts other than the shipping fee are
/// computed by the server.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub product_id: ProductId,
    pub quantity: i32,
    pub shipping_fee: Decimal,
    pub shipping_address: String,
    pub personalization: Personalization,
}
