//! Order money arithmetic using decimal amounts.
//!
//! Amounts are plain rupiah values (no minor-unit convention). The server is
//! authoritative over every derived amount: callers supply a product price
//! snapshot, a quantity and a shipping fee, never a subtotal or total.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when order amounts cannot be computed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// Quantity must be between one and [`MAX_QUANTITY`].
    #[error("quantity must be between 1 and {}", MAX_QUANTITY)]
    InvalidQuantity,
    /// Unit price is negative.
    #[error("unit price cannot be negative")]
    NegativePrice,
    /// Shipping fee is negative.
    #[error("shipping fee cannot be negative")]
    NegativeShippingFee,
    /// The result does not fit in a decimal.
    #[error("order amount overflow")]
    Overflow,
    /// An amount is above what the store accepts.
    #[error("{field} must not exceed {max}")]
    TooLarge { field: &'static str, max: Decimal },
    /// An amount has more than two decimal places.
    #[error("{field} must have at most 2 decimal places")]
    TooPrecise { field: &'static str },
}

/// Most sashes accepted on a single order.
pub const MAX_QUANTITY: i32 = 10_000;

/// Largest unit price or shipping fee: `NUMERIC(14, 2)`.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

/// Largest subtotal, total or payment amount: `NUMERIC(16, 2)`.
pub const MAX_TOTAL: Decimal = Decimal::from_parts(1_874_919_423, 2_328_306, 0, false, 2);

/// Reject amounts above `max` or with sub-cent precision.
///
/// # Errors
///
/// Returns [`MoneyError::TooLarge`] or [`MoneyError::TooPrecise`].
pub fn check_amount(
    field: &'static str,
    amount: Decimal,
    max: Decimal,
) -> Result<Decimal, MoneyError> {
    if amount > max {
        return Err(MoneyError::TooLarge { field, max });
    }
    if amount.normalize().scale() > 2 {
        return Err(MoneyError::TooPrecise { field });
    }
    Ok(amount)
}

/// Amounts fixed on an order at creation time.
///
/// Invariants (checked by [`OrderTotals::compute`] and by a table `CHECK`):
/// - `subtotal == unit_price * quantity`
/// - `total == subtotal + shipping_fee`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    /// Product price copied at creation time.
    pub unit_price: Decimal,
    /// Number of sashes ordered.
    pub quantity: i32,
    /// `unit_price * quantity`.
    pub subtotal: Decimal,
    /// Shipping fee supplied at creation time.
    pub shipping_fee: Decimal,
    /// `subtotal + shipping_fee`.
    pub total: Decimal,
}

impl OrderTotals {
    /// Compute the totals for a new order.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError`] for a quantity out of range, negative amounts,
    /// amounts beyond the stored precision, or arithmetic overflow.
    pub fn compute(
        unit_price: Decimal,
        quantity: i32,
        shipping_fee: Decimal,
    ) -> Result<Self, MoneyError> {
        if !(1..=MAX_QUANTITY).contains(&quantity) {
            return Err(MoneyError::InvalidQuantity);
        }
        if unit_price.is_sign_negative() && !unit_price.is_zero() {
            return Err(MoneyError::NegativePrice);
        }
        if shipping_fee.is_sign_negative() && !shipping_fee.is_zero() {
            return Err(MoneyError::NegativeShippingFee);
        }
        check_amount("Unit price", unit_price, MAX_AMOUNT)?;
        check_amount("Shipping fee", shipping_fee, MAX_AMOUNT)?;

        let subtotal = unit_price
            .checked_mul(Decimal::from(quantity))
            .ok_or(MoneyError::Overflow)?;
        let total = subtotal
            .checked_add(shipping_fee)
            .ok_or(MoneyError::Overflow)?;
        check_amount("Total", total, MAX_TOTAL)?;

        Ok(Self {
            unit_price,
            quantity,
            subtotal,
            shipping_fee,
            total,
        })
    }

    /// Whether stored amounts still satisfy both invariants.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.unit_price.checked_mul(Decimal::from(self.quantity)) == Some(self.subtotal)
            && self.subtotal.checked_add(self.shipping_fee) == Some(self.total)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_totals() {
        let totals =
            OrderTotals::compute(Decimal::from(100_000), 2, Decimal::from(15_000)).unwrap();
        assert_eq!(totals.subtotal, Decimal::from(200_000));
        assert_eq!(totals.total, Decimal::from(215_000));
        assert!(totals.is_consistent());
    }

    #[test]
    fn test_compute_keeps_fractional_amounts() {
        let price = Decimal::new(12_550, 2); // 125.50
        let totals = OrderTotals::compute(price, 3, Decimal::ZERO).unwrap();
        assert_eq!(totals.subtotal, Decimal::new(37_650, 2));
        assert_eq!(totals.total, totals.subtotal);
    }

    #[test]
    fn test_zero_quantity_rejected() {
        assert_eq!(
            OrderTotals::compute(Decimal::ONE, 0, Decimal::ZERO),
            Err(MoneyError::InvalidQuantity)
        );
    }

    #[test]
    fn test_negative_amounts_rejected() {
        assert_eq!(
            OrderTotals::compute(Decimal::NEGATIVE_ONE, 1, Decimal::ZERO),
            Err(MoneyError::NegativePrice)
        );
        assert_eq!(
            OrderTotals::compute(Decimal::ONE, 1, Decimal::NEGATIVE_ONE),
            Err(MoneyError::NegativeShippingFee)
        );
    }

    #[test]
    fn test_column_limits() {
        assert_eq!(MAX_AMOUNT.to_string(), "999999999999.99");
        assert_eq!(MAX_TOTAL.to_string(), "99999999999999.99");
    }

    #[test]
    fn test_oversized_inputs_rejected() {
        assert!(matches!(
            OrderTotals::compute(Decimal::MAX, 1, Decimal::ZERO),
            Err(MoneyError::TooLarge { field: "Unit price", .. })
        ));
        assert!(matches!(
            OrderTotals::compute(Decimal::ONE, 1, Decimal::from(1_000_000_000_000_000_i64)),
            Err(MoneyError::TooLarge { field: "Shipping fee", .. })
        ));
        assert_eq!(
            OrderTotals::compute(Decimal::ONE, 2_000_000_000, Decimal::ZERO),
            Err(MoneyError::InvalidQuantity)
        );
        assert!(matches!(
            OrderTotals::compute(MAX_AMOUNT, MAX_QUANTITY, Decimal::ZERO),
            Err(MoneyError::TooLarge { field: "Total", .. })
        ));
        assert!(OrderTotals::compute(MAX_AMOUNT, 1, MAX_AMOUNT).is_ok());
    }

    #[test]
    fn test_sub_cent_amounts_rejected() {
        assert_eq!(
            check_amount("Amount", Decimal::new(1_005, 3), MAX_AMOUNT),
            Err(MoneyError::TooPrecise { field: "Amount" })
        );
        assert!(check_amount("Amount", Decimal::new(1_500, 3), MAX_AMOUNT).is_ok());
    }

    #[test]
    fn test_tampered_totals_are_inconsistent() {
        let mut totals =
            OrderTotals::compute(Decimal::from(50_000), 1, Decimal::from(10_000)).unwrap();
        totals.total = Decimal::from(1);
        assert!(!totals.is_consistent());
    }
}
