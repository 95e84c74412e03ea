//! Order and payment state machines.
//!
//! Every status change goes through [`OrderStatus::apply`] or
//! [`PaymentStatus::decide`]. A rejected transition leaves the caller's state
//! untouched; the repositories only write the returned state.
//!
//! # Order transitions
//!
//! | From          | Event              | To            |
//! |---------------|--------------------|---------------|
//! | Pending       | `PaymentSubmitted` | Verifikasi    |
//! | Verifikasi    | `PaymentSubmitted` | Verifikasi    |
//! | Verifikasi    | `PaymentAccepted`  | Proses        |
//! | Proses        | `Shipped`          | Terkirim      |
//! | Terkirim      | `Completed`        | Selesai       |
//! | non-terminal  | `Cancelled`        | Dibatalkan    |
//!
//! Resubmission from Verifikasi covers a customer replacing a rejected
//! payment: a rejection leaves the order in Verifikasi.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{OrderStatus, PaymentStatus};

/// Something that happens to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderEvent {
    /// The owner submitted a payment.
    PaymentSubmitted,
    /// An admin accepted a payment for the order.
    PaymentAccepted,
    /// An admin marked the order as shipped.
    Shipped,
    /// An admin marked the order as delivered.
    Completed,
    /// An admin cancelled the order.
    Cancelled,
}

impl OrderEvent {
    /// The admin event that moves an order into `target`.
    ///
    /// Pending, Verifikasi and Proses are only reached through creation and
    /// the payment workflow, so they have no admin event.
    #[must_use]
    pub const fn for_admin_target(target: OrderStatus) -> Option<Self> {
        match target {
            OrderStatus::Shipped => Some(Self::Shipped),
            OrderStatus::Completed => Some(Self::Completed),
            OrderStatus::Cancelled => Some(Self::Cancelled),
            OrderStatus::Pending
            | OrderStatus::AwaitingVerification
            | OrderStatus::InProduction => None,
        }
    }
}

/// An admin's verdict on a submitted payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentDecision {
    /// "Terverifikasi".
    #[serde(rename = "Terverifikasi")]
    Accept,
    /// "Ditolak".
    #[serde(rename = "Ditolak")]
    Reject,
}

impl PaymentDecision {
    /// Parse an admin decision; only "Terverifikasi" and "Ditolak" are valid.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.parse::<PaymentStatus>().ok()? {
            PaymentStatus::Verified => Some(Self::Accept),
            PaymentStatus::Rejected => Some(Self::Reject),
            PaymentStatus::Pending => None,
        }
    }

    /// The payment status this decision records.
    #[must_use]
    pub const fn status(self) -> PaymentStatus {
        match self {
            Self::Accept => PaymentStatus::Verified,
            Self::Reject => PaymentStatus::Rejected,
        }
    }
}

/// A transition the tables above do not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// The order cannot take this event in its current state.
    #[error("order in status {from} cannot take event {event:?}")]
    InvalidOrderTransition {
        /// Current order status.
        from: OrderStatus,
        /// Rejected event.
        event: OrderEvent,
    },
    /// The requested admin target has no admin transition.
    #[error("order status {target} cannot be set manually")]
    NotAdminSettable {
        /// Requested status.
        target: OrderStatus,
    },
    /// The payment was already decided.
    #[error("payment already {from}")]
    PaymentAlreadyDecided {
        /// Current payment status.
        from: PaymentStatus,
    },
}

impl OrderStatus {
    /// Apply `event`, returning the next status.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::InvalidOrderTransition`] when the table has no
    /// entry for `(self, event)`.
    pub const fn apply(self, event: OrderEvent) -> Result<Self, LifecycleError> {
        use OrderEvent as E;
        use OrderStatus as S;

        let next = match (self, event) {
            (S::Pending | S::AwaitingVerification, E::PaymentSubmitted) => {
                S::AwaitingVerification
            }
            (S::AwaitingVerification, E::PaymentAccepted) => S::InProduction,
            (S::InProduction, E::Shipped) => S::Shipped,
            (S::Shipped, E::Completed) => S::Completed,
            (
                S::Pending | S::AwaitingVerification | S::InProduction | S::Shipped,
                E::Cancelled,
            ) => S::Cancelled,
            _ => {
                return Err(LifecycleError::InvalidOrderTransition { from: self, event });
            }
        };
        Ok(next)
    }

    /// Resolve an admin's requested target status into the next status.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotAdminSettable`] for targets reached only
    /// through the payment workflow, or the error from [`Self::apply`].
    pub const fn admin_transition(self, target: Self) -> Result<Self, LifecycleError> {
        match OrderEvent::for_admin_target(target) {
            Some(event) => self.apply(event),
            None => Err(LifecycleError::NotAdminSettable { target }),
        }
    }
}

impl PaymentStatus {
    /// Record an admin decision on a payment.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::PaymentAlreadyDecided`] unless the payment is
    /// still `Pending`.
    pub const fn decide(self, decision: PaymentDecision) -> Result<Self, LifecycleError> {
        match self {
            Self::Pending => Ok(decision.status()),
            Self::Verified | Self::Rejected => {
                Err(LifecycleError::PaymentAlreadyDecided { from: self })
            }
        }
    }
}

/// The order event implied by a payment decision, if any.
///
/// A rejection leaves the order where it is.
#[must_use]
pub const fn order_event_for(decision: PaymentDecision) -> Option<OrderEvent> {
    match decision {
        PaymentDecision::Accept => Some(OrderEvent::PaymentAccepted),
        PaymentDecision::Reject => None,
    }
}
