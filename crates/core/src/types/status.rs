//! Status enums for orders, payments, bank accounts and user roles.
//!
//! Each enum is closed: the wire/database spelling is fixed (mostly
//! Indonesian, as shown to customers) and any other string is rejected by
//! `FromStr`. Statuses are stored as `TEXT` guarded by a `CHECK` constraint.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A string that is not one of the accepted values of a status enum.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind}: {value}")]
pub struct UnknownValue {
    /// Which enum was being parsed (e.g. "order status").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Defines `as_str`, `ALL`, `Display` and `FromStr` for a closed string enum.
macro_rules! closed_str_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Every accepted value, in lifecycle order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The canonical wire/database spelling.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = UnknownValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(UnknownValue {
                        kind: $kind,
                        value: s.to_owned(),
                    }),
                }
            }
        }
    };
}

/// Order ("pemesanan") status.
///
/// ```text
/// Pending -> Verifikasi -> Proses -> Terkirim -> Selesai
///    \__________\____________\_________\______-> Dibatalkan
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Created, no payment submitted yet.
    #[default]
    Pending,
    /// A payment was submitted and awaits admin verification.
    #[serde(rename = "Verifikasi")]
    AwaitingVerification,
    /// Payment accepted; the sash is in production.
    #[serde(rename = "Proses")]
    InProduction,
    /// Shipped to the customer.
    #[serde(rename = "Terkirim")]
    Shipped,
    /// Delivered and closed.
    #[serde(rename = "Selesai")]
    Completed,
    /// Cancelled by an admin.
    #[serde(rename = "Dibatalkan")]
    Cancelled,
}

closed_str_enum!(OrderStatus, "order status", {
    Pending => "Pending",
    AwaitingVerification => "Verifikasi",
    InProduction => "Proses",
    Shipped => "Terkirim",
    Completed => "Selesai",
    Cancelled => "Dibatalkan",
});

impl OrderStatus {
    /// Terminal states accept no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Payment ("pembayaran") status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    /// Submitted, not yet reviewed.
    #[default]
    Pending,
    /// Accepted by an admin.
    #[serde(rename = "Terverifikasi")]
    Verified,
    /// Rejected by an admin; the customer may submit a new payment.
    #[serde(rename = "Ditolak")]
    Rejected,
}

closed_str_enum!(PaymentStatus, "payment status", {
    Pending => "Pending",
    Verified => "Terverifikasi",
    Rejected => "Ditolak",
});

/// Destination bank account ("rekening") status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BankAccountStatus {
    /// Shown to customers as a transfer destination.
    #[default]
    #[serde(rename = "Aktif")]
    Active,
    /// Hidden from customers.
    #[serde(rename = "Nonaktif")]
    Inactive,
}

closed_str_enum!(BankAccountStatus, "bank account status", {
    Active => "Aktif",
    Inactive => "Nonaktif",
});

/// User role.
///
/// Role strings are compared case-insensitively when parsed, so every
/// authorization decision goes through [`Role::is_admin`] /
/// [`Role::is_customer`] instead of ad hoc string comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    /// Places orders and submits payments.
    #[default]
    Customer,
    /// Runs the back office.
    Admin,
}

impl Role {
    /// Every role.
    pub const ALL: &'static [Self] = &[Self::Customer, Self::Admin];

    /// The canonical spelling stored in the database and in tokens.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "Customer",
            Self::Admin => "Admin",
        }
    }

    /// Whether this role may use the admin back office.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Whether this role may place orders and submit payments.
    #[must_use]
    pub const fn is_customer(self) -> bool {
        matches!(self, Self::Customer)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("customer") {
            Ok(Self::Customer)
        } else if s.eq_ignore_ascii_case("admin") {
            Ok(Self::Admin)
        } else {
            Err(UnknownValue {
                kind: "role",
                value: s.to_owned(),
            })
        }
    }
}
