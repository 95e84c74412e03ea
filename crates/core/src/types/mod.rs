//! Core types for SelempangKu.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{MAX_AMOUNT, MAX_QUANTITY, MAX_TOTAL, MoneyError, OrderTotals, check_amount};
pub use status::*;
